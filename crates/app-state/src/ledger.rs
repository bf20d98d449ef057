//! Registration ledger
//!
//! Holds the current user's registrations as last fetched from the service.
//! Every operation needs a session token and checks for one before touching
//! the network, so a signed-out caller fails fast with [`LedgerError::Unauthenticated`].
//!
//! Mutations are asymmetric on purpose. A successful cancel removes the
//! entry locally right away: the id is known and removal cannot conflict
//! with anything the server decides. A successful register changes nothing
//! locally, because the server assigns the registration id and payment
//! status; the entry becomes visible on the next refresh instead of being
//! guessed at here.

use crate::session::SessionStore;
use events_api::{
    AccessToken, ApiError, Event, EventId, EventsApi, Registration, RegistrationId,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No session token; the caller must prompt for login
    #[error("not signed in")]
    Unauthenticated,

    /// The service call failed
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl LedgerError {
    /// Check whether this failure means the session is missing or rejected
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            LedgerError::Unauthenticated | LedgerError::Api(ApiError::Unauthenticated(_))
        )
    }
}

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// A registration joined against the catalog for display
///
/// `event` is `None` when the referenced event no longer exists in the
/// catalog. Such orphaned entries still render and can still be cancelled;
/// they are an expected state, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationView {
    /// The registration itself
    pub registration: Registration,
    /// The referenced event, when the catalog still has it
    pub event: Option<Event>,
}

impl RegistrationView {
    /// Check whether the referenced event has disappeared from the catalog
    pub fn is_orphaned(&self) -> bool {
        self.event.is_none()
    }
}

#[derive(Debug, Default)]
struct Snapshot {
    registrations: Vec<Registration>,
    /// Ticket of the refresh or local mutation that produced this data
    installed: u64,
    loaded: bool,
}

/// Holder of the current user's registrations
pub struct RegistrationLedger {
    api: Arc<dyn EventsApi>,
    session: Arc<SessionStore>,
    snapshot: RwLock<Snapshot>,
    tickets: AtomicU64,
}

impl RegistrationLedger {
    /// Create an empty ledger over the given gateway and session
    pub fn new(api: Arc<dyn EventsApi>, session: Arc<SessionStore>) -> Self {
        Self {
            api,
            session,
            snapshot: RwLock::new(Snapshot::default()),
            tickets: AtomicU64::new(0),
        }
    }

    fn token(&self) -> Result<AccessToken> {
        self.session.token().ok_or(LedgerError::Unauthenticated)
    }

    /// Fetch the registration list and install it as the current snapshot
    ///
    /// Same last-refresh-wins rule as the catalog: the returned list is the
    /// snapshot visible after this refresh settled, and a result superseded
    /// by a newer refresh or a local cancel is discarded. On failure the
    /// previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<Vec<Registration>> {
        let token = self.token()?;
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;

        match self.api.list_registrations(&token).await {
            Ok(registrations) => {
                let mut snapshot = self.snapshot.write();
                if ticket > snapshot.installed {
                    tracing::debug!(ticket, count = registrations.len(), "installing ledger snapshot");
                    snapshot.registrations = registrations;
                    snapshot.installed = ticket;
                    snapshot.loaded = true;
                } else {
                    tracing::debug!(ticket, "discarding superseded ledger fetch");
                }
                Ok(snapshot.registrations.clone())
            }
            Err(e) => {
                tracing::warn!(error = %e, "ledger refresh failed, keeping previous snapshot");
                Err(e.into())
            }
        }
    }

    /// Register the current user for an event
    ///
    /// The snapshot is deliberately left untouched on success; the caller is
    /// expected to refresh to pick up the server-assigned entry.
    pub async fn register(&self, event: &EventId) -> Result<()> {
        let token = self.token()?;
        self.api.register_for_event(&token, event).await?;
        tracing::debug!(event = %event, "registered for event");
        Ok(())
    }

    /// Cancel one of the current user's registrations
    ///
    /// On success the entry is removed from the snapshot immediately. On
    /// failure the snapshot is untouched and the error surfaces to the
    /// caller. Cancelling an id that is already gone locally leaves the
    /// snapshot as it was.
    pub async fn cancel(&self, registration: &RegistrationId) -> Result<()> {
        let token = self.token()?;
        self.api.cancel_registration(&token, registration).await?;

        let mut snapshot = self.snapshot.write();
        snapshot.registrations.retain(|r| &r.id != registration);
        // The removal supersedes any fetch still in flight
        snapshot.installed = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(registration = %registration, "cancelled registration");
        Ok(())
    }

    /// Get the last successfully fetched registration list
    pub fn registrations(&self) -> Vec<Registration> {
        self.snapshot.read().registrations.clone()
    }

    /// Check whether any refresh has ever succeeded
    pub fn has_loaded(&self) -> bool {
        self.snapshot.read().loaded
    }

    /// Join the current snapshot against a catalog for display
    ///
    /// Registrations whose event is missing from `catalog` come back with
    /// `event: None` rather than being dropped.
    pub fn views(&self, catalog: &[Event]) -> Vec<RegistrationView> {
        let snapshot = self.snapshot.read();
        snapshot
            .registrations
            .iter()
            .map(|registration| RegistrationView {
                registration: registration.clone(),
                event: catalog.iter().find(|e| e.id == registration.event_id).cloned(),
            })
            .collect()
    }

    /// Forget all user-scoped state, reverting to the never-loaded empty ledger
    ///
    /// Called on logout. Any refresh still in flight for the old session is
    /// superseded and will not re-install its data.
    pub fn clear(&self) {
        let mut snapshot = self.snapshot.write();
        snapshot.registrations.clear();
        snapshot.loaded = false;
        snapshot.installed = self.tickets.load(Ordering::SeqCst);
    }
}
