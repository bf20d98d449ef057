//! Synchronization coordinator
//!
//! The single entry point the UI talks to. View focus events come in, view
//! snapshots go out over watch channels; everything between (fetching,
//! coalescing, optimistic mutation, session teardown) happens here.
//!
//! Each view has a refresh gate. A focus event while that view's refresh is
//! already in flight does not start a second fetch; it marks the gate and
//! the running refresh performs exactly one follow-up fetch once its own
//! settles, so a burst of focus events costs at most two fetches.

use crate::catalog::EventCatalog;
use crate::filter;
use crate::ledger::{LedgerError, RegistrationLedger, RegistrationView};
use crate::session::{SessionError, SessionStore};
use events_api::{
    AccessToken, ApiError, Event, EventDraft, EventId, EventsApi, ImageAttachment, LoginRequest,
    Profile, ProfileUpdate, RegistrationId, SignupRequest,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{watch, Mutex};

/// Coordinator errors
#[derive(Debug, Error)]
pub enum SyncError {
    /// No session token; the caller must prompt for login
    #[error("not signed in")]
    Unauthenticated,

    /// The service call failed
    #[error(transparent)]
    Api(ApiError),

    /// The session could not be written to or cleared from disk
    #[error("session persistence failed: {0}")]
    Session(#[from] SessionError),
}

impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        SyncError::Api(err)
    }
}

impl From<LedgerError> for SyncError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Unauthenticated => SyncError::Unauthenticated,
            LedgerError::Api(api) => SyncError::Api(api),
        }
    }
}

impl SyncError {
    /// Check whether this failure means the session is missing or rejected
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            SyncError::Unauthenticated | SyncError::Api(ApiError::Unauthenticated(_))
        )
    }

    /// Render this failure as a sentence fit for the screen
    ///
    /// Validation and not-found failures pass the server's own message
    /// through, since those describe the user's input. Everything else gets
    /// a fixed phrasing.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Unauthenticated => "Please log in to continue.".to_string(),
            SyncError::Api(ApiError::Unauthenticated(_)) => {
                "Your session has expired. Please log in again.".to_string()
            }
            SyncError::Api(ApiError::Network(_)) => {
                "Couldn't reach the server. Check your connection and try again.".to_string()
            }
            SyncError::Api(ApiError::Validation(message))
            | SyncError::Api(ApiError::NotFound(message)) => message.clone(),
            SyncError::Api(ApiError::InvalidResponse(_)) => {
                "The server sent an unexpected response. Try again in a moment.".to_string()
            }
            SyncError::Api(api) if api.is_transient() => {
                "The server is having trouble right now. Try again in a moment.".to_string()
            }
            SyncError::Api(api) => api.to_string(),
            SyncError::Session(_) => "Couldn't save your session on this device.".to_string(),
        }
    }
}

/// Result type for coordinator operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Screens whose focus drives a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewId {
    /// The public event catalog
    Events,
    /// The current user's registrations
    Registrations,
}

/// Published state of the events screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogView {
    /// Events from the last successful fetch
    pub events: Vec<Event>,
    /// Message for the last failed refresh, if the failure is still current
    pub error: Option<String>,
    /// Whether any fetch has ever succeeded
    pub loaded: bool,
}

/// Published state of the registrations screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerView {
    /// Registrations joined against the catalog
    pub registrations: Vec<RegistrationView>,
    /// Message for the last failed refresh, if the failure is still current
    pub error: Option<String>,
    /// Whether any fetch has ever succeeded
    pub loaded: bool,
}

#[derive(Debug, Default)]
struct RefreshGate {
    in_flight: bool,
    rerun: bool,
}

/// Orchestrates fetches, mutations and session state for the whole app
///
/// Cheap to clone; clones share all state.
///
/// # Examples
/// ```no_run
/// use app_state::{SessionStore, SyncCoordinator, ViewId};
/// use events_api::{ApiClientConfig, EventsGateway};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = Arc::new(EventsGateway::new(ApiClientConfig::new(
///     "https://api.campuspulse.app",
/// )));
/// let session = Arc::new(SessionStore::persisted("session.json").await?);
/// let sync = SyncCoordinator::new(gateway, session);
///
/// sync.login("asha@example.edu", "hunter2").await?;
/// sync.on_enter_view(ViewId::Events).await;
/// println!("{} events", sync.events_view().events.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SyncCoordinator {
    api: Arc<dyn EventsApi>,
    session: Arc<SessionStore>,
    catalog: Arc<EventCatalog>,
    ledger: Arc<RegistrationLedger>,
    events_gate: Arc<Mutex<RefreshGate>>,
    registrations_gate: Arc<Mutex<RefreshGate>>,
    events_tx: Arc<watch::Sender<CatalogView>>,
    registrations_tx: Arc<watch::Sender<LedgerView>>,
}

impl SyncCoordinator {
    /// Create a coordinator over the given gateway and session store
    pub fn new(api: Arc<dyn EventsApi>, session: Arc<SessionStore>) -> Self {
        let catalog = Arc::new(EventCatalog::new(Arc::clone(&api)));
        let ledger = Arc::new(RegistrationLedger::new(Arc::clone(&api), Arc::clone(&session)));
        let (events_tx, _) = watch::channel(CatalogView::default());
        let (registrations_tx, _) = watch::channel(LedgerView::default());
        Self {
            api,
            session,
            catalog,
            ledger,
            events_gate: Arc::new(Mutex::new(RefreshGate::default())),
            registrations_gate: Arc::new(Mutex::new(RefreshGate::default())),
            events_tx: Arc::new(events_tx),
            registrations_tx: Arc::new(registrations_tx),
        }
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// React to a view gaining focus
    pub async fn on_enter_view(&self, view: ViewId) {
        match view {
            ViewId::Events => self.refresh_events().await,
            ViewId::Registrations => self.refresh_registrations().await,
        }
    }

    /// Refresh the event catalog and republish the events view
    ///
    /// Never fails from the caller's perspective; a failed fetch keeps the
    /// previous events visible and carries the message in the view.
    pub async fn refresh_events(&self) {
        {
            let mut gate = self.events_gate.lock().await;
            if gate.in_flight {
                gate.rerun = true;
                tracing::debug!(view = "events", "refresh already in flight, coalescing");
                return;
            }
            gate.in_flight = true;
        }

        loop {
            let error = match self.catalog.refresh().await {
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "event refresh failed");
                    Some(SyncError::from(e).user_message())
                }
            };
            self.publish_events(error);

            let mut gate = self.events_gate.lock().await;
            if gate.rerun {
                gate.rerun = false;
                tracing::debug!(view = "events", "running coalesced follow-up refresh");
            } else {
                gate.in_flight = false;
                break;
            }
        }
    }

    /// Refresh the registration ledger and republish the registrations view
    pub async fn refresh_registrations(&self) {
        {
            let mut gate = self.registrations_gate.lock().await;
            if gate.in_flight {
                gate.rerun = true;
                tracing::debug!(view = "registrations", "refresh already in flight, coalescing");
                return;
            }
            gate.in_flight = true;
        }

        loop {
            let error = match self.ledger.refresh().await {
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "registration refresh failed");
                    Some(self.surface(e).await.user_message())
                }
            };
            self.publish_registrations(error);

            let mut gate = self.registrations_gate.lock().await;
            if gate.rerun {
                gate.rerun = false;
                tracing::debug!(view = "registrations", "running coalesced follow-up refresh");
            } else {
                gate.in_flight = false;
                break;
            }
        }
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a session token and store it
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let request =
            LoginRequest { email: email.to_string(), password: password.to_string() };
        let response = self.api.login(&request).await?;
        self.session.set_token(response.token).await?;
        tracing::info!("signed in");
        Ok(())
    }

    /// Create a new account
    ///
    /// Does not sign the new account in; the server expects a login with the
    /// fresh credentials afterwards.
    pub async fn sign_up(&self, request: &SignupRequest) -> Result<()> {
        self.api.sign_up(request).await?;
        tracing::info!("account created");
        Ok(())
    }

    /// Discard the session and all user-scoped state
    ///
    /// The event catalog is public data and survives sign-out.
    pub async fn logout(&self) -> Result<()> {
        self.session.clear().await?;
        self.ledger.clear();
        self.publish_registrations(None);
        tracing::info!("signed out");
        Ok(())
    }

    /// Check whether a session token is currently held
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Register the current user for an event
    ///
    /// On success the ledger is refreshed so the server-assigned entry shows
    /// up; the view carries a message instead if that follow-up fetch fails.
    pub async fn register(&self, event: &EventId) -> Result<()> {
        if let Err(e) = self.ledger.register(event).await {
            return Err(self.surface(e).await);
        }
        self.refresh_registrations().await;
        Ok(())
    }

    /// Cancel one of the current user's registrations
    ///
    /// The ledger already removed the entry on success, so the view is
    /// republished without another fetch.
    pub async fn cancel(&self, registration: &RegistrationId) -> Result<()> {
        if let Err(e) = self.ledger.cancel(registration).await {
            return Err(self.surface(e).await);
        }
        self.publish_registrations(None);
        Ok(())
    }

    // =========================================================================
    // Profile and organizer operations
    // =========================================================================

    /// Fetch the current user's profile
    pub async fn profile(&self) -> Result<Profile> {
        let token = self.token()?;
        match self.api.profile(&token).await {
            Ok(profile) => Ok(profile),
            Err(e) => Err(self.surface(e).await),
        }
    }

    /// Update the current user's profile
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile> {
        let token = self.token()?;
        match self.api.update_profile(&token, update).await {
            Ok(profile) => Ok(profile),
            Err(e) => Err(self.surface(e).await),
        }
    }

    /// Create an event with an optional poster image (organizer role only)
    ///
    /// Refreshes the catalog on success so the new event becomes visible.
    pub async fn create_event(
        &self,
        draft: &EventDraft,
        image: Option<&ImageAttachment>,
    ) -> Result<Event> {
        let token = self.token()?;
        let created = match self.api.create_event(&token, draft, image).await {
            Ok(event) => event,
            Err(e) => return Err(self.surface(e).await),
        };
        tracing::info!(event = %created.id, "event created");
        self.refresh_events().await;
        Ok(created)
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Filter the cached catalog by a free-text query
    pub fn search(&self, query: &str) -> Vec<Event> {
        filter::filter(&self.catalog.events(), query)
    }

    /// Get the current events view
    pub fn events_view(&self) -> CatalogView {
        self.events_tx.borrow().clone()
    }

    /// Get the current registrations view
    pub fn registrations_view(&self) -> LedgerView {
        self.registrations_tx.borrow().clone()
    }

    /// Subscribe to events view updates
    pub fn subscribe_events(&self) -> watch::Receiver<CatalogView> {
        self.events_tx.subscribe()
    }

    /// Subscribe to registrations view updates
    pub fn subscribe_registrations(&self) -> watch::Receiver<LedgerView> {
        self.registrations_tx.subscribe()
    }

    /// Get the session store
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Get the event catalog
    pub fn catalog(&self) -> &Arc<EventCatalog> {
        &self.catalog
    }

    /// Get the registration ledger
    pub fn ledger(&self) -> &Arc<RegistrationLedger> {
        &self.ledger
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn token(&self) -> Result<AccessToken> {
        self.session.token().ok_or(SyncError::Unauthenticated)
    }

    /// Convert an operation failure, tearing the session down if the server
    /// rejected the token
    ///
    /// Only a server-reported rejection signs the user out; a locally absent
    /// token never clears anything.
    async fn surface<E: Into<SyncError>>(&self, error: E) -> SyncError {
        let error = error.into();
        if let SyncError::Api(ApiError::Unauthenticated(_)) = &error {
            tracing::info!("server rejected session token, signing out");
            if let Err(e) = self.session.clear().await {
                tracing::error!(error = %e, "failed to clear rejected session");
            }
            self.ledger.clear();
        }
        error
    }

    fn publish_events(&self, error: Option<String>) {
        let view = CatalogView {
            events: self.catalog.events(),
            error,
            loaded: self.catalog.has_loaded(),
        };
        // send_replace: the channel is the store of record, so the snapshot
        // must land even when no subscriber exists (send would drop it)
        self.events_tx.send_replace(view);
    }

    fn publish_registrations(&self, error: Option<String>) {
        let view = LedgerView {
            registrations: self.ledger.views(&self.catalog.events()),
            error,
            loaded: self.ledger.has_loaded(),
        };
        self.registrations_tx.send_replace(view);
    }
}
