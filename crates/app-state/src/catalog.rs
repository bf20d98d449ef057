//! Event catalog cache
//!
//! In-memory snapshot of the full event list as last fetched from the
//! service. The snapshot is replaced wholesale on every successful refresh;
//! a failed refresh keeps the previous data, since stale-but-available beats
//! an empty screen. Refreshes may overlap: a ticket taken at issue time
//! decides which result installs, so a slow early fetch can never clobber a
//! newer one.

use events_api::{Event, EventId, EventsApi};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Snapshot {
    events: Vec<Event>,
    /// Ticket of the refresh that produced this data
    installed: u64,
    loaded: bool,
}

/// Cache of the full event list
///
/// # Example
///
/// ```no_run
/// use app_state::catalog::EventCatalog;
/// use events_api::{ApiClientConfig, EventsGateway};
/// use std::sync::Arc;
///
/// # async fn run() -> events_api::Result<()> {
/// let gateway = EventsGateway::new(ApiClientConfig::new("https://api.campuspulse.app"));
/// let catalog = EventCatalog::new(Arc::new(gateway));
///
/// catalog.refresh().await?;
/// println!("{} events", catalog.events().len());
/// # Ok(())
/// # }
/// ```
pub struct EventCatalog {
    api: Arc<dyn EventsApi>,
    snapshot: RwLock<Snapshot>,
    tickets: AtomicU64,
}

impl EventCatalog {
    /// Create an empty catalog over the given gateway
    pub fn new(api: Arc<dyn EventsApi>) -> Self {
        Self {
            api,
            snapshot: RwLock::new(Snapshot::default()),
            tickets: AtomicU64::new(0),
        }
    }

    /// Fetch the full event list and install it as the current snapshot
    ///
    /// Returns the snapshot visible after this refresh settled, which is not
    /// necessarily the fetched list: a refresh issued later that completed
    /// first wins, and this result is discarded. On failure the previous
    /// snapshot stays in place and the error is returned.
    pub async fn refresh(&self) -> events_api::Result<Vec<Event>> {
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;

        match self.api.list_events().await {
            Ok(events) => {
                let mut snapshot = self.snapshot.write();
                if ticket > snapshot.installed {
                    tracing::debug!(ticket, count = events.len(), "installing catalog snapshot");
                    snapshot.events = events;
                    snapshot.installed = ticket;
                    snapshot.loaded = true;
                } else {
                    tracing::debug!(ticket, "discarding superseded catalog fetch");
                }
                Ok(snapshot.events.clone())
            }
            Err(e) => {
                tracing::warn!(error = %e, "catalog refresh failed, keeping previous snapshot");
                Err(e)
            }
        }
    }

    /// Get the last successfully fetched event list
    ///
    /// Empty before the first successful refresh.
    pub fn events(&self) -> Vec<Event> {
        self.snapshot.read().events.clone()
    }

    /// Check whether any refresh has ever succeeded
    ///
    /// Distinguishes "no events exist" from "nothing fetched yet", which
    /// render differently when a refresh fails.
    pub fn has_loaded(&self) -> bool {
        self.snapshot.read().loaded
    }

    /// Look up an event in the current snapshot
    pub fn find(&self, id: &EventId) -> Option<Event> {
        self.snapshot.read().events.iter().find(|e| &e.id == id).cloned()
    }
}
