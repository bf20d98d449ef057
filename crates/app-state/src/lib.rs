//! Application state management for CampusPulse
//!
//! This crate is the synchronization layer between the UI and the events
//! service: session persistence, the cached event catalog, the registration
//! ledger, and the coordinator that keeps all of them consistent while the
//! user moves between views.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod coordinator;
pub mod filter;
pub mod ledger;
pub mod session;

#[cfg(test)]
mod test_support;

pub use catalog::EventCatalog;
pub use coordinator::{CatalogView, LedgerView, SyncCoordinator, SyncError, ViewId};
pub use ledger::{LedgerError, RegistrationLedger, RegistrationView};
pub use session::{SessionError, SessionStore};
