//! Session token store
//!
//! Owns the current authentication token, the only state that survives an
//! app restart. The token is opaque: the client never inspects or validates
//! it, and expiry is discovered solely through a failed authenticated call.

use events_api::AccessToken;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use storage::persistence::{PersistedState, PersistenceConfig, PersistenceError};
use thiserror::Error;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading or writing the persisted token slot failed
    #[error("session persistence failed: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// On-disk form of the session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredSession {
    /// Raw bearer token, absent when signed out
    token: Option<String>,
}

/// Holder of the current authentication token
///
/// Constructed explicitly and passed into whatever needs credentials, so
/// tests can substitute an in-memory session without touching disk. Reads
/// are synchronous against the in-memory slot; writes flush through to the
/// persisted slot when one is attached.
///
/// # Example
///
/// ```no_run
/// use app_state::session::SessionStore;
/// use events_api::AccessToken;
///
/// # async fn run() -> app_state::session::Result<()> {
/// let session = SessionStore::persisted("session.json").await?;
///
/// if session.token().is_none() {
///     // show the login screen, then:
///     session.set_token(AccessToken::new("tok-from-login")).await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct SessionStore {
    token: RwLock<Option<AccessToken>>,
    slot: Option<PersistedState<StoredSession>>,
}

impl SessionStore {
    /// Create a store with no persistence
    ///
    /// The session lives for this process only. Used in tests and anywhere
    /// a throwaway session is acceptable.
    pub fn in_memory() -> Self {
        Self { token: RwLock::new(None), slot: None }
    }

    /// Create a store backed by a token file at `path`
    ///
    /// Loads any previously stored token. A corrupt or incompatible file is
    /// discarded and the store starts signed out.
    pub async fn persisted(path: impl Into<PathBuf>) -> Result<Self> {
        let slot: PersistedState<StoredSession> =
            PersistedState::new(PersistenceConfig::new(path));
        slot.init_or_default().await?;

        let stored = slot.get().await?;
        let token = stored.token.map(AccessToken::new);

        Ok(Self { token: RwLock::new(token), slot: Some(slot) })
    }

    /// Get the current token, or `None` when signed out
    pub fn token(&self) -> Option<AccessToken> {
        self.token.read().clone()
    }

    /// Check whether a token is present
    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    /// Install a new token, replacing any existing one
    pub async fn set_token(&self, token: AccessToken) -> Result<()> {
        *self.token.write() = Some(token.clone());

        if let Some(slot) = &self.slot {
            slot.set(StoredSession { token: Some(token.as_str().to_string()) }).await?;
        }

        Ok(())
    }

    /// Drop the current token
    ///
    /// Idempotent: clearing an already-cleared session succeeds and leaves
    /// the store signed out.
    pub async fn clear(&self) -> Result<()> {
        *self.token.write() = None;

        if let Some(slot) = &self.slot {
            slot.clear().await?;
        }

        Ok(())
    }
}
