//! Durable state slots
//!
//! Small JSON state files wrapped in a checksummed envelope, written
//! atomically so a crash mid-write never leaves a half-serialized file.

use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// Persistence error types
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Slot was used before `init` completed
    #[error("State not initialized")]
    NotInitialized,

    /// Stored file failed its checksum
    #[error("Corruption detected: {0}")]
    Corruption(String),

    /// Stored file was written by an incompatible schema
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build expects
        expected: u32,
        /// Version found on disk
        found: u32,
    },
}

/// Result type for persistence operations
pub type Result<T> = std::result::Result<T, PersistenceError>;

/// On-disk envelope around the payload
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
struct Envelope<T> {
    /// Schema version of the payload
    version: u32,
    /// md5 of the serialized payload, checked on load
    checksum: String,
    /// The payload itself
    data: T,
}

impl<T: Serialize> Envelope<T> {
    fn seal(version: u32, data: T) -> Result<Self> {
        let payload = serde_json::to_string(&data)?;
        let checksum = format!("{:x}", md5::compute(&payload));

        Ok(Self { version, checksum, data })
    }

    fn verify(&self) -> Result<()> {
        let payload = serde_json::to_string(&self.data)?;
        let computed = format!("{:x}", md5::compute(&payload));

        if computed != self.checksum {
            return Err(PersistenceError::Corruption(format!(
                "checksum mismatch: stored {}, computed {}",
                self.checksum, computed
            )));
        }

        Ok(())
    }
}

/// Configuration for a persisted slot
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// Path of the state file
    pub path: PathBuf,
    /// Schema version written into the envelope
    pub version: u32,
    /// Write via temp file + rename
    pub atomic_writes: bool,
    /// Keep rotated backups of previous states
    pub auto_backup: bool,
    /// How many backups to keep
    pub backup_count: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("session.json"),
            version: 1,
            atomic_writes: true,
            auto_backup: true,
            backup_count: 2,
        }
    }
}

impl PersistenceConfig {
    /// Create a configuration for the given state file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Set the schema version
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Enable or disable atomic writes
    pub fn atomic_writes(mut self, enabled: bool) -> Self {
        self.atomic_writes = enabled;
        self
    }

    /// Configure backup rotation
    pub fn backups(mut self, enabled: bool, count: usize) -> Self {
        self.auto_backup = enabled;
        self.backup_count = count;
        self
    }
}

/// A single durable state slot
///
/// Holds the current value in memory and mirrors every change to disk.
/// Loading verifies the envelope checksum and schema version, so a torn or
/// hand-edited file surfaces as [`PersistenceError::Corruption`] instead of
/// silently feeding garbage into the app.
///
/// # Example
///
/// ```no_run
/// use storage::persistence::{PersistedState, PersistenceConfig};
///
/// #[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
/// struct Settings {
///     dark_mode: bool,
/// }
///
/// # async fn run() -> storage::persistence::Result<()> {
/// let slot: PersistedState<Settings> =
///     PersistedState::new(PersistenceConfig::new("settings.json"));
/// slot.init().await?;
/// slot.update(|s| s.dark_mode = true).await?;
/// # Ok(())
/// # }
/// ```
pub struct PersistedState<T> {
    config: PersistenceConfig,
    state: Arc<RwLock<Option<T>>>,
}

impl<T> PersistedState<T>
where
    T: Serialize + DeserializeOwned + Clone + Default,
{
    /// Create a slot over the configured file without touching disk
    pub fn new(config: PersistenceConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(None)),
        }
    }

    /// Load the slot from disk, falling back to default when no file exists
    pub async fn init(&self) -> Result<()> {
        match self.load().await {
            Ok(data) => {
                let mut state = self.state.write().await;
                *state = Some(data);
                Ok(())
            }
            Err(PersistenceError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut state = self.state.write().await;
                *state = Some(T::default());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Load the slot, discarding unreadable state instead of failing
    ///
    /// A corrupt or incompatible file is logged and replaced with the
    /// default value on the next write. Used for state that is merely a
    /// convenience to carry across restarts, where "start fresh" is the
    /// correct recovery.
    pub async fn init_or_default(&self) -> Result<()> {
        match self.init().await {
            Ok(()) => Ok(()),
            Err(PersistenceError::Corruption(reason)) => {
                tracing::warn!(path = %self.config.path.display(), %reason, "discarding corrupt state file");
                let mut state = self.state.write().await;
                *state = Some(T::default());
                Ok(())
            }
            Err(PersistenceError::Serialization(e)) => {
                tracing::warn!(path = %self.config.path.display(), error = %e, "discarding undecodable state file");
                let mut state = self.state.write().await;
                *state = Some(T::default());
                Ok(())
            }
            Err(PersistenceError::VersionMismatch { expected, found }) => {
                tracing::warn!(
                    path = %self.config.path.display(),
                    expected,
                    found,
                    "discarding state file with incompatible version"
                );
                let mut state = self.state.write().await;
                *state = Some(T::default());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Get a clone of the current value
    pub async fn get(&self) -> Result<T> {
        let state = self.state.read().await;
        state.clone().ok_or(PersistenceError::NotInitialized)
    }

    /// Mutate the value in place and persist the result
    pub async fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut T),
    {
        let mut state = self.state.write().await;

        if let Some(current) = state.as_mut() {
            f(current);
            self.store(current).await?;
            Ok(())
        } else {
            Err(PersistenceError::NotInitialized)
        }
    }

    /// Replace the value and persist it
    pub async fn set(&self, new_state: T) -> Result<()> {
        let mut state = self.state.write().await;
        *state = Some(new_state.clone());
        self.store(&new_state).await
    }

    /// Reset to the default value and delete the state file
    ///
    /// Idempotent: clearing an already-cleared slot is a no-op.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.write().await;
        *state = Some(T::default());

        if self.config.path.exists() {
            fs::remove_file(&self.config.path).await?;
        }

        Ok(())
    }

    async fn load(&self) -> Result<T> {
        let contents = fs::read_to_string(&self.config.path).await?;
        let envelope: Envelope<T> = serde_json::from_str(&contents)?;

        envelope.verify()?;

        if envelope.version != self.config.version {
            return Err(PersistenceError::VersionMismatch {
                expected: self.config.version,
                found: envelope.version,
            });
        }

        Ok(envelope.data)
    }

    async fn store(&self, data: &T) -> Result<()> {
        let envelope = Envelope::seal(self.config.version, data.clone())?;
        let json = serde_json::to_string_pretty(&envelope)?;

        if self.config.atomic_writes {
            self.write_atomic(&json).await?;
        } else {
            fs::write(&self.config.path, json).await?;
        }

        if self.config.auto_backup {
            let _ = self.rotate_backups().await;
        }

        Ok(())
    }

    /// Write through a temp file and rename over the target
    async fn write_atomic(&self, contents: &str) -> Result<()> {
        let temp_path = self.config.path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.config.path).await?;

        Ok(())
    }

    async fn rotate_backups(&self) -> Result<()> {
        if !self.config.path.exists() {
            return Ok(());
        }

        for i in (1..self.config.backup_count).rev() {
            let from = self.backup_path(i);
            let to = self.backup_path(i + 1);

            if from.exists() {
                let _ = fs::rename(&from, &to).await;
            }
        }

        let _ = fs::copy(&self.config.path, &self.backup_path(1)).await;

        Ok(())
    }

    fn backup_path(&self, n: usize) -> PathBuf {
        let mut name = self.config.path.as_os_str().to_os_string();
        name.push(format!(".backup.{}", n));
        PathBuf::from(name)
    }

    /// Replace the current state with the contents of backup `n`
    pub async fn restore_from_backup(&self, n: usize) -> Result<()> {
        let backup_path = self.backup_path(n);

        if !backup_path.exists() {
            return Err(PersistenceError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "backup not found",
            )));
        }

        fs::copy(&backup_path, &self.config.path).await?;
        self.init().await
    }
}
