//! Storage layer for CampusPulse
//!
//! This crate provides durable on-disk state for the few things that must
//! survive an app restart. In practice that is the session token slot;
//! catalog and registration data are always rebuilt from the network.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod persistence;

pub use persistence::{PersistedState, PersistenceConfig, PersistenceError};
