//! CampusPulse events service client
//!
//! This crate provides the typed HTTP gateway to the remote events service:
//! wire types, request plumbing, and an [`EventsApi`] trait so the state
//! layer can be tested against fakes instead of a live server.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod gateway;
pub mod http;
pub mod types;

pub use gateway::{EventsApi, EventsGateway};
pub use http::{ApiClientConfig, HttpClient};
pub use types::{
    AccessToken, Event, EventDraft, EventId, EventKind, ImageAttachment, LoginRequest,
    LoginResponse, PaymentStatus, Profile, ProfileUpdate, Registration, RegistrationId,
    SignupRequest, UserRole,
};

/// Result type for events service operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Error taxonomy for the events service
///
/// Every failure a caller can observe falls into one of these classes. The
/// state layer maps them onto user-facing messages; none of them is fatal.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// No token, or the server rejected the one presented
    #[error("not authenticated: {0}")]
    Unauthenticated(String),

    /// Transport-level failure (connect, timeout, interrupted body)
    #[error("network failure: {0}")]
    Network(String),

    /// The request payload was rejected by the server or could not be encoded
    #[error("validation failed: {0}")]
    Validation(String),

    /// The addressed resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success response
    #[error("server error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the server
        message: String,
    },

    /// A success response whose body could not be decoded
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Classify a non-success HTTP status into the taxonomy
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => ApiError::Unauthenticated(message),
            400 | 422 => ApiError::Validation(message),
            404 => ApiError::NotFound(message),
            _ => ApiError::Api { status, message },
        }
    }

    /// Check whether this failure is a transient network-side condition
    ///
    /// Covers transport failures plus the status codes that indicate the
    /// server (or an intermediary) was momentarily unable to answer:
    /// 408, 425, 429, 500, 502, 503, 504, 522, 524.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Api { status, .. } => {
                matches!(status, 408 | 425 | 429 | 500 | 502 | 503 | 504 | 522 | 524)
            }
            _ => false,
        }
    }

    /// Get the HTTP status code, when one was observed
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}
