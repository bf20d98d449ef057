//! Wire types for the events service
//!
//! Request and response bodies exchanged with the remote API, plus the
//! identifier newtypes the rest of the app keys its state on. All JSON
//! bodies are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Identifiers
// =============================================================================

/// Server-assigned event identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(String);

impl EventId {
    /// Create an event id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned registration identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationId(String);

impl RegistrationId {
    /// Create a registration id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque bearer token issued at login
///
/// The client never inspects the token; expiry is only discovered when an
/// authenticated call fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token string
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the raw token for the Authorization header
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Events
// =============================================================================

/// Category an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Hackathons, workshops, tech talks
    Technical,
    /// Fests, performances, exhibitions
    Cultural,
    /// Tournaments and matches
    Sports,
    /// Anything the server introduces later
    #[serde(other)]
    Other,
}

impl EventKind {
    /// Get the wire name of this category
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Technical => "technical",
            EventKind::Cultural => "cultural",
            EventKind::Sports => "sports",
            EventKind::Other => "other",
        }
    }
}

/// A single event as published by the server
///
/// Immutable from the client's perspective; organizers create events but
/// never edit them through this client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique, stable identifier
    pub id: EventId,
    /// Event title
    pub title: String,
    /// Hosting college
    pub college: String,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Event category
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Entry fee in whole currency units, zero for free events
    pub registration_fee: u32,
    /// Event description
    pub description: String,
    /// Poster image URI, when one was uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Fields an organizer supplies when creating an event
///
/// The server assigns the id and image URI; the image itself travels as a
/// separate multipart file part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    /// Event title
    pub title: String,
    /// Hosting college
    pub college: String,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Event category
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Entry fee in whole currency units
    pub registration_fee: u32,
    /// Event description
    pub description: String,
}

/// Poster image uploaded with a new event
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    /// File name sent in the multipart part
    pub file_name: String,
    /// MIME type (e.g. "image/jpeg")
    pub mime_type: String,
    /// Raw image bytes
    pub bytes: Vec<u8>,
}

// =============================================================================
// Registrations
// =============================================================================

/// Payment state of a registration, assigned by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Registered, payment outstanding
    Pending,
    /// Payment confirmed
    Paid,
    /// Any state the server introduces later
    #[serde(other)]
    Other,
}

/// One registration of the current user
///
/// `event_id` is a weak reference: the event may have been deleted
/// server-side since the registration was made. Such orphaned registrations
/// are an expected state and remain cancellable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Unique identifier
    pub id: RegistrationId,
    /// Id of the registered event; may no longer resolve
    pub event_id: EventId,
    /// Server-assigned payment state
    pub payment_status: PaymentStatus,
}

// =============================================================================
// Accounts and profiles
// =============================================================================

/// Role a user account holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular attendee
    Student,
    /// Can create events
    Organizer,
    /// Any role the server introduces later
    #[serde(other)]
    Other,
}

/// The current user's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Display name
    pub name: String,
    /// Account email
    pub email: String,
    /// Home college
    pub college: String,
    /// Account role
    pub role: UserRole,
    /// Roll number, present for students
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_no: Option<String>,
}

/// Editable profile fields for `PUT profile`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New display name
    pub name: String,
    /// New roll number, omitted to leave unchanged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_no: Option<String>,
}

// =============================================================================
// Auth
// =============================================================================

/// Credentials for `POST auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

/// Successful login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent authenticated calls
    pub token: AccessToken,
}

/// Account creation payload for `POST auth/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    /// Display name
    pub name: String,
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
    /// Home college
    pub college: String,
    /// Requested role
    pub role: UserRole,
}
