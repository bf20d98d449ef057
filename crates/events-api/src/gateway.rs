//! Typed gateway to the events service
//!
//! One method per remote operation, all returning decoded wire types. The
//! [`EventsApi`] trait is the seam between the network and the state layer:
//! production code talks to [`EventsGateway`], tests substitute fakes.

use crate::http::{ApiClientConfig, ApiRequest, HttpClient};
use crate::types::{
    AccessToken, Event, EventDraft, EventId, ImageAttachment, LoginRequest, LoginResponse,
    Profile, ProfileUpdate, Registration, RegistrationId, SignupRequest,
};
use crate::{ApiError, Result};
use async_trait::async_trait;

/// Remote operations the synchronization layer depends on
///
/// Authenticated operations take the token explicitly; callers are expected
/// to have resolved it from the session store first, so an absent token
/// never reaches this trait.
#[async_trait]
pub trait EventsApi: Send + Sync {
    /// Fetch the full event list
    async fn list_events(&self) -> Result<Vec<Event>>;

    /// Exchange credentials for a bearer token
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;

    /// Create a new account
    async fn sign_up(&self, request: &SignupRequest) -> Result<()>;

    /// Register the current user for an event
    async fn register_for_event(&self, token: &AccessToken, event: &EventId) -> Result<()>;

    /// Fetch the current user's registrations
    async fn list_registrations(&self, token: &AccessToken) -> Result<Vec<Registration>>;

    /// Cancel one of the current user's registrations
    async fn cancel_registration(
        &self,
        token: &AccessToken,
        registration: &RegistrationId,
    ) -> Result<()>;

    /// Fetch the current user's profile
    async fn profile(&self, token: &AccessToken) -> Result<Profile>;

    /// Update the current user's profile
    async fn update_profile(&self, token: &AccessToken, update: &ProfileUpdate)
        -> Result<Profile>;

    /// Create an event (organizer role only)
    async fn create_event(
        &self,
        token: &AccessToken,
        draft: &EventDraft,
        image: Option<&ImageAttachment>,
    ) -> Result<Event>;
}

/// The reqwest-backed [`EventsApi`] implementation
///
/// # Examples
/// ```no_run
/// use events_api::{ApiClientConfig, EventsApi, EventsGateway, LoginRequest};
///
/// async fn example() -> events_api::Result<()> {
///     let gateway = EventsGateway::new(ApiClientConfig::new("https://api.campuspulse.app"));
///
///     let session = gateway
///         .login(&LoginRequest {
///             email: "asha@example.edu".to_string(),
///             password: "hunter2".to_string(),
///         })
///         .await?;
///
///     let events = gateway.list_events().await?;
///     println!("{} events, token {}...", events.len(), &session.token.as_str()[..8]);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct EventsGateway {
    http: HttpClient,
}

impl EventsGateway {
    /// Create a gateway over the given configuration
    pub fn new(config: ApiClientConfig) -> Self {
        Self { http: HttpClient::new(config) }
    }

    /// Get the base service URL
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    fn event_form(
        draft: &EventDraft,
        image: Option<&ImageAttachment>,
    ) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new()
            .text("title", draft.title.clone())
            .text("college", draft.college.clone())
            .text("date", draft.date.to_rfc3339())
            .text("type", draft.kind.as_str())
            .text("registrationFee", draft.registration_fee.to_string())
            .text("description", draft.description.clone());

        if let Some(image) = image {
            let part = reqwest::multipart::Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.mime_type)
                .map_err(|e| ApiError::Validation(format!("invalid image mime type: {}", e)))?;
            form = form.part("image", part);
        }

        Ok(form)
    }
}

#[async_trait]
impl EventsApi for EventsGateway {
    async fn list_events(&self) -> Result<Vec<Event>> {
        let response = self.http.send::<Vec<Event>>(ApiRequest::get("events")).await?;
        Ok(response.data)
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let req = ApiRequest::post("auth/login").json_body(request)?;
        let response = self.http.send::<LoginResponse>(req).await?;
        Ok(response.data)
    }

    async fn sign_up(&self, request: &SignupRequest) -> Result<()> {
        let req = ApiRequest::post("auth/register").json_body(request)?;
        self.http.send_empty(req).await?;
        Ok(())
    }

    async fn register_for_event(&self, token: &AccessToken, event: &EventId) -> Result<()> {
        let req = ApiRequest::post(format!("events/{}/register", event)).bearer(token);
        self.http.send_empty(req).await?;
        Ok(())
    }

    async fn list_registrations(&self, token: &AccessToken) -> Result<Vec<Registration>> {
        let req = ApiRequest::get("registrations").bearer(token);
        let response = self.http.send::<Vec<Registration>>(req).await?;
        Ok(response.data)
    }

    async fn cancel_registration(
        &self,
        token: &AccessToken,
        registration: &RegistrationId,
    ) -> Result<()> {
        let req = ApiRequest::delete(format!("registrations/{}", registration)).bearer(token);
        self.http.send_empty(req).await?;
        Ok(())
    }

    async fn profile(&self, token: &AccessToken) -> Result<Profile> {
        let req = ApiRequest::get("profile").bearer(token);
        let response = self.http.send::<Profile>(req).await?;
        Ok(response.data)
    }

    async fn update_profile(
        &self,
        token: &AccessToken,
        update: &ProfileUpdate,
    ) -> Result<Profile> {
        let req = ApiRequest::put("profile").bearer(token).json_body(update)?;
        let response = self.http.send::<Profile>(req).await?;
        Ok(response.data)
    }

    async fn create_event(
        &self,
        token: &AccessToken,
        draft: &EventDraft,
        image: Option<&ImageAttachment>,
    ) -> Result<Event> {
        let form = Self::event_form(draft, image)?;
        let response = self.http.send_multipart::<Event>("events", token, form).await?;
        Ok(response.data)
    }
}
