//! Shared fixtures and a scriptable in-memory gateway for tests
//!
//! [`FakeGateway`] keeps a mutable server-side picture (events,
//! registrations, profile) behind a lock and implements [`EventsApi`]
//! against it. Tests can script the next failure per endpoint, require a
//! specific bearer token, and park the next list call on a oneshot so
//! completion order becomes controllable.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use events_api::{
    AccessToken, ApiError, Event, EventDraft, EventId, EventKind, EventsApi, ImageAttachment,
    LoginRequest, LoginResponse, PaymentStatus, Profile, ProfileUpdate, Registration,
    RegistrationId, SignupRequest, UserRole,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

/// Build an event fixture dated 5 March 2026
pub fn event(id: &str, title: &str, college: &str) -> Event {
    Event {
        id: EventId::new(id),
        title: title.to_string(),
        college: college.to_string(),
        date: Utc.with_ymd_and_hms(2026, 3, 5, 9, 0, 0).unwrap(),
        kind: EventKind::Technical,
        registration_fee: 100,
        description: format!("{} at {}", title, college),
        image: None,
    }
}

/// Build a pending registration fixture
pub fn registration(id: &str, event_id: &str) -> Registration {
    Registration {
        id: RegistrationId::new(id),
        event_id: EventId::new(event_id),
        payment_status: PaymentStatus::Pending,
    }
}

/// Spin until `counter` reaches `n`
///
/// The fakes bump their counters before parking on a hold, so this is how a
/// test knows an in-flight call has actually entered the gateway.
pub async fn wait_for_calls(counter: &AtomicUsize, n: usize) {
    while counter.load(Ordering::SeqCst) < n {
        tokio::task::yield_now().await;
    }
}

/// Per-endpoint call counters
#[derive(Debug, Default)]
pub struct CallCounts {
    pub list_events: AtomicUsize,
    pub login: AtomicUsize,
    pub sign_up: AtomicUsize,
    pub register: AtomicUsize,
    pub list_registrations: AtomicUsize,
    pub cancel: AtomicUsize,
    pub profile: AtomicUsize,
    pub update_profile: AtomicUsize,
    pub create_event: AtomicUsize,
}

impl CallCounts {
    /// Total calls across every endpoint
    pub fn total(&self) -> usize {
        self.list_events.load(Ordering::SeqCst)
            + self.login.load(Ordering::SeqCst)
            + self.sign_up.load(Ordering::SeqCst)
            + self.register.load(Ordering::SeqCst)
            + self.list_registrations.load(Ordering::SeqCst)
            + self.cancel.load(Ordering::SeqCst)
            + self.profile.load(Ordering::SeqCst)
            + self.update_profile.load(Ordering::SeqCst)
            + self.create_event.load(Ordering::SeqCst)
    }
}

struct FakeState {
    events: Vec<Event>,
    registrations: Vec<Registration>,
    profile: Profile,
    /// `None` accepts any token; `Some` rejects everything else
    valid_token: Option<String>,
    next_registration: u32,
    next_event: u32,
    fail_events: VecDeque<ApiError>,
    fail_registrations: VecDeque<ApiError>,
    fail_register: VecDeque<ApiError>,
    fail_cancel: VecDeque<ApiError>,
    fail_login: VecDeque<ApiError>,
}

impl FakeState {
    fn check_token(&self, token: &AccessToken) -> events_api::Result<()> {
        match &self.valid_token {
            Some(expected) if token.as_str() != expected => {
                Err(ApiError::Unauthenticated("invalid token".to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            registrations: Vec::new(),
            profile: Profile {
                name: "Asha".to_string(),
                email: "asha@example.edu".to_string(),
                college: "NIT Trichy".to_string(),
                role: UserRole::Student,
                roll_no: Some("21CS042".to_string()),
            },
            valid_token: None,
            next_registration: 0,
            next_event: 0,
            fail_events: VecDeque::new(),
            fail_registrations: VecDeque::new(),
            fail_register: VecDeque::new(),
            fail_cancel: VecDeque::new(),
            fail_login: VecDeque::new(),
        }
    }
}

/// Scriptable in-memory [`EventsApi`] implementation
pub struct FakeGateway {
    state: Mutex<FakeState>,
    events_holds: Mutex<VecDeque<oneshot::Receiver<()>>>,
    registrations_holds: Mutex<VecDeque<oneshot::Receiver<()>>>,
    /// Observed call counts, readable while calls are parked
    pub calls: CallCounts,
}

impl FakeGateway {
    /// Create a fake with no events, no registrations, accepting any token
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            events_holds: Mutex::new(VecDeque::new()),
            registrations_holds: Mutex::new(VecDeque::new()),
            calls: CallCounts::default(),
        }
    }

    /// Replace the server-side event list
    pub fn set_events(&self, events: Vec<Event>) {
        self.state.lock().events = events;
    }

    /// Replace the server-side registration list
    pub fn set_registrations(&self, registrations: Vec<Registration>) {
        self.state.lock().registrations = registrations;
    }

    /// Accept only this bearer token from now on; login starts issuing it
    pub fn require_token(&self, token: &str) {
        self.state.lock().valid_token = Some(token.to_string());
    }

    /// Fail the next `list_events` call with the given error
    pub fn fail_next_events(&self, error: ApiError) {
        self.state.lock().fail_events.push_back(error);
    }

    /// Fail the next `list_registrations` call with the given error
    pub fn fail_next_registrations(&self, error: ApiError) {
        self.state.lock().fail_registrations.push_back(error);
    }

    /// Fail the next `register_for_event` call with the given error
    pub fn fail_next_register(&self, error: ApiError) {
        self.state.lock().fail_register.push_back(error);
    }

    /// Fail the next `cancel_registration` call with the given error
    pub fn fail_next_cancel(&self, error: ApiError) {
        self.state.lock().fail_cancel.push_back(error);
    }

    /// Fail the next `login` call with the given error
    pub fn fail_next_login(&self, error: ApiError) {
        self.state.lock().fail_login.push_back(error);
    }

    /// Park the next `list_events` call until the returned sender fires
    ///
    /// The parked call computes its result on entry, so state changed while
    /// it is parked does not leak into it.
    pub fn hold_next_events(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.events_holds.lock().push_back(rx);
        tx
    }

    /// Park the next `list_registrations` call until the returned sender fires
    pub fn hold_next_registrations(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.registrations_holds.lock().push_back(rx);
        tx
    }
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventsApi for FakeGateway {
    async fn list_events(&self) -> events_api::Result<Vec<Event>> {
        self.calls.list_events.fetch_add(1, Ordering::SeqCst);
        let result = {
            let mut state = self.state.lock();
            match state.fail_events.pop_front() {
                Some(err) => Err(err),
                None => Ok(state.events.clone()),
            }
        };
        let hold = self.events_holds.lock().pop_front();
        if let Some(rx) = hold {
            let _ = rx.await;
        }
        result
    }

    async fn login(&self, _request: &LoginRequest) -> events_api::Result<LoginResponse> {
        self.calls.login.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        if let Some(err) = state.fail_login.pop_front() {
            return Err(err);
        }
        let token = state.valid_token.clone().unwrap_or_else(|| "tok-fake".to_string());
        Ok(LoginResponse { token: AccessToken::new(token) })
    }

    async fn sign_up(&self, _request: &SignupRequest) -> events_api::Result<()> {
        self.calls.sign_up.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn register_for_event(
        &self,
        token: &AccessToken,
        event: &EventId,
    ) -> events_api::Result<()> {
        self.calls.register.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        if let Some(err) = state.fail_register.pop_front() {
            return Err(err);
        }
        state.check_token(token)?;
        state.next_registration += 1;
        let entry = Registration {
            id: RegistrationId::new(format!("reg-{}", state.next_registration)),
            event_id: event.clone(),
            payment_status: PaymentStatus::Pending,
        };
        state.registrations.push(entry);
        Ok(())
    }

    async fn list_registrations(
        &self,
        token: &AccessToken,
    ) -> events_api::Result<Vec<Registration>> {
        self.calls.list_registrations.fetch_add(1, Ordering::SeqCst);
        let result = {
            let mut state = self.state.lock();
            if let Some(err) = state.fail_registrations.pop_front() {
                Err(err)
            } else if let Err(err) = state.check_token(token) {
                Err(err)
            } else {
                Ok(state.registrations.clone())
            }
        };
        let hold = self.registrations_holds.lock().pop_front();
        if let Some(rx) = hold {
            let _ = rx.await;
        }
        result
    }

    async fn cancel_registration(
        &self,
        token: &AccessToken,
        registration: &RegistrationId,
    ) -> events_api::Result<()> {
        self.calls.cancel.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        if let Some(err) = state.fail_cancel.pop_front() {
            return Err(err);
        }
        state.check_token(token)?;
        let before = state.registrations.len();
        state.registrations.retain(|r| &r.id != registration);
        if state.registrations.len() == before {
            return Err(ApiError::NotFound(format!("no registration {}", registration)));
        }
        Ok(())
    }

    async fn profile(&self, token: &AccessToken) -> events_api::Result<Profile> {
        self.calls.profile.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock();
        state.check_token(token)?;
        Ok(state.profile.clone())
    }

    async fn update_profile(
        &self,
        token: &AccessToken,
        update: &ProfileUpdate,
    ) -> events_api::Result<Profile> {
        self.calls.update_profile.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        state.check_token(token)?;
        state.profile.name = update.name.clone();
        if let Some(roll_no) = &update.roll_no {
            state.profile.roll_no = Some(roll_no.clone());
        }
        Ok(state.profile.clone())
    }

    async fn create_event(
        &self,
        token: &AccessToken,
        draft: &EventDraft,
        image: Option<&ImageAttachment>,
    ) -> events_api::Result<Event> {
        self.calls.create_event.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        state.check_token(token)?;
        state.next_event += 1;
        let created = Event {
            id: EventId::new(format!("ev-created-{}", state.next_event)),
            title: draft.title.clone(),
            college: draft.college.clone(),
            date: draft.date,
            kind: draft.kind,
            registration_fee: draft.registration_fee,
            description: draft.description.clone(),
            image: image.map(|i| format!("https://cdn.campuspulse.app/posters/{}", i.file_name)),
        };
        state.events.push(created.clone());
        Ok(created)
    }
}
