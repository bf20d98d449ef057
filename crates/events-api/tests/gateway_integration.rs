//! Integration tests for the events gateway against a mock HTTP server
//!
//! These verify the wire contract: paths, bearer headers, body shapes, and
//! the mapping of HTTP outcomes onto the error taxonomy.

use events_api::{
    ApiClientConfig, ApiError, EventsApi, EventsGateway, AccessToken, EventDraft, EventId,
    EventKind, ImageAttachment, LoginRequest, PaymentStatus, ProfileUpdate, RegistrationId,
    SignupRequest, UserRole,
};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway_for(server: &MockServer) -> EventsGateway {
    EventsGateway::new(ApiClientConfig::new(server.uri()))
}

fn event_json(id: &str, title: &str, college: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "college": college,
        "date": "2026-03-05T09:00:00Z",
        "type": "technical",
        "registrationFee": 100,
        "description": "description",
        "image": null
    })
}

#[tokio::test]
async fn test_list_events_decodes_full_catalog() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            event_json("ev-1", "Hack Day", "MIT"),
            event_json("ev-2", "Spring Fest", "IIT Bombay"),
            event_json("ev-3", "Chess Open", "NIT Surathkal"),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let events = gateway.list_events().await.unwrap();

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].id, EventId::new("ev-1"));
    assert_eq!(events[0].title, "Hack Day");
    assert_eq!(events[0].kind, EventKind::Technical);
    assert_eq!(events[0].registration_fee, 100);
}

#[tokio::test]
async fn test_login_sends_credentials_and_returns_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(serde_json::json!({
            "email": "asha@example.edu",
            "password": "hunter2"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "tok-abc"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let response = gateway
        .login(&LoginRequest {
            email: "asha@example.edu".to_string(),
            password: "hunter2".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(response.token.as_str(), "tok-abc");
}

#[tokio::test]
async fn test_login_rejection_maps_to_unauthenticated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "Invalid email or password"
        })))
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let result = gateway
        .login(&LoginRequest {
            email: "asha@example.edu".to_string(),
            password: "wrong".to_string(),
        })
        .await;

    match result {
        Err(ApiError::Unauthenticated(message)) => {
            assert_eq!(message, "Invalid email or password");
        }
        other => panic!("expected Unauthenticated, got {:?}", other),
    }
}

#[tokio::test]
async fn test_register_attaches_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/events/ev-1/register"))
        .and(header("Authorization", "Bearer tok-abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let token = AccessToken::new("tok-abc");

    // Empty response body is fine for acknowledgement endpoints
    gateway
        .register_for_event(&token, &EventId::new("ev-1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_registrations_decodes_payment_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/registrations"))
        .and(header("Authorization", "Bearer tok-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "reg-1", "eventId": "ev-1", "paymentStatus": "paid"},
            {"id": "reg-2", "eventId": "ev-gone", "paymentStatus": "pending"}
        ])))
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let registrations = gateway
        .list_registrations(&AccessToken::new("tok-abc"))
        .await
        .unwrap();

    assert_eq!(registrations.len(), 2);
    assert_eq!(registrations[0].payment_status, PaymentStatus::Paid);
    assert_eq!(registrations[1].payment_status, PaymentStatus::Pending);
    assert_eq!(registrations[1].event_id, EventId::new("ev-gone"));
}

#[tokio::test]
async fn test_cancel_missing_registration_maps_to_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/registrations/reg-9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "Registration not found"
        })))
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let result = gateway
        .cancel_registration(&AccessToken::new("tok-abc"), &RegistrationId::new("reg-9"))
        .await;

    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_signup_validation_failure_surfaces_server_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "message": "Email already in use"
        })))
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let result = gateway
        .sign_up(&SignupRequest {
            name: "Asha".to_string(),
            email: "asha@example.edu".to_string(),
            password: "hunter2".to_string(),
            college: "NIT Trichy".to_string(),
            role: UserRole::Student,
        })
        .await;

    match result {
        Err(ApiError::Validation(message)) => assert_eq!(message, "Email already in use"),
        other => panic!("expected Validation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "message": "Service temporarily unavailable"
        })))
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let err = gateway.list_events().await.unwrap_err();

    assert!(matches!(err, ApiError::Api { status: 503, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_malformed_success_body_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let result = gateway.list_events().await;

    assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_unreachable_server_maps_to_network_failure() {
    // Nothing listens on port 1; the connection is refused immediately
    let gateway = EventsGateway::new(
        ApiClientConfig::new("http://127.0.0.1:1").with_timeout(Duration::from_secs(5)),
    );

    let err = gateway.list_events().await.unwrap_err();

    assert!(matches!(err, ApiError::Network(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_update_profile_sends_camel_case_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/profile"))
        .and(header("Authorization", "Bearer tok-abc"))
        .and(body_json(serde_json::json!({
            "name": "Asha R",
            "rollNo": "21CS042"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Asha R",
            "email": "asha@example.edu",
            "college": "NIT Trichy",
            "role": "student",
            "rollNo": "21CS042"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let profile = gateway
        .update_profile(
            &AccessToken::new("tok-abc"),
            &ProfileUpdate {
                name: "Asha R".to_string(),
                roll_no: Some("21CS042".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(profile.name, "Asha R");
    assert_eq!(profile.roll_no.as_deref(), Some("21CS042"));
    assert_eq!(profile.role, UserRole::Student);
}

#[tokio::test]
async fn test_profile_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("Authorization", "Bearer tok-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Ravi",
            "email": "ravi@example.edu",
            "college": "BITS Pilani",
            "role": "organizer"
        })))
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let profile = gateway.profile(&AccessToken::new("tok-abc")).await.unwrap();

    assert_eq!(profile.role, UserRole::Organizer);
    assert_eq!(profile.roll_no, None);
}

#[tokio::test]
async fn test_create_event_uploads_multipart_form() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/events"))
        .and(header("Authorization", "Bearer tok-org"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(event_json("ev-new", "Robotics Expo", "BITS Pilani")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let draft = EventDraft {
        title: "Robotics Expo".to_string(),
        college: "BITS Pilani".to_string(),
        date: "2026-03-05T09:00:00Z".parse().unwrap(),
        kind: EventKind::Technical,
        registration_fee: 100,
        description: "description".to_string(),
    };
    let image = ImageAttachment {
        file_name: "poster.jpg".to_string(),
        mime_type: "image/jpeg".to_string(),
        bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
    };

    let created = gateway
        .create_event(&AccessToken::new("tok-org"), &draft, Some(&image))
        .await
        .unwrap();

    assert_eq!(created.id, EventId::new("ev-new"));
    assert_eq!(created.title, "Robotics Expo");
}
