//! Public enquiry form.

use axum::http::{Method, StatusCode};
use serde_json::json;

use enquiry_desk_integration_tests::{Console, StubBackend, location};

const FORM: &[(&str, &str)] = &[
    ("customer_name", "Jane Doe"),
    ("email", "jane@example.com"),
    ("phone", "1234567890"),
    ("priority", ""),
    ("message", "Where is my order?"),
];

#[tokio::test]
async fn test_public_submission_needs_no_session() {
    let backend = StubBackend::start().await;
    backend.respond(
        Method::POST,
        "/api/enquiries/public",
        StatusCode::CREATED,
        json!({"message": "created"}),
    );
    let console = Console::start(&backend).await;

    let response = console.post("/contact", FORM).await;
    assert_eq!(location(&response), Some("/contact"));

    let calls = backend.requests_to(&Method::POST, "/api/enquiries/public");
    let call = calls.first().unwrap();
    assert_eq!(call.authorization, None);
    assert_eq!(
        call.body,
        Some(json!({
            "customerName": "Jane Doe",
            "email": "jane@example.com",
            "phone": "1234567890",
            "message": "Where is my order?",
            "priority": "medium",
        }))
    );

    let page = console.page("/contact").await;
    assert!(page.contains("Your enquiry has been submitted! We will contact you soon."));
    assert!(!page.contains("value=\"Jane Doe\""));
}

#[tokio::test]
async fn test_failed_submission_keeps_entered_values() {
    let backend = StubBackend::start().await;
    backend.respond(
        Method::POST,
        "/api/enquiries/public",
        StatusCode::SERVICE_UNAVAILABLE,
        json!({}),
    );
    let console = Console::start(&backend).await;

    let response = console.post("/contact", FORM).await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Failed to submit enquiry"));
    assert!(body.contains("value=\"Jane Doe\""));
    assert!(body.contains("Where is my order?"));
}

#[tokio::test]
async fn test_missing_fields_are_caught_before_submission() {
    let backend = StubBackend::start().await;
    let console = Console::start(&backend).await;

    let response = console
        .post("/contact", &[("customer_name", "Jane Doe"), ("email", "jane@example.com")])
        .await;

    let body = response.text().await.unwrap();
    assert!(body.contains("Phone is required"));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_toast_can_be_dismissed() {
    let backend = StubBackend::start().await;
    let console = Console::start(&backend).await;

    let body = console
        .post("/contact", &[("customer_name", "Jane Doe")])
        .await
        .text()
        .await
        .unwrap();
    let marker = "action=\"/notifications/";
    let start = body.find(marker).unwrap() + marker.len();
    let id: String = body.get(start..).unwrap().chars().take_while(|c| *c != '/').collect();

    let response = console
        .post(&format!("/notifications/{id}/dismiss"), &[("back", "/contact")])
        .await;
    assert_eq!(location(&response), Some("/contact"));

    let page = console.page("/contact").await;
    assert!(!page.contains("is required"));
}
