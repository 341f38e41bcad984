//! Dashboard statistics.

use axum::http::{Method, StatusCode};
use serde_json::json;

use enquiry_desk_integration_tests::{Console, StubBackend, location};

async fn signed_in(role: &str) -> (StubBackend, Console) {
    let backend = StubBackend::start().await;
    let console = Console::start(&backend).await;
    console.login_as(&backend, role).await;
    backend.reset_requests();
    (backend, console)
}

fn card_count(count: u64) -> String {
    format!("<p class=\"text-2xl font-semibold\">{count}</p>")
}

#[tokio::test]
async fn test_cards_show_counts_and_link_to_filtered_lists() {
    let (backend, console) = signed_in("staff").await;
    backend.respond(
        Method::GET,
        "/api/enquiries/stats",
        StatusCode::OK,
        json!({
            "total": 17,
            "byStatus": [
                {"_id": "new", "count": 9},
                {"_id": "closed", "count": 8},
            ],
        }),
    );

    let page = console.page("/dashboard").await;

    assert_eq!(
        backend
            .requests_to(&Method::GET, "/api/enquiries/stats")
            .len(),
        1
    );
    for title in ["Total Enquiries", "New Enquiries", "In Progress", "Closed"] {
        assert!(page.contains(title), "missing card {title}");
    }
    assert!(page.contains(&card_count(17)));
    assert!(page.contains(&card_count(9)));
    assert!(page.contains(&card_count(8)));
    // No in-progress bucket in the response.
    assert!(page.contains(&card_count(0)));
    assert!(page.contains("href=\"/enquiries?status=in_progress\""));
    assert!(page.contains("Quick Actions"));
}

#[tokio::test]
async fn test_stats_failure_shows_zeroes_and_a_toast() {
    let (backend, console) = signed_in("admin").await;
    backend.respond(
        Method::GET,
        "/api/enquiries/stats",
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({}),
    );

    let page = console.page("/dashboard").await;

    assert!(page.contains("Failed to load statistics"));
    assert_eq!(page.matches(&card_count(0)).count(), 4);
}

#[tokio::test]
async fn test_stats_failure_uses_backend_message() {
    let (backend, console) = signed_in("staff").await;
    backend.respond(
        Method::GET,
        "/api/enquiries/stats",
        StatusCode::SERVICE_UNAVAILABLE,
        json!({"message": "Stats are being rebuilt"}),
    );

    let page = console.page("/dashboard").await;

    assert!(page.contains("Stats are being rebuilt"));
    assert!(!page.contains("Failed to load statistics"));
}

#[tokio::test]
async fn test_expired_credential_ends_session() {
    let (backend, console) = signed_in("staff").await;
    backend.respond(
        Method::GET,
        "/api/enquiries/stats",
        StatusCode::UNAUTHORIZED,
        json!({"message": "Token expired"}),
    );

    let response = console.get("/dashboard").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));

    let response = console.get("/dashboard").await;
    assert_eq!(location(&response), Some("/login"));
}
