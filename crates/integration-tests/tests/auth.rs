//! Sign-in, sign-out, route guard and session expiry.

use axum::http::{Method, StatusCode};
use serde_json::json;

use enquiry_desk_integration_tests::{
    Console, StubBackend, listing_json, location, token_for, user_json,
};

#[tokio::test]
async fn test_guarded_page_redirects_before_any_backend_call() {
    let backend = StubBackend::start().await;
    let console = Console::start(&backend).await;

    let response = console.get("/enquiries?status=new&page=2").await;

    assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_login_stores_credential_and_shows_dashboard() {
    let backend = StubBackend::start().await;
    backend.respond(
        Method::GET,
        "/api/enquiries/stats",
        StatusCode::OK,
        json!({"total": 7, "byStatus": [{"_id": "new", "count": 4}, {"_id": "closed", "count": 3}]}),
    );
    let console = Console::start(&backend).await;

    console.login_as(&backend, "admin").await;

    let login = backend.requests_to(&Method::POST, "/api/auth/login");
    assert_eq!(login.len(), 1);
    assert_eq!(
        login.first().and_then(|r| r.body.clone()),
        Some(json!({"email": "admin@example.com", "password": "secret"}))
    );

    let page = console.page("/dashboard").await;
    assert!(page.contains("Login successful!"));
    assert!(page.contains("Total Enquiries"));
    assert!(page.contains("Ada Admin"));

    let stats = backend.requests_to(&Method::GET, "/api/enquiries/stats");
    let expected = format!("Bearer {}", token_for("admin"));
    assert_eq!(
        stats.first().and_then(|r| r.authorization.as_deref()),
        Some(expected.as_str())
    );
}

#[tokio::test]
async fn test_rejected_login_shows_backend_message() {
    let backend = StubBackend::start().await;
    backend.respond(
        Method::POST,
        "/api/auth/login",
        StatusCode::UNAUTHORIZED,
        json!({"message": "Invalid credentials"}),
    );
    let console = Console::start(&backend).await;

    let response = console
        .post("/login", &[("email", "sam@example.com"), ("password", "wrong")])
        .await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Invalid credentials"));
    assert!(body.contains("value=\"sam@example.com\""));

    assert_eq!(location(&console.get("/dashboard").await), Some("/login"));
}

#[tokio::test]
async fn test_invalid_login_form_never_reaches_backend() {
    let backend = StubBackend::start().await;
    let console = Console::start(&backend).await;

    let response = console
        .post("/login", &[("email", "not-an-email"), ("password", "pw")])
        .await;

    let body = response.text().await.unwrap();
    assert!(body.contains("Please enter a valid email address"));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_register_signs_in() {
    let backend = StubBackend::start().await;
    backend.respond(
        Method::POST,
        "/api/auth/register",
        StatusCode::CREATED,
        json!({"token": token_for("user"), "user": user_json("u-new", "user")}),
    );
    let console = Console::start(&backend).await;

    let response = console
        .post(
            "/register",
            &[
                ("name", "Uma User"),
                ("email", "user@example.com"),
                ("password", "secret"),
            ],
        )
        .await;

    assert_eq!(location(&response), Some("/dashboard"));
    let register = backend.requests_to(&Method::POST, "/api/auth/register");
    assert_eq!(
        register.first().and_then(|r| r.body.clone()),
        Some(json!({"name": "Uma User", "email": "user@example.com", "password": "secret"}))
    );
    assert!(console.page("/dashboard").await.contains("Registration successful!"));
}

#[tokio::test]
async fn test_signed_in_user_skips_login_page() {
    let backend = StubBackend::start().await;
    let console = Console::start(&backend).await;
    console.login_as(&backend, "staff").await;

    assert_eq!(location(&console.get("/login").await), Some("/dashboard"));
    assert_eq!(location(&console.get("/register").await), Some("/dashboard"));
}

#[tokio::test]
async fn test_staff_cannot_open_admin_pages() {
    let backend = StubBackend::start().await;
    let console = Console::start(&backend).await;
    console.login_as(&backend, "staff").await;
    backend.reset_requests();

    let response = console.get("/users").await;
    assert_eq!(location(&response), Some("/dashboard"));
    assert!(backend.requests_to(&Method::GET, "/api/users").is_empty());

    let response = console.post("/enquiries/e1/delete", &[("confirm", "yes")]).await;
    assert_eq!(location(&response), Some("/dashboard"));
    assert!(backend.requests_to(&Method::DELETE, "/api/enquiries/e1").is_empty());

    let page = console.page("/dashboard").await;
    assert!(page.contains("You do not have permission to access that page"));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let backend = StubBackend::start().await;
    let console = Console::start(&backend).await;
    console.login_as(&backend, "staff").await;

    let response = console.post("/logout", &[]).await;
    assert_eq!(location(&response), Some("/login"));
    assert_eq!(location(&console.get("/enquiries").await), Some("/login"));
}

#[tokio::test]
async fn test_expired_credential_forces_login() {
    let backend = StubBackend::start().await;
    let console = Console::start(&backend).await;
    console.login_as(&backend, "staff").await;
    backend.respond(
        Method::GET,
        "/api/enquiries",
        StatusCode::UNAUTHORIZED,
        json!({"message": "Token expired"}),
    );

    let response = console.get("/enquiries").await;
    assert_eq!(location(&response), Some("/login"));

    let page = console.page("/login").await;
    assert!(page.contains("Session expired. Please log in again."));

    backend.respond(
        Method::GET,
        "/api/enquiries",
        StatusCode::OK,
        listing_json(vec![], 1, 0, 0),
    );
    assert_eq!(location(&console.get("/enquiries").await), Some("/login"));
}

#[tokio::test]
async fn test_sessions_are_per_browser() {
    let backend = StubBackend::start().await;
    let console = Console::start(&backend).await;
    console.login_as(&backend, "admin").await;

    let other = console.new_browser();
    assert_eq!(location(&other.get("/dashboard").await), Some("/login"));
}
