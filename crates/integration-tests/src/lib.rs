//! Integration test harness for the Enquiry Desk console.
//!
//! Each test starts a [`StubBackend`] (an axum server that records every
//! request and answers with canned JSON) and a [`Console`] pointed at it,
//! both on ephemeral ports, then drives the console over HTTP with a
//! cookie-keeping client that does not follow redirects.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p enquiry-desk-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use enquiry_desk_console::config::ConsoleConfig;
use enquiry_desk_console::state::AppState;

// =============================================================================
// Stub backend
// =============================================================================

/// One request as the backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<Value>,
    pub authorization: Option<String>,
}

impl RecordedRequest {
    /// Decoded value of a query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

#[derive(Default)]
struct StubInner {
    requests: Mutex<Vec<RecordedRequest>>,
    responses: Mutex<HashMap<(Method, String), (StatusCode, Value)>>,
}

/// In-process backend answering canned JSON per method and path.
///
/// Unconfigured routes answer `404 {"message": "Not found"}`.
#[derive(Clone)]
pub struct StubBackend {
    addr: SocketAddr,
    inner: Arc<StubInner>,
}

impl StubBackend {
    pub async fn start() -> Self {
        let inner = Arc::new(StubInner::default());
        let router = Router::new().fallback(record).with_state(Arc::clone(&inner));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Self { addr, inner }
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answer `method path` with `status` and `body` from now on.
    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        self.inner
            .responses
            .lock()
            .unwrap()
            .insert((method, path.to_string()), (status, body));
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.requests.lock().unwrap().clone()
    }

    /// Requests received for `method path`.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == *method && r.path == path)
            .collect()
    }

    /// Forget recorded requests.
    pub fn reset_requests(&self) {
        self.inner.requests.lock().unwrap().clear();
    }
}

async fn record(
    State(inner): State<Arc<StubInner>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    inner.requests.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        body: serde_json::from_slice(&body).ok(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let canned = inner.responses.lock().unwrap().get(&(method, path)).cloned();
    match canned {
        Some((status, body)) => (status, Json(body)).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "Not found"}))).into_response(),
    }
}

// =============================================================================
// Console under test
// =============================================================================

/// A running console plus a browser-like client for it.
pub struct Console {
    base_url: String,
    client: reqwest::Client,
}

impl Console {
    /// Start a console talking to `backend`.
    pub async fn start(backend: &StubBackend) -> Self {
        let config = ConsoleConfig::for_backend(&backend.url()).unwrap();
        let app = enquiry_desk_console::app(AppState::new(config).unwrap());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{addr}"),
            client: new_client(),
        }
    }

    /// Another browser against the same console, with its own cookies.
    #[must_use]
    pub fn new_browser(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            client: new_client(),
        }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .unwrap()
    }

    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.base_url))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// Fetch `path` and return the body, asserting a 200.
    pub async fn page(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK, "GET {path}");
        response.text().await.unwrap()
    }

    /// Sign in through the login form as a user with `role`.
    pub async fn login_as(&self, backend: &StubBackend, role: &str) {
        backend.respond(
            Method::POST,
            "/api/auth/login",
            StatusCode::OK,
            json!({"token": token_for(role), "user": user_json(&format!("u-{role}"), role)}),
        );
        let email = format!("{role}@example.com");
        let response = self
            .post("/login", &[("email", email.as_str()), ("password", "secret")])
            .await;
        assert_eq!(location(&response), Some("/dashboard"));
    }
}

fn new_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// `Location` header of a redirect.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

// =============================================================================
// Fixtures
// =============================================================================

/// Bearer credential the stub hands out for `role`.
#[must_use]
pub fn token_for(role: &str) -> String {
    format!("token-{role}")
}

#[must_use]
pub fn user_json(id: &str, role: &str) -> Value {
    let name = match role {
        "admin" => "Ada Admin",
        "staff" => "Sam Staff",
        _ => "Uma User",
    };
    json!({
        "_id": id,
        "name": name,
        "email": format!("{role}@example.com"),
        "role": role,
        "createdAt": "2024-01-15T10:00:00Z",
    })
}

#[must_use]
pub fn enquiry_json(id: &str, customer_name: &str, status: &str) -> Value {
    json!({
        "_id": id,
        "customerName": customer_name,
        "email": "jane@example.com",
        "phone": "1234567890",
        "message": "My order has not arrived",
        "priority": "medium",
        "status": status,
        "assignedTo": null,
        "createdAt": "2024-03-05T09:30:00Z",
    })
}

#[must_use]
pub fn listing_json(enquiries: Vec<Value>, page: u32, total: u64, pages: u32) -> Value {
    json!({
        "enquiries": enquiries,
        "pagination": {"page": page, "limit": 10, "total": total, "pages": pages},
    })
}
