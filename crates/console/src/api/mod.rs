//! Gateway to the enquiry backend REST API.
//!
//! One method per backend action. Every call attaches the bearer credential
//! when one is supplied and normalizes failures into [`ApiError`], so callers
//! never see transport-level error shapes.
//!
//! # API Reference
//!
//! - Base URL: `ENQUIRY_API_URL` (e.g. `http://localhost:5000`)
//! - Authentication: `Authorization: Bearer <token>` from `POST /api/auth/login`
//! - Error bodies: JSON `{ "message": "..." }` or `{ "error": "..." }`

mod auth;
mod enquiries;
mod users;

use std::fmt;
use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::ApiConfig;

/// Category of a failed backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// 400 or 422: the backend rejected the input.
    Validation,
    /// 401: missing, invalid or expired credential.
    Unauthorized,
    /// 403: authenticated but not allowed.
    Forbidden,
    /// 404: the record does not exist.
    NotFound,
    /// Any other non-2xx response.
    Server,
    /// Connection failure or an undecodable response.
    Transport,
}

impl ApiErrorKind {
    /// Classify a non-success HTTP status.
    #[must_use]
    pub const fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            400 | 422 => Self::Validation,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            _ => Self::Server,
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validation => "validation error",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not found",
            Self::Server => "server error",
            Self::Transport => "transport error",
        })
    }
}

/// Normalized failure of a backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {}", .message.as_deref().unwrap_or("no message"))]
pub struct ApiError {
    kind: ApiErrorKind,
    message: Option<String>,
}

impl ApiError {
    #[must_use]
    pub const fn new(kind: ApiErrorKind, message: Option<String>) -> Self {
        Self { kind, message }
    }

    /// Whether the credential was rejected, i.e. the session has expired.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }

    /// The backend message when present, else `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }

    fn transport(error: &reqwest::Error) -> Self {
        tracing::warn!(error = %error, "backend request failed");
        Self::new(ApiErrorKind::Transport, None)
    }
}

/// Pull a human-readable message out of a JSON error body:
/// `message` first, then `error`.
#[must_use]
pub fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"].iter().find_map(|key| {
        value
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(ToOwned::to_owned)
    })
}

/// Client for the enquiry backend.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Base URL every path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Start a request to `path`, attaching the bearer credential if given.
    fn request(&self, method: Method, path: &str, token: Option<&SecretString>) -> RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        let builder = self.inner.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and decode a JSON success body.
    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::send(builder).await?;
        response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to decode backend response");
            ApiError::new(ApiErrorKind::Transport, None)
        })
    }

    /// Send a request whose success body is not needed.
    async fn send_empty(builder: RequestBuilder) -> Result<(), ApiError> {
        Self::send(builder).await.map(drop)
    }

    async fn send(builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = builder.send().await.map_err(|e| ApiError::transport(&e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(Self::parse_error(response).await)
    }

    /// Normalize a non-success response.
    async fn parse_error(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let kind = ApiErrorKind::from_status(status);
        let message = response
            .text()
            .await
            .ok()
            .and_then(|body| extract_message(&body));

        tracing::debug!(status = status.as_u16(), %kind, "backend returned error");
        ApiError::new(kind, message)
    }
}

impl fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

/// Percent-encode an ID for use as a single path segment.
fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            ApiErrorKind::from_status(StatusCode::BAD_REQUEST),
            ApiErrorKind::Validation
        );
        assert_eq!(
            ApiErrorKind::from_status(StatusCode::UNPROCESSABLE_ENTITY),
            ApiErrorKind::Validation
        );
        assert_eq!(
            ApiErrorKind::from_status(StatusCode::UNAUTHORIZED),
            ApiErrorKind::Unauthorized
        );
        assert_eq!(
            ApiErrorKind::from_status(StatusCode::FORBIDDEN),
            ApiErrorKind::Forbidden
        );
        assert_eq!(
            ApiErrorKind::from_status(StatusCode::NOT_FOUND),
            ApiErrorKind::NotFound
        );
        assert_eq!(
            ApiErrorKind::from_status(StatusCode::BAD_GATEWAY),
            ApiErrorKind::Server
        );
    }

    #[test]
    fn test_extract_message_prefers_message() {
        assert_eq!(
            extract_message(r#"{"message":"Invalid credentials","error":"x"}"#),
            Some("Invalid credentials".to_string())
        );
        assert_eq!(
            extract_message(r#"{"error":"Email already in use"}"#),
            Some("Email already in use".to_string())
        );
        assert_eq!(extract_message(r#"{"message":"  "}"#), None);
        assert_eq!(extract_message("<html>Bad Gateway</html>"), None);
        assert_eq!(extract_message(r#"{"message":42}"#), None);
    }

    #[test]
    fn test_user_message_fallback() {
        let err = ApiError::new(ApiErrorKind::Server, None);
        assert_eq!(err.user_message("Login failed"), "Login failed");
        assert_eq!(err.to_string(), "server error: no message");

        let err = ApiError::new(ApiErrorKind::Validation, Some("Name is required".to_string()));
        assert_eq!(err.user_message("Login failed"), "Name is required");
        assert!(!err.is_unauthorized());
        assert!(ApiError::new(ApiErrorKind::Unauthorized, None).is_unauthorized());
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("65f1a2b3"), "65f1a2b3");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BackendClient::new(&ApiConfig::new("http://localhost:5000/").unwrap()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
