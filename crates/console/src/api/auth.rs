//! Authentication endpoints.

use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use enquiry_desk_core::{AuthResponse, Email};

use super::{ApiError, BackendClient};

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

impl BackendClient {
    /// Exchange credentials for a bearer token and identity.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for bad credentials, or any other normalized
    /// backend failure.
    #[instrument(skip(self, email, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<AuthResponse, ApiError> {
        let body = LoginBody {
            email: email.as_str(),
            password,
        };
        Self::send_json(self.request(Method::POST, "/api/auth/login", None).json(&body)).await
    }

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when the backend rejects the fields.
    #[instrument(skip(self, email, password), fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &Email,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let body = RegisterBody {
            name,
            email: email.as_str(),
            password,
        };
        Self::send_json(self.request(Method::POST, "/api/auth/register", None).json(&body)).await
    }
}
