//! User management endpoints.

use reqwest::Method;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;

use enquiry_desk_core::{NewUser, User, UserFilter, UserId, UserList, UserUpdate};

use super::{ApiError, BackendClient, segment};

/// Single-user responses may come bare or wrapped as `{ "user": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserBody {
    Wrapped { user: User },
    Bare(User),
}

/// The staff list may come as a bare array or as `{ "users": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum StaffBody {
    Wrapped(UserList),
    Bare(Vec<User>),
}

impl BackendClient {
    /// List users matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` for non-admin credentials.
    #[instrument(skip(self, token))]
    pub async fn list_users(
        &self,
        token: &SecretString,
        filter: &UserFilter,
    ) -> Result<Vec<User>, ApiError> {
        let builder = self
            .request(Method::GET, "/api/users", Some(token))
            .query(&filter.to_api_params());
        let list: UserList = Self::send_json(builder).await?;
        Ok(list.users)
    }

    /// Fetch a single user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    #[instrument(skip(self, token), fields(user_id = %id))]
    pub async fn get_user(&self, token: &SecretString, id: &UserId) -> Result<User, ApiError> {
        let path = format!("/api/users/{}", segment(id.as_str()));
        let body: UserBody = Self::send_json(self.request(Method::GET, &path, Some(token))).await?;
        Ok(match body {
            UserBody::Wrapped { user } | UserBody::Bare(user) => user,
        })
    }

    /// Create a user account.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when the backend rejects the fields.
    #[instrument(skip(self, token, user), fields(email = %user.email))]
    pub async fn create_user(&self, token: &SecretString, user: &NewUser) -> Result<(), ApiError> {
        Self::send_empty(self.request(Method::POST, "/api/users", Some(token)).json(user)).await
    }

    /// Update a user account. The password is only sent when present.
    ///
    /// # Errors
    ///
    /// Returns `Validation` or `NotFound` as reported by the backend.
    #[instrument(skip(self, token, update), fields(user_id = %id))]
    pub async fn update_user(
        &self,
        token: &SecretString,
        id: &UserId,
        update: &UserUpdate,
    ) -> Result<(), ApiError> {
        let path = format!("/api/users/{}", segment(id.as_str()));
        Self::send_empty(self.request(Method::PUT, &path, Some(token)).json(update)).await
    }

    /// Delete a user account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `Forbidden` as reported by the backend.
    #[instrument(skip(self, token), fields(user_id = %id))]
    pub async fn delete_user(&self, token: &SecretString, id: &UserId) -> Result<(), ApiError> {
        let path = format!("/api/users/{}", segment(id.as_str()));
        Self::send_empty(self.request(Method::DELETE, &path, Some(token))).await
    }

    /// Users that enquiries can be assigned to.
    ///
    /// # Errors
    ///
    /// Returns a normalized backend failure.
    #[instrument(skip(self, token))]
    pub async fn list_staff(&self, token: &SecretString) -> Result<Vec<User>, ApiError> {
        let body: StaffBody =
            Self::send_json(self.request(Method::GET, "/api/users/staff", Some(token))).await?;
        Ok(match body {
            StaffBody::Wrapped(list) => list.users,
            StaffBody::Bare(users) => users,
        })
    }
}
