//! Console user accounts and authentication payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;
use super::status::Role;

/// A console user, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Successful login or registration: bearer credential plus identity.
#[derive(Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Body for `POST /api/users`.
#[derive(Clone, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password: String,
    pub role: Role,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// Body for `PUT /api/users/:id`. The password is only sent when changed.
#[derive(Clone, Serialize)]
pub struct UserUpdate {
    pub name: String,
    pub email: Email,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl std::fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserUpdate")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Response of `GET /api/users`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserList {
    pub users: Vec<User>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_update_omits_blank_password() {
        let update = UserUpdate {
            name: "Sam".to_string(),
            email: Email::parse("sam@example.com").unwrap(),
            role: Role::Staff,
            password: None,
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"name": "Sam", "email": "sam@example.com", "role": "staff"})
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let user = NewUser {
            name: "Sam".to_string(),
            email: Email::parse("sam@example.com").unwrap(),
            password: "hunter22".to_string(),
            role: Role::Admin,
        };
        assert!(!format!("{user:?}").contains("hunter22"));

        let auth: AuthResponse = serde_json::from_value(json!({
            "token": "jwt.secret.value",
            "user": {"_id": "u1", "name": "Sam", "email": "sam@example.com", "role": "admin"}
        }))
        .unwrap();
        assert!(!format!("{auth:?}").contains("jwt.secret.value"));
        assert_eq!(auth.user.role, Role::Admin);
    }
}
