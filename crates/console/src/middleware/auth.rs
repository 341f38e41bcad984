//! Route guard and session extractors for the console.
//!
//! The guard decides before any handler body runs: unauthenticated requests
//! are redirected to `/login`, authenticated requests with the wrong role are
//! redirected to `/dashboard` with an error toast.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use tower_sessions::Session;

use enquiry_desk_core::{AuthResponse, Role};

use crate::api::ApiError;
use crate::error::AppError;
use crate::models::{ChannelId, CurrentUser, session_keys};
use crate::state::AppState;

/// Message shown when a role check fails.
pub const NOT_PERMITTED_MESSAGE: &str = "You do not have permission to access that page";

/// Message shown when the backend rejects the stored credential.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// No identity: go to the login page.
    Login,
    /// Identity present but role not in the allowed set.
    NotPermitted,
}

/// Decide access for `user`. The role check only applies when `allowed` is
/// supplied.
#[must_use]
pub fn evaluate(user: Option<&CurrentUser>, allowed: Option<&[Role]>) -> Access {
    match (user, allowed) {
        (None, _) => Access::Login,
        (Some(user), Some(roles)) if !roles.contains(&user.role) => Access::NotPermitted,
        (Some(_), _) => Access::Granted,
    }
}

/// Authenticated request context handed to guarded handlers.
pub struct AuthContext {
    pub user: CurrentUser,
    pub token: SecretString,
    pub session: Session,
    pub channel: ChannelId,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

impl AuthContext {
    /// Turn a failed backend call into user feedback.
    ///
    /// An `Unauthorized` failure ends the session and yields a redirect to
    /// `/login`; any other failure publishes an error toast (backend message
    /// or `fallback`) and yields `None` so the caller can carry on.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn report(
        &self,
        state: &AppState,
        error: &ApiError,
        fallback: &str,
    ) -> Result<Option<Redirect>, AppError> {
        if error.is_unauthorized() {
            return self.expire(state).await.map(Some);
        }
        tracing::warn!(error = %error, user_id = %self.user.id, "backend call failed");
        state
            .notifier()
            .error(self.channel, error.user_message(fallback));
        Ok(None)
    }

    /// Clear the session after the backend rejected the credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn expire(&self, state: &AppState) -> Result<Redirect, AppError> {
        tracing::info!(user_id = %self.user.id, "backend rejected credential, ending session");
        end_session(&self.session).await?;
        state.forget_channel(self.channel);
        state.notifier().error(self.channel, SESSION_EXPIRED_MESSAGE);
        Ok(Redirect::to("/login"))
    }

    /// Publish a success toast to this session.
    pub fn success(&self, state: &AppState, message: &str) {
        state.notifier().success(self.channel, message);
    }

    /// Publish an error toast to this session.
    pub fn error(&self, state: &AppState, message: &str) {
        state.notifier().error(self.channel, message);
    }
}

/// Extractor that requires authentication (any role).
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(ctx): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", ctx.user.name)
/// }
/// ```
pub struct RequireAuth(pub AuthContext);

/// Extractor that requires an authenticated admin.
pub struct RequireAdmin(pub AuthContext);

/// Error returned when the guard denies a request.
#[derive(Debug)]
pub enum GuardRejection {
    /// Redirect to the login page.
    RedirectToLogin,
    /// Redirect to the dashboard (an error toast has been queued).
    NotPermitted,
    /// Session layer missing or session store failure.
    Session(AppError),
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::NotPermitted => Redirect::to("/dashboard").into_response(),
            Self::Session(err) => err.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = GuardRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        guard(parts, state, None).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = GuardRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        guard(parts, state, Some(&[Role::Admin])).await.map(Self)
    }
}

async fn guard(
    parts: &Parts,
    state: &AppState,
    allowed: Option<&[Role]>,
) -> Result<AuthContext, GuardRejection> {
    let session = session_from_parts(parts).map_err(GuardRejection::Session)?;
    let user = current_user(&session).await;

    match evaluate(user.as_ref(), allowed) {
        Access::Login => return Err(GuardRejection::RedirectToLogin),
        Access::NotPermitted => {
            let channel = channel_id(&session)
                .await
                .map_err(|e| GuardRejection::Session(e.into()))?;
            tracing::info!(path = %parts.uri.path(), "role check failed");
            state.notifier().error(channel, NOT_PERMITTED_MESSAGE);
            return Err(GuardRejection::NotPermitted);
        }
        Access::Granted => {}
    }

    let (Some(user), Some(token)) = (user, bearer_token(&session).await) else {
        return Err(GuardRejection::RedirectToLogin);
    };
    let channel = channel_id(&session)
        .await
        .map_err(|e| GuardRejection::Session(e.into()))?;

    Ok(AuthContext {
        user,
        token,
        session,
        channel,
    })
}

/// Extractor for public pages: session, channel, and the identity if any.
pub struct Visitor {
    pub session: Session,
    pub channel: ChannelId,
    pub user: Option<CurrentUser>,
}

impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts)?;
        let channel = channel_id(&session).await?;
        let user = current_user(&session).await;
        Ok(Self {
            session,
            channel,
            user,
        })
    }
}

fn session_from_parts(parts: &Parts) -> Result<Session, AppError> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Internal("session layer not installed".to_string()))
}

async fn current_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

async fn bearer_token(session: &Session) -> Option<SecretString> {
    session
        .get::<String>(session_keys::TOKEN)
        .await
        .ok()
        .flatten()
        .map(SecretString::from)
}

/// This browser session's channel, created on first use.
///
/// # Errors
///
/// Returns an error if the session cannot be read or modified.
pub async fn channel_id(session: &Session) -> Result<ChannelId, tower_sessions::session::Error> {
    if let Some(channel) = session.get::<ChannelId>(session_keys::CHANNEL).await? {
        return Ok(channel);
    }
    let channel = ChannelId::new();
    session.insert(session_keys::CHANNEL, channel).await?;
    Ok(channel)
}

/// Store identity and credential after a successful login or registration.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn start_session(
    session: &Session,
    auth: &AuthResponse,
) -> Result<CurrentUser, tower_sessions::session::Error> {
    session.cycle_id().await?;
    let user = CurrentUser::from(&auth.user);
    session.insert(session_keys::CURRENT_USER, &user).await?;
    session.insert(session_keys::TOKEN, &auth.token).await?;
    Ok(user)
}

/// Remove identity and credential (logout or expiry). The notification
/// channel survives so the next page can still show feedback.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn end_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session.remove::<String>(session_keys::TOKEN).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use enquiry_desk_core::{Email, UserId};

    use super::*;
    use crate::middleware::session::session_store;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new("u1"),
            email: Email::parse("sam@example.com").unwrap(),
            name: "Sam".to_string(),
            role,
        }
    }

    #[test]
    fn test_unauthenticated_goes_to_login() {
        assert_eq!(evaluate(None, None), Access::Login);
        assert_eq!(evaluate(None, Some(&[Role::Admin])), Access::Login);
    }

    #[test]
    fn test_role_check_only_when_roles_given() {
        let staff = user(Role::Staff);
        assert_eq!(evaluate(Some(&staff), None), Access::Granted);
        assert_eq!(
            evaluate(Some(&staff), Some(&[Role::Admin])),
            Access::NotPermitted
        );
        assert_eq!(
            evaluate(Some(&staff), Some(&[Role::Admin, Role::Staff])),
            Access::Granted
        );
        assert_eq!(
            evaluate(Some(&user(Role::Admin)), Some(&[Role::Admin])),
            Access::Granted
        );
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let session = Session::new(None, Arc::new(session_store()), None);
        let auth: AuthResponse = serde_json::from_value(serde_json::json!({
            "token": "jwt-token",
            "user": {"_id": "u1", "name": "Sam", "email": "sam@example.com", "role": "staff"}
        }))
        .unwrap();

        let channel = channel_id(&session).await.unwrap();
        let stored = start_session(&session, &auth).await.unwrap();
        assert_eq!(stored.role, Role::Staff);
        assert_eq!(current_user(&session).await, Some(stored));
        assert!(bearer_token(&session).await.is_some());

        end_session(&session).await.unwrap();
        assert_eq!(current_user(&session).await, None);
        assert!(bearer_token(&session).await.is_none());
        assert_eq!(channel_id(&session).await.unwrap(), channel);
    }
}
