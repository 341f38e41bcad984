//! Authentication route handlers.
//!
//! Login and registration exchange credentials with the backend for a bearer
//! token, which is kept server-side in the session; the browser only holds
//! the HTTP-only session cookie.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::error::{AppError, set_sentry_user};
use crate::filters;
use crate::forms::{LoginForm, RegisterForm};
use crate::middleware::Visitor;
use crate::middleware::auth::{end_session, start_session};
use crate::models::ChannelId;
use crate::notifications::Toast;
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub toasts: Vec<Toast>,
    pub back: String,
    pub email: String,
}

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub toasts: Vec<Toast>,
    pub back: String,
    pub name: String,
    pub email: String,
}

fn login_template(state: &AppState, channel: ChannelId, email: &str) -> LoginTemplate {
    LoginTemplate {
        toasts: state.notifier().display(channel),
        back: "/login".to_string(),
        email: email.to_string(),
    }
}

fn register_template(
    state: &AppState,
    channel: ChannelId,
    name: &str,
    email: &str,
) -> RegisterTemplate {
    RegisterTemplate {
        toasts: state.notifier().display(channel),
        back: "/register".to_string(),
        name: name.to_string(),
        email: email.to_string(),
    }
}

/// Render the login page.
///
/// GET /login
#[instrument(skip(state, visitor))]
pub async fn login_page(State(state): State<AppState>, visitor: Visitor) -> Response {
    if visitor.user.is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    login_template(&state, visitor.channel, "").into_response()
}

/// Sign in with email and password.
///
/// POST /login
#[instrument(skip(state, visitor, form))]
pub async fn login(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let (email, password) = match form.validate() {
        Ok(valid) => valid,
        Err(e) => {
            state.notifier().error(visitor.channel, e.to_string());
            return Ok(login_template(&state, visitor.channel, &form.email).into_response());
        }
    };

    match state.api().login(&email, password).await {
        Ok(auth) => {
            let user = start_session(&visitor.session, &auth).await?;
            set_sentry_user(user.id.as_str(), Some(user.email.as_str()));
            tracing::info!(user_id = %user.id, role = %user.role, "user signed in");
            state
                .notifier()
                .success(visitor.channel, "Login successful!");
            Ok(Redirect::to("/dashboard").into_response())
        }
        Err(e) => {
            tracing::info!(error = %e, "login rejected");
            state
                .notifier()
                .error(visitor.channel, e.user_message("Login failed"));
            Ok(login_template(&state, visitor.channel, email.as_str()).into_response())
        }
    }
}

/// Render the registration page.
///
/// GET /register
#[instrument(skip(state, visitor))]
pub async fn register_page(State(state): State<AppState>, visitor: Visitor) -> Response {
    if visitor.user.is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    register_template(&state, visitor.channel, "", "").into_response()
}

/// Create an account and sign it in.
///
/// POST /register
#[instrument(skip(state, visitor, form))]
pub async fn register(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let (name, email, password) = match form.validate() {
        Ok(valid) => valid,
        Err(e) => {
            state.notifier().error(visitor.channel, e.to_string());
            return Ok(
                register_template(&state, visitor.channel, &form.name, &form.email)
                    .into_response(),
            );
        }
    };

    match state.api().register(name, &email, password).await {
        Ok(auth) => {
            let user = start_session(&visitor.session, &auth).await?;
            set_sentry_user(user.id.as_str(), Some(user.email.as_str()));
            tracing::info!(user_id = %user.id, "user registered");
            state
                .notifier()
                .success(visitor.channel, "Registration successful!");
            Ok(Redirect::to("/dashboard").into_response())
        }
        Err(e) => {
            tracing::info!(error = %e, "registration rejected");
            state
                .notifier()
                .error(visitor.channel, e.user_message("Registration failed"));
            Ok(register_template(&state, visitor.channel, name, email.as_str()).into_response())
        }
    }
}

/// Logout and clear session.
///
/// POST /logout
#[instrument(skip(state, visitor))]
pub async fn logout(State(state): State<AppState>, visitor: Visitor) -> Result<Redirect, AppError> {
    end_session(&visitor.session).await?;
    state.forget_channel(visitor.channel);
    sentry::configure_scope(|scope| scope.set_user(None));
    Ok(Redirect::to("/login"))
}
