//! HTTP route handlers for the console.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//!
//! # Public
//! GET  /login, POST /login          - Sign in
//! GET  /register, POST /register    - Create an account
//! POST /logout                      - Sign out
//! GET  /contact, POST /contact      - Public enquiry form
//!
//! # Any signed-in role
//! GET  /                            - Redirect to /dashboard
//! GET  /dashboard                   - Statistics
//! GET  /enquiries                   - List (search, status, page, limit, modal, id)
//! POST /enquiries                   - Create
//! POST /enquiries/{id}              - Update (payload shaped by role)
//!
//! # Admin only
//! GET  /enquiries/{id}/delete       - Delete confirmation
//! POST /enquiries/{id}/delete       - Delete (requires confirm=yes)
//! GET  /users                       - List (search, role, modal, id)
//! POST /users                       - Create
//! POST /users/{id}                  - Update
//! GET  /users/{id}/delete           - Delete confirmation
//! POST /users/{id}/delete           - Delete (requires confirm=yes)
//!
//! # Notifications
//! POST /notifications/{id}/dismiss  - Dismiss a toast
//! ```

pub mod auth;
pub mod contact;
pub mod dashboard;
pub mod enquiries;
pub mod notifications;
pub mod users;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};

use crate::components::Badge;
use crate::filters;
use crate::models::CurrentUser;
use crate::notifications::Toast;
use crate::state::AppState;

/// Build the console routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Public
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/contact", get(contact::page).post(contact::submit))
        // Signed in
        .route("/", get(root))
        .route("/dashboard", get(dashboard::index))
        .route("/enquiries", get(enquiries::index).post(enquiries::create))
        .route("/enquiries/{id}", post(enquiries::update))
        .route(
            "/enquiries/{id}/delete",
            get(enquiries::confirm_delete).post(enquiries::delete),
        )
        // Admin
        .route("/users", get(users::index).post(users::create))
        .route("/users/{id}", post(users::update))
        .route(
            "/users/{id}/delete",
            get(users::confirm_delete).post(users::delete),
        )
        // Notifications
        .route(
            "/notifications/{id}/dismiss",
            post(notifications::dismiss),
        )
        .fallback(root)
}

/// `/` and unknown paths land on the dashboard (which is itself guarded).
async fn root() -> Redirect {
    Redirect::to("/dashboard")
}

/// Signed-in user view for the layout header and sidebar.
#[derive(Debug, Clone)]
pub struct ShellView {
    pub name: String,
    pub email: String,
    pub role: Badge,
    pub is_admin: bool,
    /// Sidebar section to highlight.
    pub current_path: &'static str,
}

impl ShellView {
    #[must_use]
    pub fn new(user: &CurrentUser, current_path: &'static str) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.to_string(),
            role: Badge::from(user.role),
            is_admin: user.is_admin(),
            current_path,
        }
    }
}

/// Delete confirmation page shared by enquiries and users.
#[derive(Template, WebTemplate)]
#[template(path = "confirm_delete.html")]
pub struct ConfirmDeleteTemplate {
    pub shell: ShellView,
    pub toasts: Vec<Toast>,
    pub back: String,
    pub title: &'static str,
    pub prompt: String,
    /// Form target; the form posts `confirm=yes`.
    pub action: String,
    pub cancel_href: String,
}

/// Append extra query pairs to a path that may already carry a query.
#[must_use]
pub fn with_params(path: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let extra = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{extra}")
}

/// `path` followed by an already-encoded query, if any.
#[must_use]
pub fn with_query(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

/// Redirect to `canonical` when the requested URL differs from it, so list
/// URLs never carry empty or default values.
#[must_use]
pub fn redirect_unless_canonical(path: &str, query: &str, canonical: &str) -> Option<Redirect> {
    (with_query(path, query) != canonical).then(|| Redirect::to(canonical))
}

/// Value of a single query parameter.
#[must_use]
pub fn query_param(query: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_params() {
        assert_eq!(with_params("/enquiries", &[]), "/enquiries");
        assert_eq!(
            with_params("/enquiries", &[("modal", "create")]),
            "/enquiries?modal=create"
        );
        assert_eq!(
            with_params("/enquiries?status=new", &[("modal", "edit"), ("id", "e 1")]),
            "/enquiries?status=new&modal=edit&id=e+1"
        );
    }

    #[test]
    fn test_with_query() {
        assert_eq!(with_query("/users/u1", ""), "/users/u1");
        assert_eq!(with_query("/users/u1", "role=staff"), "/users/u1?role=staff");
    }

    #[test]
    fn test_redirect_unless_canonical() {
        assert!(redirect_unless_canonical("/enquiries", "", "/enquiries").is_none());
        assert!(
            redirect_unless_canonical("/enquiries", "status=new", "/enquiries?status=new")
                .is_none()
        );
        assert!(
            redirect_unless_canonical("/enquiries", "search=&status=&limit=10", "/enquiries")
                .is_some()
        );
    }

    #[test]
    fn test_query_param() {
        assert_eq!(
            query_param("modal=edit&id=abc", "id"),
            Some("abc".to_string())
        );
        assert_eq!(query_param("modal=&id=abc", "modal"), None);
        assert_eq!(query_param("", "modal"), None);
    }
}
