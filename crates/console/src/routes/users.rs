//! User management (admin only).
//!
//! Same shape as the enquiry pages: a filtered list with create and edit
//! modals carried in the query string, and a separate delete confirmation.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, RawQuery, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use enquiry_desk_core::{Role, User, UserFilter, UserId};

use crate::components::{Badge, SelectOption, role_options};
use crate::error::AppError;
use crate::filters;
use crate::forms::{ConfirmForm, UserForm};
use crate::middleware::{AuthContext, RequireAdmin};
use crate::notifications::Toast;
use crate::routes::{
    ConfirmDeleteTemplate, ShellView, query_param, redirect_unless_canonical, with_params,
    with_query,
};
use crate::state::AppState;

/// User row in the list table.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Badge,
    pub created: String,
    pub edit_href: String,
    pub delete_href: String,
}

impl UserRow {
    fn new(user: &User, filter: &UserFilter) -> Self {
        let id = user.id.as_str();
        Self {
            id: id.to_string(),
            name: user.name.clone(),
            email: user.email.to_string(),
            role: Badge::from(user.role),
            created: user
                .created_at
                .map_or_else(|| "-".to_string(), |at| at.format("%b %-d, %Y").to_string()),
            edit_href: with_params(&filter.list_path(), &[("modal", "edit"), ("id", id)]),
            delete_href: with_query(
                &format!("/users/{}/delete", urlencoding::encode(id)),
                &filter.to_query(),
            ),
        }
    }
}

/// Create/edit user modal. The password field is always rendered empty.
#[derive(Debug, Clone)]
pub struct UserModalView {
    pub is_edit: bool,
    pub title: &'static str,
    pub action: String,
    pub close_href: String,
    pub name: String,
    pub email: String,
    pub role_options: Vec<SelectOption>,
}

impl UserModalView {
    fn new(filter: &UserFilter, id: Option<&UserId>, name: &str, email: &str, role: Option<Role>) -> Self {
        let (title, path) = match id {
            Some(id) => ("Edit User", format!("/users/{}", urlencoding::encode(id.as_str()))),
            None => ("Add User", "/users".to_string()),
        };
        Self {
            is_edit: id.is_some(),
            title,
            action: with_query(&path, &filter.to_query()),
            close_href: filter.list_path(),
            name: name.to_string(),
            email: email.to_string(),
            role_options: role_options(Some(role.unwrap_or(Role::Staff)), None),
        }
    }

    fn from_form(filter: &UserFilter, id: Option<&UserId>, form: &UserForm) -> Self {
        Self::new(filter, id, &form.name, &form.email, form.role.parse().ok())
    }
}

enum ModalRequest {
    /// `None` opens an empty form; `Some` re-renders a rejected submission.
    Create(Option<UserForm>),
    Edit { id: UserId, form: Option<UserForm> },
}

impl ModalRequest {
    fn from_query(query: &str) -> Option<Self> {
        match query_param(query, "modal")?.as_str() {
            "create" => Some(Self::Create(None)),
            "edit" => query_param(query, "id").map(|id| Self::Edit {
                id: UserId::from(id),
                form: None,
            }),
            _ => None,
        }
    }

    /// Query pairs that reopen this modal on top of the list URL.
    fn link_params(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::Create(_) => vec![("modal", "create")],
            Self::Edit { id, .. } => vec![("modal", "edit"), ("id", id.as_str())],
        }
    }
}

/// User list page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
pub struct UsersTemplate {
    pub shell: ShellView,
    pub toasts: Vec<Toast>,
    pub back: String,
    pub rows: Vec<UserRow>,
    pub load_failed: bool,
    pub search: String,
    pub role_options: Vec<SelectOption>,
    pub create_href: String,
    pub modal: Option<UserModalView>,
}

async fn render_index(
    state: &AppState,
    ctx: &AuthContext,
    filter: UserFilter,
    modal: Option<ModalRequest>,
) -> Result<Response, AppError> {
    let views = state.user_views();
    let ticket = views.begin(ctx.channel);

    let (users, load_failed) = match state.api().list_users(&ctx.token, &filter).await {
        Ok(users) => {
            views.commit(&ticket, users.clone());
            (Some(users), false)
        }
        Err(e) => {
            if let Some(redirect) = ctx.report(state, &e, "Failed to load users").await? {
                return Ok(redirect.into_response());
            }
            (views.last(ctx.channel), true)
        }
    };

    let modal = match modal {
        None => None,
        Some(ModalRequest::Create(None)) => {
            Some(UserModalView::new(&filter, None, "", "", None))
        }
        Some(ModalRequest::Create(Some(form))) => {
            Some(UserModalView::from_form(&filter, None, &form))
        }
        Some(ModalRequest::Edit { id, form: Some(form) }) => {
            Some(UserModalView::from_form(&filter, Some(&id), &form))
        }
        Some(ModalRequest::Edit { id, form: None }) => {
            let listed = users
                .as_ref()
                .and_then(|users| users.iter().find(|u| u.id == id).cloned());
            let user = match listed {
                Some(user) => Some(user),
                None => match state.api().get_user(&ctx.token, &id).await {
                    Ok(user) => Some(user),
                    Err(e) => {
                        if let Some(redirect) = ctx.report(state, &e, "User not found").await? {
                            return Ok(redirect.into_response());
                        }
                        None
                    }
                },
            };
            user.map(|user| {
                UserModalView::new(
                    &filter,
                    Some(&id),
                    &user.name,
                    user.email.as_str(),
                    Some(user.role),
                )
            })
        }
    };

    Ok(UsersTemplate {
        shell: ShellView::new(&ctx.user, "/users"),
        toasts: state.notifier().display(ctx.channel),
        back: filter.list_path(),
        rows: users
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|user| UserRow::new(user, &filter))
            .collect(),
        load_failed: load_failed && users.is_none(),
        search: filter.search().to_string(),
        role_options: role_options(filter.role(), Some("All Roles")),
        create_href: with_params(&filter.list_path(), &[("modal", "create")]),
        modal,
    }
    .into_response())
}

fn filter_from(query: Option<&str>) -> UserFilter {
    UserFilter::from_query(query.unwrap_or_default())
}

// =============================================================================
// Handlers
// =============================================================================

/// User list.
///
/// GET /users
#[instrument(skip(state, ctx), fields(user_id = %ctx.user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(ctx): RequireAdmin,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let query = query.unwrap_or_default();
    let filter = UserFilter::from_query(&query);
    let modal = ModalRequest::from_query(&query);

    let canonical = with_params(
        &filter.list_path(),
        &modal.as_ref().map(ModalRequest::link_params).unwrap_or_default(),
    );
    if let Some(redirect) = redirect_unless_canonical("/users", &query, &canonical) {
        return Ok(redirect.into_response());
    }

    render_index(&state, &ctx, filter, modal).await
}

/// Create a user.
///
/// POST /users
#[instrument(skip(state, ctx, form), fields(user_id = %ctx.user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(ctx): RequireAdmin,
    RawQuery(query): RawQuery,
    Form(form): Form<UserForm>,
) -> Result<Response, AppError> {
    let filter = filter_from(query.as_deref());

    let user = match form.to_new_user() {
        Ok(user) => user,
        Err(e) => {
            ctx.error(&state, &e.to_string());
            return render_index(&state, &ctx, filter, Some(ModalRequest::Create(Some(form)))).await;
        }
    };

    match state.api().create_user(&ctx.token, &user).await {
        Ok(()) => {
            tracing::info!(role = %user.role, "user created");
            ctx.success(&state, "User created successfully");
            Ok(Redirect::to(&filter.list_path()).into_response())
        }
        Err(e) => match ctx.report(&state, &e, "Failed to create user").await? {
            Some(redirect) => Ok(redirect.into_response()),
            None => {
                render_index(&state, &ctx, filter, Some(ModalRequest::Create(Some(form)))).await
            }
        },
    }
}

/// Update a user. A blank password keeps the current one.
///
/// POST /users/{id}
#[instrument(skip(state, ctx, form), fields(user_id = %ctx.user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(ctx): RequireAdmin,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
    Form(form): Form<UserForm>,
) -> Result<Response, AppError> {
    let filter = filter_from(query.as_deref());
    let id = UserId::new(id);

    let update = match form.to_update() {
        Ok(update) => update,
        Err(e) => {
            ctx.error(&state, &e.to_string());
            let modal = ModalRequest::Edit {
                id,
                form: Some(form),
            };
            return render_index(&state, &ctx, filter, Some(modal)).await;
        }
    };

    match state.api().update_user(&ctx.token, &id, &update).await {
        Ok(()) => {
            tracing::info!(target_user = %id, "user updated");
            ctx.success(&state, "User updated successfully");
            Ok(Redirect::to(&filter.list_path()).into_response())
        }
        Err(e) => match ctx.report(&state, &e, "Failed to update user").await? {
            Some(redirect) => Ok(redirect.into_response()),
            None => {
                let modal = ModalRequest::Edit {
                    id,
                    form: Some(form),
                };
                render_index(&state, &ctx, filter, Some(modal)).await
            }
        },
    }
}

/// Delete confirmation.
///
/// GET /users/{id}/delete
#[instrument(skip(state, ctx), fields(user_id = %ctx.user.id))]
pub async fn confirm_delete(
    State(state): State<AppState>,
    RequireAdmin(ctx): RequireAdmin,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let filter = filter_from(query.as_deref());
    let id = UserId::new(id);

    let user = match state.api().get_user(&ctx.token, &id).await {
        Ok(user) => user,
        Err(e) => {
            let redirect = ctx
                .report(&state, &e, "User not found")
                .await?
                .unwrap_or_else(|| Redirect::to(&filter.list_path()));
            return Ok(redirect.into_response());
        }
    };

    Ok(ConfirmDeleteTemplate {
        shell: ShellView::new(&ctx.user, "/users"),
        toasts: state.notifier().display(ctx.channel),
        back: filter.list_path(),
        title: "Delete User",
        prompt: format!("Are you sure you want to delete {}?", user.name),
        action: with_query(
            &format!("/users/{}/delete", urlencoding::encode(id.as_str())),
            &filter.to_query(),
        ),
        cancel_href: filter.list_path(),
    }
    .into_response())
}

/// Delete after explicit confirmation.
///
/// POST /users/{id}/delete
#[instrument(skip(state, ctx, form), fields(user_id = %ctx.user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(ctx): RequireAdmin,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
    Form(form): Form<ConfirmForm>,
) -> Result<Response, AppError> {
    let filter = filter_from(query.as_deref());
    if !form.confirmed() {
        return Ok(Redirect::to(&filter.list_path()).into_response());
    }
    let id = UserId::new(id);

    match state.api().delete_user(&ctx.token, &id).await {
        Ok(()) => {
            tracing::info!(target_user = %id, "user deleted");
            ctx.success(&state, "User deleted successfully");
        }
        Err(e) => {
            if let Some(redirect) = ctx.report(&state, &e, "Failed to delete user").await? {
                return Ok(redirect.into_response());
            }
        }
    }
    Ok(Redirect::to(&filter.list_path()).into_response())
}
