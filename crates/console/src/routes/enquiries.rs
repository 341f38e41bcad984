//! Enquiry list, modals and mutations.
//!
//! The list page keeps its filter state in the query string. The create,
//! edit and view modals are part of the same page, opened with
//! `?modal=create|edit|view&id=...`, so a failed submission can re-render the
//! open modal with what the user entered.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, RawQuery, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use enquiry_desk_core::{Enquiry, EnquiryFilter, EnquiryId, EnquiryListing, Role, User};

use crate::components::{
    Badge, PaginationView, SelectOption, assignee_options, page_size_options, priority_options,
    status_options,
};
use crate::error::AppError;
use crate::filters;
use crate::forms::{ConfirmForm, EnquiryEditForm, EnquiryForm};
use crate::middleware::{AuthContext, RequireAdmin, RequireAuth};
use crate::notifications::Toast;
use crate::routes::{
    ConfirmDeleteTemplate, ShellView, query_param, redirect_unless_canonical, with_params,
    with_query,
};
use crate::state::AppState;

const MESSAGE_PREVIEW_CHARS: usize = 50;

// =============================================================================
// View Types
// =============================================================================

/// Enquiry row in the list table.
#[derive(Debug, Clone)]
pub struct EnquiryRow {
    pub id: String,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub message_preview: String,
    pub priority: Badge,
    pub status: Badge,
    pub assigned_to: String,
    pub created: String,
    pub view_href: String,
    pub edit_href: String,
    pub delete_href: String,
}

impl EnquiryRow {
    fn new(enquiry: &Enquiry, filter: &EnquiryFilter) -> Self {
        let list_path = filter.list_path();
        let id = enquiry.id.as_str();
        Self {
            id: id.to_string(),
            customer_name: enquiry.customer_name.clone(),
            email: enquiry.email.clone(),
            phone: enquiry.phone.clone(),
            message_preview: preview(&enquiry.message),
            priority: Badge::from(enquiry.priority),
            status: Badge::from(enquiry.status),
            assigned_to: enquiry.assignee_name().unwrap_or("-").to_string(),
            created: enquiry.created_at.format("%b %-d, %Y").to_string(),
            view_href: with_params(&list_path, &[("modal", "view"), ("id", id)]),
            edit_href: with_params(&list_path, &[("modal", "edit"), ("id", id)]),
            delete_href: with_filter(
                &format!("/enquiries/{}/delete", urlencoding::encode(id)),
                filter,
            ),
        }
    }
}

fn preview(message: &str) -> String {
    let mut chars = message.chars();
    let head: String = chars.by_ref().take(MESSAGE_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// `path` carrying the filter's query, for form targets outside the list.
fn with_filter(path: &str, filter: &EnquiryFilter) -> String {
    with_query(path, &filter.to_query())
}

/// Content of the open modal.
#[derive(Debug, Clone, Default)]
pub struct ModalView {
    pub is_create: bool,
    pub is_edit: bool,
    pub is_view: bool,
    pub title: &'static str,
    /// Form target; empty for the read-only view.
    pub action: String,
    pub close_href: String,
    /// Admins edit every field; other roles only status and message.
    pub full_edit: bool,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub status_options: Vec<SelectOption>,
    pub priority_options: Vec<SelectOption>,
    pub assignee_options: Vec<SelectOption>,
    pub status: Option<Badge>,
    pub priority: Option<Badge>,
    pub assigned_to: String,
    pub created: String,
}

impl ModalView {
    fn create(filter: &EnquiryFilter, form: &EnquiryForm) -> Self {
        Self {
            is_create: true,
            title: "Create Enquiry",
            action: with_filter("/enquiries", filter),
            close_href: filter.list_path(),
            full_edit: true,
            customer_name: form.customer_name.clone(),
            email: form.email.clone(),
            phone: form.phone.clone(),
            message: form.message.clone(),
            priority_options: priority_options(form.priority_or_default()),
            ..Self::default()
        }
    }

    fn edit(
        filter: &EnquiryFilter,
        id: &EnquiryId,
        form: &EnquiryEditForm,
        role: Role,
        staff: &[User],
    ) -> Self {
        let assignee = Some(form.assigned_to.as_str()).filter(|id| !id.is_empty());
        Self {
            is_edit: true,
            title: "Edit Enquiry",
            action: with_filter(
                &format!("/enquiries/{}", urlencoding::encode(id.as_str())),
                filter,
            ),
            close_href: filter.list_path(),
            full_edit: role.is_admin(),
            customer_name: form.customer_name.clone(),
            email: form.email.clone(),
            phone: form.phone.clone(),
            message: form.message.clone(),
            status_options: status_options(form.status.parse().ok(), None),
            priority_options: priority_options(form.priority.parse().unwrap_or_default()),
            assignee_options: assignee_options(staff, assignee),
            ..Self::default()
        }
    }

    fn view(filter: &EnquiryFilter, enquiry: &Enquiry) -> Self {
        Self {
            is_view: true,
            title: "Enquiry Details",
            close_href: filter.list_path(),
            customer_name: enquiry.customer_name.clone(),
            email: enquiry.email.clone(),
            phone: enquiry.phone.clone(),
            message: enquiry.message.clone(),
            status: Some(Badge::from(enquiry.status)),
            priority: Some(Badge::from(enquiry.priority)),
            assigned_to: enquiry.assignee_name().unwrap_or("Unassigned").to_string(),
            created: enquiry.created_at.format("%b %-d, %Y %H:%M").to_string(),
            ..Self::default()
        }
    }
}

impl From<&Enquiry> for EnquiryEditForm {
    fn from(enquiry: &Enquiry) -> Self {
        Self {
            customer_name: enquiry.customer_name.clone(),
            email: enquiry.email.clone(),
            phone: enquiry.phone.clone(),
            message: enquiry.message.clone(),
            status: enquiry.status.as_str().to_string(),
            priority: enquiry.priority.as_str().to_string(),
            assigned_to: enquiry
                .assignee_id()
                .map(|id| id.as_str().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Modal requested for a render.
enum ModalRequest {
    Create(EnquiryForm),
    /// `form` is `None` when opening the modal, `Some` when re-rendering a
    /// rejected submission.
    Edit {
        id: EnquiryId,
        form: Option<EnquiryEditForm>,
    },
    View(EnquiryId),
}

impl ModalRequest {
    fn from_query(query: &str) -> Option<Self> {
        let id = || query_param(query, "id").map(EnquiryId::from);
        match query_param(query, "modal")?.as_str() {
            "create" => Some(Self::Create(EnquiryForm::blank())),
            "edit" => id().map(|id| Self::Edit { id, form: None }),
            "view" => id().map(Self::View),
            _ => None,
        }
    }

    /// Query pairs that reopen this modal on top of the list URL.
    fn link_params(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::Create(_) => vec![("modal", "create")],
            Self::Edit { id, .. } => vec![("modal", "edit"), ("id", id.as_str())],
            Self::View(id) => vec![("modal", "view"), ("id", id.as_str())],
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Enquiry list page template.
#[derive(Template, WebTemplate)]
#[template(path = "enquiries/index.html")]
pub struct EnquiriesTemplate {
    pub shell: ShellView,
    pub toasts: Vec<Toast>,
    pub back: String,
    pub rows: Vec<EnquiryRow>,
    pub load_failed: bool,
    pub search: String,
    pub status_options: Vec<SelectOption>,
    pub page_size_options: Vec<SelectOption>,
    pub pagination: PaginationView,
    pub create_href: String,
    pub is_admin: bool,
    pub modal: Option<ModalView>,
}

// =============================================================================
// Rendering
// =============================================================================

enum Lookup {
    Found(Enquiry),
    Missing,
    Redirect(Redirect),
}

/// Find an enquiry on the current page, or fetch it.
async fn lookup(
    state: &AppState,
    ctx: &AuthContext,
    listing: Option<&EnquiryListing>,
    id: &EnquiryId,
) -> Result<Lookup, AppError> {
    if let Some(enquiry) = listing.and_then(|l| l.enquiries.iter().find(|e| e.id == *id)) {
        return Ok(Lookup::Found(enquiry.clone()));
    }
    match state.api().get_enquiry(&ctx.token, id).await {
        Ok(enquiry) => Ok(Lookup::Found(enquiry)),
        Err(e) => Ok(ctx
            .report(state, &e, "Enquiry not found")
            .await?
            .map_or(Lookup::Missing, Lookup::Redirect)),
    }
}

/// Assignable users for the admin edit modal. A failure only empties the
/// assignee select.
async fn assignable_staff(state: &AppState, ctx: &AuthContext) -> Vec<User> {
    if !ctx.user.is_admin() {
        return Vec::new();
    }
    state
        .api()
        .list_staff(&ctx.token)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load staff for assignment");
            Vec::new()
        })
}

async fn render_index(
    state: &AppState,
    ctx: &AuthContext,
    filter: EnquiryFilter,
    modal: Option<ModalRequest>,
) -> Result<Response, AppError> {
    let views = state.enquiry_views();
    let ticket = views.begin(ctx.channel);

    let (listing, load_failed) = match state.api().list_enquiries(&ctx.token, &filter).await {
        Ok(listing) => {
            views.commit(&ticket, listing.clone());
            (Some(listing), false)
        }
        Err(e) => {
            if let Some(redirect) = ctx.report(state, &e, "Failed to load enquiries").await? {
                return Ok(redirect.into_response());
            }
            (views.last(ctx.channel), true)
        }
    };

    let modal = match modal {
        None => None,
        Some(ModalRequest::Create(form)) => Some(ModalView::create(&filter, &form)),
        Some(ModalRequest::View(id)) => match lookup(state, ctx, listing.as_ref(), &id).await? {
            Lookup::Found(enquiry) => Some(ModalView::view(&filter, &enquiry)),
            Lookup::Missing => None,
            Lookup::Redirect(redirect) => return Ok(redirect.into_response()),
        },
        Some(ModalRequest::Edit { id, form }) => {
            let form = match form {
                Some(form) => Some(form),
                None => match lookup(state, ctx, listing.as_ref(), &id).await? {
                    Lookup::Found(enquiry) => Some(EnquiryEditForm::from(&enquiry)),
                    Lookup::Missing => None,
                    Lookup::Redirect(redirect) => return Ok(redirect.into_response()),
                },
            };
            match form {
                Some(form) => {
                    let staff = assignable_staff(state, ctx).await;
                    Some(ModalView::edit(&filter, &id, &form, ctx.user.role, &staff))
                }
                None => None,
            }
        }
    };

    let rows = listing
        .as_ref()
        .map(|l| l.enquiries.iter().map(|e| EnquiryRow::new(e, &filter)).collect())
        .unwrap_or_default();
    let pagination = listing
        .as_ref()
        .map(|l| PaginationView::new(&l.pagination, &filter))
        .unwrap_or_default();

    Ok(EnquiriesTemplate {
        shell: ShellView::new(&ctx.user, "/enquiries"),
        toasts: state.notifier().display(ctx.channel),
        back: filter.list_path(),
        rows,
        load_failed: load_failed && listing.is_none(),
        search: filter.search().to_string(),
        status_options: status_options(filter.status(), Some("All Statuses")),
        page_size_options: page_size_options(filter.limit()),
        pagination,
        create_href: with_params(&filter.list_path(), &[("modal", "create")]),
        is_admin: ctx.user.is_admin(),
        modal,
    }
    .into_response())
}

fn filter_from(query: Option<&str>) -> EnquiryFilter {
    EnquiryFilter::from_query(query.unwrap_or_default())
}

// =============================================================================
// Handlers
// =============================================================================

/// Enquiry list with filters, pagination and the open modal.
///
/// GET /enquiries
#[instrument(skip(state, ctx), fields(user_id = %ctx.user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let query = query.unwrap_or_default();
    let filter = EnquiryFilter::from_query(&query);
    let modal = ModalRequest::from_query(&query);

    let canonical = with_params(
        &filter.list_path(),
        &modal.as_ref().map(ModalRequest::link_params).unwrap_or_default(),
    );
    if let Some(redirect) = redirect_unless_canonical("/enquiries", &query, &canonical) {
        return Ok(redirect.into_response());
    }

    render_index(&state, &ctx, filter, modal).await
}

/// Create an enquiry from the create modal.
///
/// POST /enquiries
#[instrument(skip(state, ctx, form), fields(user_id = %ctx.user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    RawQuery(query): RawQuery,
    Form(form): Form<EnquiryForm>,
) -> Result<Response, AppError> {
    let filter = filter_from(query.as_deref());

    let enquiry = match form.validate() {
        Ok(enquiry) => enquiry,
        Err(e) => {
            ctx.error(&state, &e.to_string());
            return render_index(&state, &ctx, filter, Some(ModalRequest::Create(form))).await;
        }
    };

    match state.api().create_enquiry(&ctx.token, &enquiry).await {
        Ok(()) => {
            tracing::info!(priority = %enquiry.priority, "enquiry created");
            ctx.success(&state, "Enquiry created successfully");
            Ok(Redirect::to(&filter.list_path()).into_response())
        }
        Err(e) => match ctx.report(&state, &e, "Failed to create enquiry").await? {
            Some(redirect) => Ok(redirect.into_response()),
            None => render_index(&state, &ctx, filter, Some(ModalRequest::Create(form))).await,
        },
    }
}

/// Save the edit modal. The payload depends on the user's role.
///
/// POST /enquiries/{id}
#[instrument(skip(state, ctx, form), fields(user_id = %ctx.user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
    Form(form): Form<EnquiryEditForm>,
) -> Result<Response, AppError> {
    let filter = filter_from(query.as_deref());
    let id = EnquiryId::new(id);

    let update = match form.to_update(ctx.user.role) {
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

    match state.api().update_enquiry(&ctx.token, &id, &update).await {
        Ok(()) => {
            tracing::info!(enquiry_id = %id, "enquiry updated");
            ctx.success(&state, "Enquiry updated successfully");
            Ok(Redirect::to(&filter.list_path()).into_response())
        }
        Err(e) => match ctx.report(&state, &e, "Failed to update enquiry").await? {
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
/// GET /enquiries/{id}/delete
#[instrument(skip(state, ctx), fields(user_id = %ctx.user.id))]
pub async fn confirm_delete(
    State(state): State<AppState>,
    RequireAdmin(ctx): RequireAdmin,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let filter = filter_from(query.as_deref());
    let id = EnquiryId::new(id);

    let enquiry = match state.api().get_enquiry(&ctx.token, &id).await {
        Ok(enquiry) => enquiry,
        Err(e) => {
            let redirect = ctx
                .report(&state, &e, "Enquiry not found")
                .await?
                .unwrap_or_else(|| Redirect::to(&filter.list_path()));
            return Ok(redirect.into_response());
        }
    };

    Ok(ConfirmDeleteTemplate {
        shell: ShellView::new(&ctx.user, "/enquiries"),
        toasts: state.notifier().display(ctx.channel),
        back: filter.list_path(),
        title: "Delete Enquiry",
        prompt: format!(
            "Are you sure you want to delete enquiry from {}?",
            enquiry.customer_name
        ),
        action: with_filter(
            &format!("/enquiries/{}/delete", urlencoding::encode(id.as_str())),
            &filter,
        ),
        cancel_href: filter.list_path(),
    }
    .into_response())
}

/// Delete after explicit confirmation.
///
/// POST /enquiries/{id}/delete
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
    let id = EnquiryId::new(id);

    match state.api().delete_enquiry(&ctx.token, &id).await {
        Ok(()) => {
            tracing::info!(enquiry_id = %id, "enquiry deleted");
            ctx.success(&state, "Enquiry deleted successfully");
        }
        Err(e) => {
            if let Some(redirect) = ctx.report(&state, &e, "Failed to delete enquiry").await? {
                return Ok(redirect.into_response());
            }
        }
    }
    Ok(Redirect::to(&filter.list_path()).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use enquiry_desk_core::{AssignedUser, Assignee, EnquiryStatus, Priority, UserId};

    use super::*;

    fn enquiry() -> Enquiry {
        Enquiry {
            id: EnquiryId::new("e1"),
            customer_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "1234567890".to_string(),
            message: "x".repeat(60),
            priority: Priority::High,
            status: EnquiryStatus::InProgress,
            assigned_to: Some(Assignee::User(AssignedUser {
                id: UserId::new("s1"),
                name: "Sam".to_string(),
                email: None,
            })),
            created_at: Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_preview_truncates_long_messages() {
        assert_eq!(preview("short"), "short");
        assert_eq!(preview(&"x".repeat(60)), format!("{}...", "x".repeat(50)));
        assert_eq!(preview(&"é".repeat(50)), "é".repeat(50));
    }

    #[test]
    fn test_row_links_keep_filter() {
        let filter = EnquiryFilter::from_query("status=new&page=2");
        let row = EnquiryRow::new(&enquiry(), &filter);

        assert_eq!(row.assigned_to, "Sam");
        assert_eq!(row.created, "Mar 5, 2024");
        assert_eq!(row.status.label, "In Progress");
        assert_eq!(row.edit_href, "/enquiries?status=new&page=2&modal=edit&id=e1");
        assert_eq!(row.delete_href, "/enquiries/e1/delete?status=new&page=2");
    }

    #[test]
    fn test_unassigned_row_shows_dash() {
        let mut enquiry = enquiry();
        enquiry.assigned_to = None;
        let row = EnquiryRow::new(&enquiry, &EnquiryFilter::default());
        assert_eq!(row.assigned_to, "-");
    }

    #[test]
    fn test_edit_form_prefills_from_enquiry() {
        let form = EnquiryEditForm::from(&enquiry());
        assert_eq!(form.status, "in_progress");
        assert_eq!(form.priority, "high");
        assert_eq!(form.assigned_to, "s1");
    }

    #[test]
    fn test_staff_edit_modal_is_limited() {
        let form = EnquiryEditForm::from(&enquiry());
        let modal = ModalView::edit(
            &EnquiryFilter::default(),
            &EnquiryId::new("e1"),
            &form,
            Role::Staff,
            &[],
        );
        assert!(modal.is_edit);
        assert!(!modal.full_edit);
        assert_eq!(modal.action, "/enquiries/e1");
        assert!(
            modal
                .status_options
                .iter()
                .any(|o| o.selected && o.value == "in_progress")
        );
    }

    #[test]
    fn test_modal_request_from_query() {
        assert!(matches!(
            ModalRequest::from_query("modal=create"),
            Some(ModalRequest::Create(_))
        ));
        assert!(matches!(
            ModalRequest::from_query("modal=view&id=e1"),
            Some(ModalRequest::View(id)) if id.as_str() == "e1"
        ));
        assert!(ModalRequest::from_query("modal=edit").is_none());
        assert!(ModalRequest::from_query("status=new").is_none());
    }
}
