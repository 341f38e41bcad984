//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use enquiry_desk_core::{EnquiryFilter, EnquiryStats, EnquiryStatus};

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::notifications::Toast;
use crate::routes::ShellView;
use crate::state::AppState;

/// One statistic card, linking to the matching enquiry list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub title: &'static str,
    pub count: u64,
    pub href: String,
    pub icon: &'static str,
    pub class: &'static str,
}

impl StatCard {
    /// The four dashboard cards: total, then new, in progress and closed.
    #[must_use]
    pub fn all(stats: &EnquiryStats) -> Vec<Self> {
        let by_status = |title: &'static str,
                         status: EnquiryStatus,
                         icon: &'static str,
                         class: &'static str| Self {
            title,
            count: stats.count_for(status),
            href: EnquiryFilter::default()
                .with_status(Some(status))
                .list_path(),
            icon,
            class,
        };

        vec![
            Self {
                title: "Total Enquiries",
                count: stats.total,
                href: EnquiryFilter::default().list_path(),
                icon: "ph-tray",
                class: "bg-indigo-500",
            },
            by_status(
                "New Enquiries",
                EnquiryStatus::New,
                "ph-envelope-simple",
                "bg-blue-500",
            ),
            by_status(
                "In Progress",
                EnquiryStatus::InProgress,
                "ph-hourglass",
                "bg-yellow-500",
            ),
            by_status("Closed", EnquiryStatus::Closed, "ph-check-circle", "bg-green-500"),
        ]
    }
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub shell: ShellView,
    pub toasts: Vec<Toast>,
    pub back: String,
    pub cards: Vec<StatCard>,
    pub create_href: String,
}

/// Dashboard page.
///
/// GET /dashboard
#[instrument(skip(state, ctx), fields(user_id = %ctx.user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
) -> Result<Response, AppError> {
    let stats = match state.api().enquiry_stats(&ctx.token).await {
        Ok(stats) => stats,
        Err(e) => {
            if let Some(redirect) = ctx
                .report(&state, &e, "Failed to load statistics")
                .await?
            {
                return Ok(redirect.into_response());
            }
            EnquiryStats::default()
        }
    };

    Ok(DashboardTemplate {
        shell: ShellView::new(&ctx.user, "/dashboard"),
        toasts: state.notifier().display(ctx.channel),
        back: "/dashboard".to_string(),
        cards: StatCard::all(&stats),
        create_href: "/enquiries?modal=create".to_string(),
    }
    .into_response())
}
