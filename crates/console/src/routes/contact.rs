//! Public enquiry form.
//!
//! No sign-in required; submissions go to the backend's public endpoint.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::components::{SelectOption, priority_options};
use crate::filters;
use crate::forms::EnquiryForm;
use crate::middleware::Visitor;
use crate::notifications::Toast;
use crate::state::AppState;

const SUBMITTED_MESSAGE: &str = "Your enquiry has been submitted! We will contact you soon.";

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub toasts: Vec<Toast>,
    pub back: String,
    pub form: EnquiryForm,
    pub priority_options: Vec<SelectOption>,
}

fn render(state: &AppState, visitor: &Visitor, form: EnquiryForm) -> Response {
    ContactTemplate {
        toasts: state.notifier().display(visitor.channel),
        back: "/contact".to_string(),
        priority_options: priority_options(form.priority_or_default()),
        form,
    }
    .into_response()
}

/// Empty contact form.
///
/// GET /contact
#[instrument(skip(state, visitor))]
pub async fn page(State(state): State<AppState>, visitor: Visitor) -> Response {
    render(&state, &visitor, EnquiryForm::blank())
}

/// Submit a public enquiry.
///
/// POST /contact
#[instrument(skip(state, visitor, form))]
pub async fn submit(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<EnquiryForm>,
) -> Response {
    let enquiry = match form.validate() {
        Ok(enquiry) => enquiry,
        Err(e) => {
            state.notifier().error(visitor.channel, e.to_string());
            return render(&state, &visitor, form);
        }
    };

    match state.api().create_public_enquiry(&enquiry).await {
        Ok(()) => {
            tracing::info!(priority = %enquiry.priority, "public enquiry submitted");
            state.notifier().success(visitor.channel, SUBMITTED_MESSAGE);
            Redirect::to("/contact").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "public enquiry submission failed");
            state
                .notifier()
                .error(visitor.channel, e.user_message("Failed to submit enquiry"));
            render(&state, &visitor, form)
        }
    }
}
