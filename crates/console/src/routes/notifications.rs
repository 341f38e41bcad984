//! Toast dismissal without JavaScript.

use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use tracing::instrument;
use uuid::Uuid;

use crate::forms::DismissForm;
use crate::middleware::Visitor;
use crate::state::AppState;

/// Dismiss a toast and return to the page it was shown on.
///
/// POST /notifications/{id}/dismiss
#[instrument(skip(state, visitor, form))]
pub async fn dismiss(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(id): Path<String>,
    Form(form): Form<DismissForm>,
) -> Redirect {
    match Uuid::parse_str(&id) {
        Ok(id) => {
            state.notifier().dismiss(visitor.channel, id);
        }
        Err(_) => tracing::debug!(id = %id, "ignoring malformed toast id"),
    }
    Redirect::to(form.back_path())
}
