pub mod health;

use axum::{extract::DefaultBodyLimit, routing::get, Router};

use crate::applications::handlers;
use crate::resumes::handlers::handle_download;
use crate::state::AppState;

/// Headroom over the résumé ceiling for the form's text fields and multipart framing.
const FORM_FIELD_ALLOWANCE: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + FORM_FIELD_ALLOWANCE;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/", get(handlers::handle_list))
        .route(
            "/application/new",
            get(handlers::handle_new_form).post(handlers::handle_create),
        )
        .route(
            "/application/:id/edit",
            get(handlers::handle_edit_form).post(handlers::handle_update),
        )
        .route("/application/:id/delete", get(handlers::handle_delete))
        .route("/uploads/resumes/*filename", get(handle_download))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
