//! Axum route handlers for job application records.

use axum::{
    extract::{Multipart, Path, State},
    response::Redirect,
    Json,
};
use serde::Serialize;

use crate::applications::form::ApplicationForm;
use crate::applications::lifecycle::{remove_application, submit_edit, submit_new};
use crate::errors::AppError;
use crate::models::application::{ApplicationRecord, DEFAULT_STATUS};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NewApplicationForm {
    pub status: &'static str,
    pub max_upload_bytes: usize,
}

/// GET /
pub async fn handle_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<ApplicationRecord>>, AppError> {
    Ok(Json(state.applications.list().await?))
}

/// GET /application/new
///
/// Defaults a client needs to render an empty form.
pub async fn handle_new_form(State(state): State<AppState>) -> Json<NewApplicationForm> {
    Json(NewApplicationForm {
        status: DEFAULT_STATUS,
        max_upload_bytes: state.resumes.max_bytes(),
    })
}

/// POST /application/new
pub async fn handle_create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let form = ApplicationForm::from_multipart(multipart).await?;
    submit_new(&state, form).await?;
    Ok(Redirect::to("/"))
}

/// GET /application/:id/edit
pub async fn handle_edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApplicationRecord>, AppError> {
    Ok(Json(state.applications.get(id).await?))
}

/// POST /application/:id/edit
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let form = ApplicationForm::from_multipart(multipart).await?;
    submit_edit(&state, id, form).await?;
    Ok(Redirect::to("/"))
}

/// GET /application/:id/delete
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    remove_application(&state, id).await?;
    Ok(Redirect::to("/"))
}
