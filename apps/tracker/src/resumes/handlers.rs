use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::errors::AppError;
use crate::resumes::storage::content_type_for;
use crate::state::AppState;

/// GET /uploads/resumes/*filename
///
/// Streams a stored résumé back. Paths outside the storage root are 404s.
pub async fn handle_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let data = state.resumes.retrieve(&filename).await?;
    Ok(([(header::CONTENT_TYPE, content_type_for(&filename))], data))
}
