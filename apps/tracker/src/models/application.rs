use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

pub const DEFAULT_STATUS: &str = "Applied";

/// Raw `job_application` row. `credential` is still sealed here.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRow {
    pub id: i64,
    pub company: String,
    pub position: String,
    pub application_date: DateTime<Utc>,
    pub application_link: Option<String>,
    pub credential: Option<Vec<u8>>,
    pub resume_path: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub last_modified: DateTime<Utc>,
}

/// One job application as handed to callers, credential opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationRecord {
    pub id: i64,
    pub company: String,
    pub position: String,
    pub application_date: DateTime<Utc>,
    pub application_link: Option<String>,
    pub credential: Option<String>,
    pub resume_path: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub last_modified: DateTime<Utc>,
}

/// Input for creating a record.
#[derive(Debug, Clone, Default)]
pub struct NewApplication {
    pub company: String,
    pub position: String,
    pub application_link: Option<String>,
    pub credential: Option<String>,
    pub resume_path: Option<String>,
    pub notes: Option<String>,
    /// Blank or absent falls back to [`DEFAULT_STATUS`].
    pub status: Option<String>,
}

/// Partial update. `None` leaves a column untouched; an empty
/// `application_link`/`notes` clears it; an empty `credential` is ignored.
#[derive(Debug, Clone, Default)]
pub struct ApplicationChanges {
    pub company: Option<String>,
    pub position: Option<String>,
    pub application_link: Option<String>,
    pub credential: Option<String>,
    pub resume_path: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}
