use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::credentials::CredentialCipher;
use crate::errors::AppError;
use crate::models::application::{
    ApplicationChanges, ApplicationRecord, ApplicationRow, NewApplication, DEFAULT_STATUS,
};

const SELECT_COLUMNS: &str = "SELECT id, company, position, application_date, application_link, \
     credential, resume_path, notes, status, last_modified FROM job_application";

/// Persistent table of job applications.
///
/// The store owns no files: callers release a record's résumé through
/// `ResumeStore` before deleting the record.
#[derive(Debug, Clone)]
pub struct ApplicationStore {
    pool: SqlitePool,
    cipher: CredentialCipher,
}

impl ApplicationStore {
    pub fn new(pool: SqlitePool, cipher: CredentialCipher) -> Self {
        Self { pool, cipher }
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn create(&self, new: NewApplication) -> Result<ApplicationRecord, AppError> {
        self.create_at(new, Utc::now()).await
    }

    /// Inserts with an explicit creation time, which becomes both
    /// `application_date` and `last_modified`.
    pub async fn create_at(
        &self,
        new: NewApplication,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, AppError> {
        let company = required("company", &new.company)?;
        let position = required("position", &new.position)?;
        let status = non_empty(new.status).unwrap_or_else(|| DEFAULT_STATUS.to_string());
        let credential = self.seal(non_empty(new.credential))?;

        let id = sqlx::query(
            r#"
            INSERT INTO job_application
                (company, position, application_date, application_link,
                 credential, resume_path, notes, status, last_modified)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(company)
        .bind(position)
        .bind(now)
        .bind(non_empty(new.application_link))
        .bind(credential)
        .bind(new.resume_path)
        .bind(non_empty(new.notes))
        .bind(&status)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        info!("Created application {id} ({company} / {position})");
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<ApplicationRecord, AppError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))?;
        self.open(row)
    }

    /// Most recent application first; equal dates keep insertion order.
    pub async fn list(&self) -> Result<Vec<ApplicationRecord>, AppError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY application_date DESC, id ASC");
        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(|row| self.open(row)).collect()
    }

    pub async fn update(
        &self,
        id: i64,
        changes: ApplicationChanges,
    ) -> Result<ApplicationRecord, AppError> {
        let company = changes
            .company
            .as_deref()
            .map(|c| required("company", c).map(str::to_string))
            .transpose()?;
        let position = changes
            .position
            .as_deref()
            .map(|p| required("position", p).map(str::to_string))
            .transpose()?;
        let credential = self.seal(non_empty(changes.credential))?;

        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM job_application WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(not_found(id));
        }

        // Each column keeps its current value when its bind is NULL, except
        // the optional text columns, which take a separate "supplied" flag so
        // an empty submission can clear them.
        sqlx::query(
            r#"
            UPDATE job_application SET
                company          = COALESCE(?, company),
                position         = COALESCE(?, position),
                application_link = CASE WHEN ? THEN ? ELSE application_link END,
                credential       = COALESCE(?, credential),
                resume_path      = COALESCE(?, resume_path),
                notes            = CASE WHEN ? THEN ? ELSE notes END,
                status           = COALESCE(?, status),
                last_modified    = ?
            WHERE id = ?
            "#,
        )
        .bind(company)
        .bind(position)
        .bind(changes.application_link.is_some())
        .bind(non_empty(changes.application_link))
        .bind(credential)
        .bind(changes.resume_path)
        .bind(changes.notes.is_some())
        .bind(non_empty(changes.notes))
        .bind(non_empty(changes.status))
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Updated application {id}");
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let affected = sqlx::query("DELETE FROM job_application WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(not_found(id));
        }
        tx.commit().await?;

        info!("Deleted application {id}");
        Ok(())
    }

    fn seal(&self, credential: Option<String>) -> Result<Option<Vec<u8>>, AppError> {
        credential
            .map(|c| self.cipher.seal(&c))
            .transpose()
            .map_err(|e| AppError::Credential(e.to_string()))
    }

    fn open(&self, row: ApplicationRow) -> Result<ApplicationRecord, AppError> {
        let credential = row
            .credential
            .as_deref()
            .map(|sealed| self.cipher.open(sealed))
            .transpose()
            .map_err(|e| AppError::Credential(format!("application {}: {e}", row.id)))?;

        Ok(ApplicationRecord {
            id: row.id,
            company: row.company,
            position: row.position,
            application_date: row.application_date,
            application_link: row.application_link,
            credential,
            resume_path: row.resume_path,
            notes: row.notes,
            status: row.status,
            last_modified: row.last_modified,
        })
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Application {id} not found"))
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
