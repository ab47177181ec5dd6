//! Record lifecycle across both stores: the résumé file is written before the
//! row that points at it, a superseded file is dropped only once the row has
//! moved off it, and a file is released before its row is deleted.

use tracing::warn;

use crate::applications::form::ApplicationForm;
use crate::errors::AppError;
use crate::models::application::ApplicationRecord;
use crate::state::AppState;

pub async fn submit_new(
    state: &AppState,
    form: ApplicationForm,
) -> Result<ApplicationRecord, AppError> {
    let (mut new, upload) = form.into_new()?;

    if let Some(upload) = upload {
        new.resume_path = Some(state.resumes.store(&upload.filename, &upload.data).await?);
    }
    let stored_path = new.resume_path.clone();

    match state.applications.create(new).await {
        Ok(record) => Ok(record),
        Err(e) => {
            if let Some(path) = stored_path {
                release_orphan(state, &path).await;
            }
            Err(e)
        }
    }
}

pub async fn submit_edit(
    state: &AppState,
    id: i64,
    form: ApplicationForm,
) -> Result<ApplicationRecord, AppError> {
    let existing = state.applications.get(id).await?;
    let (mut changes, upload) = form.into_changes()?;

    match upload {
        Some(upload) => {
            state
                .resumes
                .replace(
                    existing.resume_path.as_deref(),
                    &upload.filename,
                    &upload.data,
                    move |path| {
                        changes.resume_path = Some(path);
                        state.applications.update(id, changes)
                    },
                )
                .await
        }
        None => state.applications.update(id, changes).await,
    }
}

pub async fn remove_application(state: &AppState, id: i64) -> Result<(), AppError> {
    let existing = state.applications.get(id).await?;
    if let Some(path) = existing.resume_path.as_deref() {
        state.resumes.remove(path).await?;
    }
    state.applications.delete(id).await
}

async fn release_orphan(state: &AppState, path: &str) {
    if let Err(e) = state.resumes.remove(path).await {
        warn!("Could not remove orphaned resume {path}: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;
    use bytes::Bytes;

    use crate::applications::form::ResumeUpload;

    fn form_with_resume(name: &str, data: &'static [u8]) -> ApplicationForm {
        ApplicationForm {
            company: Some("Acme".into()),
            position: Some("Engineer".into()),
            resume: Some(ResumeUpload {
                filename: name.into(),
                data: Bytes::from_static(data),
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_submit_new_links_stored_file() {
        let (state, _dir) = test_state().await;

        let record = submit_new(&state, form_with_resume("cv.pdf", b"v1")).await.unwrap();

        let path = record.resume_path.expect("resume path set");
        assert!(path.ends_with("_cv.pdf"));
        assert_eq!(state.resumes.retrieve(&path).await.unwrap().as_ref(), b"v1");
    }

    #[tokio::test]
    async fn test_submit_new_without_required_field_stores_nothing() {
        let (state, dir) = test_state().await;
        let mut form = form_with_resume("cv.pdf", b"v1");
        form.company = None;

        assert!(matches!(submit_new(&state, form).await, Err(AppError::Validation(_))));

        let mut entries = tokio::fs::read_dir(dir.path().join("resumes")).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_submit_edit_replaces_file() {
        let (state, _dir) = test_state().await;
        let record = submit_new(&state, form_with_resume("cv.pdf", b"v1")).await.unwrap();
        let old_path = record.resume_path.clone().unwrap();

        let updated = submit_edit(&state, record.id, form_with_resume("cv2.pdf", b"v2"))
            .await
            .unwrap();

        let new_path = updated.resume_path.unwrap();
        assert_ne!(new_path, old_path);
        assert!(matches!(state.resumes.retrieve(&old_path).await, Err(AppError::NotFound(_))));
        assert_eq!(state.resumes.retrieve(&new_path).await.unwrap().as_ref(), b"v2");
    }

    #[tokio::test]
    async fn test_failed_update_keeps_existing_resume() {
        let (state, dir) = test_state().await;
        let record = submit_new(&state, form_with_resume("cv.pdf", b"v1")).await.unwrap();
        let old_path = record.resume_path.clone().unwrap();

        sqlx::query(
            "CREATE TRIGGER fail_upd BEFORE UPDATE ON job_application \
             BEGIN SELECT RAISE(FAIL, 'disk full'); END",
        )
        .execute(state.applications.pool())
        .await
        .unwrap();

        let result = submit_edit(&state, record.id, form_with_resume("cv2.pdf", b"v2")).await;
        assert!(matches!(result, Err(AppError::Database(_))));

        let current = state.applications.get(record.id).await.unwrap();
        assert_eq!(current.resume_path.as_deref(), Some(old_path.as_str()));
        assert_eq!(state.resumes.retrieve(&old_path).await.unwrap().as_ref(), b"v1");

        let mut entries = tokio::fs::read_dir(dir.path().join("resumes")).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec![old_path]);
    }

    #[tokio::test]
    async fn test_submit_edit_without_file_keeps_resume() {
        let (state, _dir) = test_state().await;
        let record = submit_new(&state, form_with_resume("cv.pdf", b"v1")).await.unwrap();

        let form = ApplicationForm {
            status: Some("Interview".into()),
            ..Default::default()
        };
        let updated = submit_edit(&state, record.id, form).await.unwrap();

        assert_eq!(updated.resume_path, record.resume_path);
        assert_eq!(updated.status, "Interview");
    }

    #[tokio::test]
    async fn test_submit_edit_unknown_id_is_not_found() {
        let (state, _dir) = test_state().await;
        let result = submit_edit(&state, 404, form_with_resume("cv.pdf", b"v1")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(state.applications.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_application_deletes_record_and_file() {
        let (state, _dir) = test_state().await;
        let record = submit_new(&state, form_with_resume("cv.pdf", b"v1")).await.unwrap();
        let path = record.resume_path.clone().unwrap();

        remove_application(&state, record.id).await.unwrap();

        assert!(matches!(state.applications.get(record.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(state.resumes.retrieve(&path).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_unknown_application_is_not_found() {
        let (state, _dir) = test_state().await;
        assert!(matches!(remove_application(&state, 9).await, Err(AppError::NotFound(_))));
    }
}
