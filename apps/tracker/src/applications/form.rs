use axum::extract::Multipart;
use bytes::Bytes;

use crate::errors::AppError;
use crate::models::application::{ApplicationChanges, NewApplication};

/// A résumé file attached to a form submission.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub filename: String,
    pub data: Bytes,
}

/// Fields of the create/edit form as submitted. Absent fields stay `None`.
#[derive(Debug, Clone, Default)]
pub struct ApplicationForm {
    pub company: Option<String>,
    pub position: Option<String>,
    pub application_link: Option<String>,
    pub credential: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
    pub resume: Option<ResumeUpload>,
}

impl ApplicationForm {
    /// Reads a multipart submission. A `resume` part without a filename is
    /// treated as "no file chosen"; unknown parts are drained and ignored.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = ApplicationForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "resume" => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let data = field.bytes().await?;
                    if !filename.is_empty() {
                        form.resume = Some(ResumeUpload { filename, data });
                    }
                }
                "company" => form.company = Some(field.text().await?),
                "position" => form.position = Some(field.text().await?),
                "application_link" => form.application_link = Some(field.text().await?),
                // `password` is the field name older form clients submit.
                "credential" | "password" => form.credential = Some(field.text().await?),
                "notes" => form.notes = Some(field.text().await?),
                "status" => form.status = Some(field.text().await?),
                _ => {
                    field.bytes().await?;
                }
            }
        }

        Ok(form)
    }

    /// Splits into the record input for a create and the optional upload.
    pub fn into_new(self) -> Result<(NewApplication, Option<ResumeUpload>), AppError> {
        let company = self
            .company
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AppError::Validation("company is required".to_string()))?;
        let position = self
            .position
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| AppError::Validation("position is required".to_string()))?;

        Ok((
            NewApplication {
                company,
                position,
                application_link: self.application_link,
                credential: self.credential,
                resume_path: None,
                notes: self.notes,
                status: self.status,
            },
            self.resume,
        ))
    }

    /// Splits into a partial update and the optional upload. Required fields
    /// may be omitted but not blanked.
    pub fn into_changes(self) -> Result<(ApplicationChanges, Option<ResumeUpload>), AppError> {
        for (field, value) in [("company", &self.company), ("position", &self.position)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(AppError::Validation(format!("{field} is required")));
            }
        }

        Ok((
            ApplicationChanges {
                company: self.company,
                position: self.position,
                application_link: self.application_link,
                credential: self.credential,
                resume_path: None,
                notes: self.notes,
                status: self.status,
            },
            self.resume,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_new_requires_company() {
        let form = ApplicationForm {
            position: Some("Engineer".into()),
            ..Default::default()
        };
        assert!(matches!(form.into_new(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_into_new_carries_upload_separately() {
        let form = ApplicationForm {
            company: Some("Acme".into()),
            position: Some("Engineer".into()),
            resume: Some(ResumeUpload {
                filename: "cv.pdf".into(),
                data: Bytes::from_static(b"pdf"),
            }),
            ..Default::default()
        };
        let (new, upload) = form.into_new().unwrap();
        assert_eq!(new.company, "Acme");
        assert!(new.resume_path.is_none());
        assert_eq!(upload.unwrap().filename, "cv.pdf");
    }

    #[test]
    fn test_into_changes_leaves_absent_fields_unset() {
        let form = ApplicationForm {
            status: Some("Offer".into()),
            ..Default::default()
        };
        let (changes, upload) = form.into_changes().unwrap();
        assert_eq!(changes.status.as_deref(), Some("Offer"));
        assert!(changes.company.is_none());
        assert!(changes.credential.is_none());
        assert!(upload.is_none());
    }

    #[test]
    fn test_into_changes_rejects_blanked_position() {
        let form = ApplicationForm {
            position: Some("  ".into()),
            ..Default::default()
        };
        assert!(matches!(form.into_changes(), Err(AppError::Validation(_))));
    }
}
