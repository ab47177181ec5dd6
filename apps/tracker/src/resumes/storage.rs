use std::future::Future;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use chrono::Utc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::errors::{AppError, StorageError};

/// On-disk store for uploaded résumés.
///
/// Paths handed out are relative to `root` and are the only thing the
/// database ever records. Every path coming back in is re-validated against
/// the canonical root before the filesystem is touched.
#[derive(Debug, Clone)]
pub struct ResumeStore {
    root: PathBuf,
    max_bytes: usize,
}

impl ResumeStore {
    /// Creates the storage directory if needed and pins its canonical location.
    pub async fn open(root: impl AsRef<Path>, max_bytes: usize) -> Result<Self, StorageError> {
        fs::create_dir_all(root.as_ref()).await?;
        let root = fs::canonicalize(root.as_ref()).await?;
        info!("Resume storage at {}", root.display());
        Ok(Self { root, max_bytes })
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Writes `data` under `<YYYYMMDD_HHMMSS>_<name>` and returns that relative path.
    pub async fn store(&self, original_filename: &str, data: &[u8]) -> Result<String, StorageError> {
        if data.len() > self.max_bytes {
            return Err(StorageError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let base = format!(
            "{}_{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            sanitize_filename(original_filename)
        );

        let mut attempt = 0u32;
        let (name, mut file) = loop {
            let name = with_suffix(&base, attempt);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.root.join(&name))
                .await
            {
                Ok(file) => break (name, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        };

        if let Err(e) = write_all(&mut file, data).await {
            drop(file);
            self.discard_partial(&name).await;
            return Err(e.into());
        }

        info!("Stored resume {name} ({} bytes)", data.len());
        Ok(name)
    }

    /// Swaps `existing` for a newly stored file around a caller-supplied
    /// `commit` step that records the new path.
    ///
    /// The old file is removed only after `commit` succeeds, so a failed
    /// commit never leaves the record pointing at a deleted file; the new file
    /// is removed instead. Failing to remove either file is logged and
    /// otherwise ignored.
    pub async fn replace<T, E, F, Fut>(
        &self,
        existing: Option<&str>,
        original_filename: &str,
        data: &[u8],
        commit: F,
    ) -> Result<T, E>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<StorageError>,
    {
        let stored = self.store(original_filename, data).await?;

        match commit(stored.clone()).await {
            Ok(value) => {
                if let Some(old) = existing.filter(|old| *old != stored) {
                    if let Err(e) = self.remove(old).await {
                        warn!("Could not remove superseded resume {old}: {e}");
                    }
                }
                Ok(value)
            }
            Err(e) => {
                if let Err(cleanup) = self.remove(&stored).await {
                    warn!("Could not remove uncommitted resume {stored}: {cleanup}");
                }
                Err(e)
            }
        }
    }

    /// Deletes the file if present. Absent files and paths outside the root are no-ops.
    pub async fn remove(&self, path: &str) -> Result<(), StorageError> {
        let Some(target) = self.resolve(path) else {
            warn!("Refusing to remove resume path outside storage root: {path}");
            return Ok(());
        };
        match fs::remove_file(&target).await {
            Ok(()) => {
                info!("Removed resume {path}");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Reads a stored file back. Anything absent or resolving outside the
    /// storage root is reported as `NotFound`.
    pub async fn retrieve(&self, path: &str) -> Result<Bytes, AppError> {
        let not_found = || AppError::NotFound(format!("Resume {path} not found"));

        let joined = self.resolve(path).ok_or_else(not_found)?;
        let real = match fs::canonicalize(&joined).await {
            Ok(real) => real,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(StorageError::from(e).into()),
        };
        if !real.starts_with(&self.root) {
            warn!("Blocked resume read escaping storage root: {path}");
            return Err(not_found());
        }

        let is_file = fs::metadata(&real)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(not_found());
        }

        match fs::read(&real).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(StorageError::from(e).into()),
        }
    }

    async fn discard_partial(&self, name: &str) {
        if let Err(e) = fs::remove_file(self.root.join(name)).await {
            warn!("Could not remove partially written resume {name}: {e}");
        }
    }

    /// Lexical half of the traversal guard: only plain relative components.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        let mut components = relative.components().peekable();
        components.peek()?;
        if components.all(|c| matches!(c, Component::Normal(_))) {
            Some(self.root.join(relative))
        } else {
            None
        }
    }
}

async fn write_all(file: &mut fs::File, data: &[u8]) -> std::io::Result<()> {
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await
}

/// Keeps the final path component and maps anything outside `[A-Za-z0-9._-]` to `_`.
pub fn sanitize_filename(original: &str) -> String {
    let last = original
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "resume".to_string()
    } else {
        cleaned.to_string()
    }
}

fn with_suffix(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        return base.to_string();
    }
    match base.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}-{attempt}.{ext}"),
        None => format!("{base}-{attempt}"),
    }
}

/// Content type for download responses, by extension.
pub fn content_type_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("odt") => "application/vnd.oasis.opendocument.text",
        Some("rtf") => "application/rtf",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
