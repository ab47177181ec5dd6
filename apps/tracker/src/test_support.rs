use tempfile::TempDir;

use crate::applications::store::ApplicationStore;
use crate::config::Config;
use crate::credentials::{CredentialCipher, KEY_LEN};
use crate::db::memory_pool;
use crate::resumes::ResumeStore;
use crate::state::AppState;

pub const TEST_UPLOAD_LIMIT: usize = 64 * 1024;

/// Isolated state: in-memory database and a fresh upload root under the
/// returned directory, which must outlive the state.
pub async fn test_state() -> (AppState, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let upload_dir = dir.path().join("resumes");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        upload_dir: upload_dir.clone(),
        max_upload_bytes: TEST_UPLOAD_LIMIT,
        credential_secret: "test-secret".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        rust_log: "debug".to_string(),
    };

    let state = AppState {
        applications: ApplicationStore::new(
            memory_pool().await,
            CredentialCipher::from_key(&[5u8; KEY_LEN]),
        ),
        resumes: ResumeStore::open(&upload_dir, TEST_UPLOAD_LIMIT)
            .await
            .expect("resume store"),
        config,
    };
    (state, dir)
}
