use std::str::FromStr;

use anyhow::{bail, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::credentials::{generate_salt, SALT_LEN};

const SALT_KEY: &str = "credential_salt";

/// Creates the SQLite connection pool and brings the schema up to date.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Connecting to {database_url}...");

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;

    info!("Database pool established");
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Returns the install-wide credential salt, generating it on first start.
pub async fn load_or_create_salt(pool: &SqlitePool) -> Result<[u8; SALT_LEN]> {
    let existing: Option<Vec<u8>> = sqlx::query_scalar("SELECT value FROM app_meta WHERE key = ?")
        .bind(SALT_KEY)
        .fetch_optional(pool)
        .await?;

    let stored = match existing {
        Some(value) => value,
        None => {
            let fresh = generate_salt();
            // A concurrent first start may win the insert; re-read whatever landed.
            sqlx::query("INSERT OR IGNORE INTO app_meta (key, value) VALUES (?, ?)")
                .bind(SALT_KEY)
                .bind(fresh.as_slice())
                .execute(pool)
                .await?;
            info!("Generated new credential salt");
            sqlx::query_scalar("SELECT value FROM app_meta WHERE key = ?")
                .bind(SALT_KEY)
                .fetch_one(pool)
                .await?
        }
    };

    if stored.len() != SALT_LEN {
        bail!("Stored credential salt has length {}, expected {SALT_LEN}", stored.len());
    }
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&stored);
    Ok(salt)
}

/// Single-connection in-memory database with the schema applied.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    migrate(&pool).await.expect("migrations apply");
    pool
}
