mod applications;
mod config;
mod credentials;
mod db;
mod errors;
mod models;
mod resumes;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::applications::store::ApplicationStore;
use crate::config::Config;
use crate::credentials::CredentialCipher;
use crate::db::{create_pool, load_or_create_salt};
use crate::resumes::ResumeStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing CREDENTIAL_SECRET)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job tracker v{}", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite and schema
    let db = create_pool(&config.database_url).await?;

    // Credential key: derived once per process from the secret and the install salt
    let salt = load_or_create_salt(&db).await?;
    let cipher = CredentialCipher::from_secret(&config.credential_secret, &salt)?;
    info!("Credential cipher initialized");

    // Initialize resume storage
    let resumes = ResumeStore::open(&config.upload_dir, config.max_upload_bytes).await?;
    info!("Upload limit: {} bytes", config.max_upload_bytes);
    warn!("Single-user service: no authentication is enforced on any route");

    let state = AppState {
        applications: ApplicationStore::new(db, cipher),
        resumes,
        config: config.clone(),
    };

    let app = build_router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr = config.bind_addr()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
