use crate::applications::store::ApplicationStore;
use crate::config::Config;
use crate::resumes::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built explicitly at startup (or per test), never held in a global.
#[derive(Clone)]
pub struct AppState {
    pub applications: ApplicationStore,
    pub resumes: ResumeStore,
    pub config: Config,
}
