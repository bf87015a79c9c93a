use std::sync::Arc;

use crate::config::Config;
use crate::matching::analyzer::ResumeAnalyzer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the reference corpus and the encoder. Built before the listener binds.
    pub analyzer: Arc<ResumeAnalyzer>,
    pub config: Config,
}
