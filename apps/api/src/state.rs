use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide model client, created once in `main`. Tests swap in a stub.
    pub llm: Arc<dyn CompletionService>,
    pub config: Config,
}
