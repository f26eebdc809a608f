//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parley_core::ParleyConfig;

use crate::provider::CompletionProvider;

/// Shared application state.
///
/// All fields use `Arc` or are `Copy`, so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration. Read-only once the server is up.
    pub config: Arc<ParleyConfig>,
    /// Upstream completion backend.
    pub provider: Arc<dyn CompletionProvider>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
    /// Wall-clock start time reported by `/health`.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ParleyConfig, provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            config: Arc::new(config),
            provider,
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }
}
