//! Parley application binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Install the tracing subscriber
//! 3. Build the upstream completion provider
//! 4. Serve `POST /chat`, `/health` and the single-page client

mod cli;

use std::sync::Arc;

use clap::Parser;
use parley_api::{AppState, OpenRouterProvider};
use parley_core::{ParleyConfig, ParleyError};
use tracing_subscriber::EnvFilter;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is read before logging so its level applies; a load failure is
    // reported once the subscriber exists.
    let config_path = args.resolve_config_path();
    let loaded = ParleyConfig::load(&config_path);
    let mut config = loaded.as_ref().cloned().unwrap_or_default();

    // Tracing.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));
    match &loaded {
        Ok(_) => tracing::info!(path = %config_path.display(), "Configuration loaded"),
        Err(e) => tracing::warn!(
            path = %config_path.display(),
            error = %e,
            "Failed to load config. Using defaults."
        ),
    }

    args.apply(&mut config);

    // Upstream provider.
    let provider = match OpenRouterProvider::from_env(&config.completion) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::error!(error = %e, "Completion provider unavailable");
            return Err(ParleyError::from(e).into());
        }
    };
    tracing::info!(
        model = %config.completion.model,
        fallbacks = config.completion.fallback_models.len(),
        "Completion provider ready"
    );

    let state = AppState::new(config.clone(), Arc::new(provider));
    parley_api::start_server(&config, state).await?;

    Ok(())
}
