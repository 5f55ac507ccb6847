pub mod api;
pub mod config;
pub mod consultations;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod models;
pub mod patients;
pub mod professionals;
pub mod validation;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Startup failures surfaced to `main`.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Core(#[from] core_state::CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Load settings, open the database and serve the API until Ctrl-C.
pub async fn run() -> Result<(), RunError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = config::Settings::from_env()?;
    tracing::debug!(?settings, "Settings resolved");

    let core = Arc::new(core_state::CoreState::new(settings)?);
    let bind_addr = core.settings().bind_addr;
    let mut server = api::start_api_server(core, bind_addr).await?;
    tracing::info!(addr = %server.addr(), "Listening");

    let signal = tokio::signal::ctrl_c().await;
    server.shutdown();
    server.wait().await;
    signal.map_err(RunError::Signal)
}
