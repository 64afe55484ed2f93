use anyhow::{Context, Result};
use api::{AppConfig, AppState, LogFormat, LoggingConfig, router};
use fusion::ModelSuite;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    // No trained models ship with the service; graph analysis and fusion
    // still run and the model components fall back to their defaults.
    let models = ModelSuite::empty();
    let state = AppState::new(&config, models).context("Invalid scoring configuration")?;

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    tracing::info!(
        addr = %config.server.bind_addr,
        mode = ?config.mode,
        "Server listening"
    );

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
