/// Art Feed Service bootstrap
///
/// Loads configuration, connects the configured backend (running schema
/// migrations in managed mode) and verifies every store answers.
use anyhow::{Context, Result};
use art_feed_service::{BackendClient, Config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "art_feed_service=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!("Starting Art Feed Service");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(env = %config.app.env, backend = ?config.backend, "Configuration loaded successfully");

    let backend = BackendClient::connect(&config)
        .await
        .context("Failed to connect backend")?;

    backend
        .health_check()
        .await
        .context("Backend health check failed")?;

    info!("Backend ready");
    Ok(())
}
