use anyhow::{Context, Result};
use room_translator::config::Config;
use room_translator::fanout::TranslationFanOut;
use room_translator::retry::RetryConfig;
use room_translator::server::{router, AppState};
use room_translator::{provider, store};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("room_translator=info".parse()?),
        )
        .init();

    info!("Starting room translator");

    // Load configuration from environment
    let config = Config::from_env()?;
    info!(
        "Environment: {}, provider: {:?}, backend: {:?}",
        config.environment, config.translation_provider, config.output_backend
    );

    let client = provider::http_client(&config)?;
    let translator = provider::build_provider(&config, client.clone())?;
    let writer = store::build_writer(&config, client).await?;

    let state = AppState {
        fanout: Arc::new(TranslationFanOut::new(translator, writer)),
        webhook_secret: config.webhook_secret.clone(),
        redelivery: RetryConfig::redelivery(config.redelivery_attempts),
    };

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    info!("✓ Listening on port {}", config.port);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
