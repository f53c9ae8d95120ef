use anyhow::{Context, Result};
use ecochat_api::{build_app, ServerConfig};
use ecochat_observability::{init_tracing, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("ecochat_api", LogFormat::Json);

    let config = ServerConfig::from_env();
    let app = build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(bind = %config.bind, mode = %config.mode.label(), "ecochat api started");

    axum::serve(listener, app).await?;
    Ok(())
}
