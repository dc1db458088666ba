//! Threat Detect inference server

use anyhow::Context;

use threat_detect::config::Config;
use threat_detect::constants::APP_VERSION;
use threat_detect::{create_router, logging, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    logging::init("threat_detect=debug,tower_http=debug");

    let config = Config::from_env();
    tracing::info!(version = APP_VERSION, environment = %config.environment, "Threat Detect server starting...");

    // Bundle and simulation data; either may be missing
    let state = AppState::load(&config);
    if state.detector.is_none() {
        tracing::warn!("Serving without a model; /predict will answer 503");
    }

    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
