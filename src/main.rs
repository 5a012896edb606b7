//! Photo Booth Server
//!
//! Main entry point for the photo booth backend.

use photobooth_server::{
    device_gateway::ProcessGateway,
    state::{AppConfig, AppState},
    web_api,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photobooth_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Photo Booth Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::from_env()?;
    tracing::info!(
        photos_dir = %config.photos_dir.display(),
        camera_cmd = %config.camera_cmd,
        use_mock = config.use_mock,
        capture_timeout_sec = config.capture_timeout.as_secs(),
        probe_timeout_sec = config.probe_timeout.as_secs(),
        capture_wait_ms = u64::try_from(config.capture_wait.as_millis()).unwrap_or(u64::MAX),
        "Configuration loaded"
    );

    tokio::fs::create_dir_all(&config.photos_dir).await?;

    if config.use_mock {
        tracing::info!("Mock camera enabled (USE_MOCK_CAMERA=true), camera command will not be called");
    }

    let state = AppState::new(config, Arc::new(ProcessGateway::new()));

    let app = web_api::create_router(state.clone())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = state.config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Photo booth backend listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
