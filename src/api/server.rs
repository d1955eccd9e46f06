use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::{
    services::{
        analytics, batch, batch_template, clear_history, decode, generate, generate_png, health,
        history, index, kinds, validate_password, validate_url,
    },
    state::AppState,
};
use crate::config::Config;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every route of the UI and JSON API
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/kinds", get(kinds))
        .route("/api/generate", post(generate))
        .route("/api/generate/png", post(generate_png))
        .route("/api/batch", post(batch))
        .route("/api/batch/templates/{mode}", get(batch_template))
        .route("/api/decode", post(decode))
        .route("/api/validate/url", post(validate_url))
        .route("/api/validate/password", post(validate_password))
        .route("/api/history", get(history).delete(clear_history))
        .route("/api/analytics", get(analytics))
        .with_state(state)
        // Transparently inflate gzip request bodies (large CSV uploads)
        .layer(RequestDecompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

pub async fn run(
    address: Option<SocketAddr>,
    config_path: Option<PathBuf>,
) -> Result<(), AnyError> {
    info!("Loading configuration");
    let config =
        Config::load_with(config_path).map_err(|e| format!("Failed to load config: {}", e))?;

    let address = address.unwrap_or(config.server.bind_addr);
    let state = AppState::from_config(config)
        .map_err(|e| format!("Failed to build URL probe: {}", e))?;

    let app = build_router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "qrstudio listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
