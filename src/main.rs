//! vision-shield server entry point.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};

use vision_shield::backends::ProcessDetector;
use vision_shield::config::Config;
use vision_shield::http::{self, AppState};
use vision_shield::identity::HttpIdentityProvider;
use vision_shield::logging::init_tracing;
use vision_shield::manager::ScanOrchestrator;
use vision_shield::store::PgScanStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    let config = Config::load().context(
        "Failed to load configuration. Check config/*.toml and VISION_SHIELD__* env vars",
    )?;

    init_tracing(&config.logging)?;

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        detector = %config.detector.program,
        "Starting vision-shield"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to the database")?;
    let store = PgScanStore::new(pool);
    store.migrate().await.context("Failed to apply migrations")?;

    let detector = ProcessDetector::new(config.detector.process_config())
        .context("Invalid detector configuration")?;
    let identity = HttpIdentityProvider::new(config.identity.http_config())
        .context("Failed to create identity provider client")?;

    let orchestrator = ScanOrchestrator::builder()
        .with_detector(detector)
        .with_store(store)
        .with_identity_provider(identity)
        .with_config(config.orchestrator_config())
        .build()?;

    let app = http::router(
        AppState::new(Arc::new(orchestrator)),
        config.server.max_upload_bytes,
    );

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .with_context(|| format!("Invalid server.host '{}'", config.server.host))?,
        config.server.port,
    );
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
