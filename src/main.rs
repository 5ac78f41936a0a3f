//! Community Service
//!
//! Manages communities and community membership over RPC-style JSON
//! endpoints, backed by PostgreSQL. Join and leave resolve the user through
//! the user management service before touching membership rows.

mod config;
mod db;
mod error;
mod identity;
mod models;
mod routes;
mod services;
mod state;

use crate::config::Settings;
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting community service...");

    let settings = Settings::load()?;
    info!("Configuration loaded successfully");

    let pool = db::create_pool(&settings.database)?;
    if let Err(e) = db::verify_connection(&pool).await {
        error!("Failed to connect to database {}: {}", settings.database.database, e);
        return Err(e.into());
    }
    info!(
        "Database connection successful ({}:{}, TLS: {})",
        settings.database.host, settings.database.port, settings.database.require_tls
    );

    if let Err(e) = db::init_schema(&pool).await {
        warn!("Warning creating tables: {}", e);
    }

    let state = Arc::new(AppState::from_pool(pool, &settings)?);
    info!("Identity service: {}", settings.identity.base_url);

    let app = create_router(state, &settings);
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("Server listening on http://{}", addr);
    info!("   POST /community/create   - Create community");
    info!("   POST /community/get      - Get community by id");
    info!("   POST /community/list     - List communities (name, location, limit, offset)");
    info!("   POST /community/update   - Partially update community");
    info!("   POST /community/delete   - Soft delete community");
    info!("   POST /community/isValid  - Check community exists");
    info!("   POST /community/join     - Join community");
    info!("   POST /community/leave    - Leave community");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,community_service=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
