//! # Pharmacy API
//!
//! REST server binary for the multi-tenant pharmacy backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pharmacy API Server                              │
//! │                                                                         │
//! │  Client ───► HTTP (8080) ───► Routes ───► Services ───► SQLite         │
//! │                                              │                          │
//! │                                              ▼                          │
//! │                                       Twilio SMS (optional)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pharma_api::notify::{LogNotificationSink, NotificationSink, TwilioSink};
use pharma_api::{build_router, ApiConfig, AppState};
use pharma_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pharma_api=debug,pharma_db=debug")),
        )
        .with_target(true)
        .init();

    info!("Starting Pharmacy API server...");

    // Load configuration
    let config = ApiConfig::load()?;
    info!(
        port = config.http_port,
        database = %config.database_path,
        sms = config.twilio.is_some(),
        "Configuration loaded"
    );

    // Open database (migrations run on connect)
    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.db_max_connections),
    )
    .await?;
    info!("Database ready");

    // SMS gateway (optional)
    let notifier: Arc<dyn NotificationSink> = match config.twilio.clone() {
        Some(twilio) => match TwilioSink::new(twilio) {
            Ok(sink) => {
                info!("Twilio SMS gateway configured");
                Arc::new(sink)
            }
            Err(e) => {
                warn!(?e, "Failed to build Twilio client, logging reset codes instead");
                Arc::new(LogNotificationSink)
            }
        },
        None => {
            warn!("Twilio not configured, reset codes will only be logged");
            Arc::new(LogNotificationSink)
        }
    };

    let bootstrap = config.bootstrap_admin.clone();
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));

    // Create shared state
    let state = Arc::new(AppState::new(db.clone(), config, notifier));

    if let Some(admin) = bootstrap {
        if state
            .users
            .ensure_admin(&admin.phone_number, &admin.password)
            .await?
        {
            info!(phone = %admin.phone_number, "Bootstrap administrator created");
        }
    }

    let app = build_router(state);

    info!(%addr, "Starting HTTP server");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(?e, "Failed to listen for Ctrl+C");
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
                warn!(?e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
