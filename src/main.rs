//! Todo API server.
//!
//! # Environment Variables
//!
//! - `JWT_SECRET`: HS256 secret for bearer tokens (required)
//! - `HOST`: Server host address (default: `0.0.0.0`)
//! - `PORT`: Server port (default: `3000`)
//! - `BASE_URL`: Prefix for `links.self` and `Location` (default: empty)
//! - `CONDITIONAL_DELETE`: Require preconditions on DELETE (default: `false`)
//! - `LOG_FORMAT`: `pretty` (default) | `json`
//! - `RUST_LOG`: Logging filter (default: `todo_api=debug,tower_http=debug`)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use todo_api::api::{AppState, create_router};
use todo_api::infrastructure::{AppConfig, InMemoryTodoRepository, LogFormat};

const DEFAULT_LOG_FILTER: &str = "todo_api=debug,tower_http=debug";

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            // The subscriber is not installed yet.
            eprintln!("Configuration error: {error}");
            std::process::exit(1);
        }
    };

    init_tracing(config.log_format);
    tracing::info!(
        conditional_delete = config.conditional_delete,
        base_url = %config.base_url,
        "Starting Todo API"
    );

    let address: SocketAddr = match config.bind_address().parse() {
        Ok(address) => address,
        Err(error) => {
            tracing::error!(%error, "Invalid server address: {}", config.bind_address());
            std::process::exit(1);
        }
    };

    let repository = Arc::new(InMemoryTodoRepository::new());
    let application = create_router(AppState::new(repository, config));

    let listener = match TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, "Failed to bind to address {}", address);
            std::process::exit(1);
        }
    };

    match listener.local_addr() {
        Ok(address) => tracing::info!("Listening on {}", address),
        Err(error) => tracing::warn!(%error, "Could not determine local address"),
    }

    if let Err(error) = axum::serve(listener, application)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(%error, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Server shutdown complete");
}

/// Completes on SIGINT, or on SIGTERM where available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
