//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration for the people endpoints and static pages
//! - Middleware stack (request IDs, logging, timeouts, compression, CORS)
//! - Spawning the startup probe once the listener is bound
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::middleware::{log_requests, request_id};
use crate::probe::spawn_startup_probe;
use crate::routes::{add_person_form, home, not_found, people};
use crate::state::ServerState;
use crate::telemetry::init_tracing;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// Middleware stack (outermost first):
/// 1. HTTP tracing
/// 2. Request ID tracking
/// 3. Request logging
/// 4. CORS
/// 5. Compression
/// 6. Timeout handling
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(home))
        .route("/addPerson", get(add_person_form))
        .route("/getAllPeople", get(people::get_all_people))
        .route("/savePerson", post(people::save_person))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the people HTTP server
///
/// Installs JSON logging (stdout, plus rotating files when `log_dir` is set),
/// opens the configured record store, binds the TCP listener and serves until
/// SIGTERM or Ctrl+C.
///
/// # Example
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let _log_guard = init_tracing(&config)?;

    let state = Arc::new(ServerState::new(config.clone())?);

    let addr: SocketAddr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(
        "Starting people server on {} (store: {:?})",
        addr,
        config.backend()
    );
    tracing::info!(
        "Timeout: {}s, store timeout: {}s, max body: {}MB",
        config.timeout_secs,
        config.store_timeout_secs,
        config.max_body_size_mb
    );

    serve(listener, state, shutdown_signal()).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// The startup probe, when enabled, is spawned here after the listener is
/// bound and is never awaited.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<ServerState>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr()?;
    tracing::info!(port = local_addr.port(), "server listening");

    if state.config.startup_probe {
        spawn_startup_probe(state.store.clone(), state.config.base_url(local_addr.port()));
    }

    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
