//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Register the demonstration routes
//! - Bind the listener, serve, and drain on shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)
//! - Draining is bounded by `timeouts.shutdown_grace_secs`

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use metrics_exporter_prometheus::BuildError;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinError;
use tracing_subscriber::util::TryInitError;

use crate::config::{load_config, validate_config, ConfigError, RouterConfig, ServerConfig};
use crate::http::context::RequestContext;
use crate::http::endpoint::{EndpointError, Reply};
use crate::http::middleware::recovery;
use crate::http::server::{HttpServer, ServerError};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{logging, metrics};
use crate::routing::Router;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialize logging: {0}")]
    Logging(#[from] TryInitError),

    #[error("invalid metrics address: {0}")]
    MetricsAddress(#[from] AddrParseError),

    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("server task failed: {0}")]
    Join(#[from] JoinError),
}

/// Command-line overrides applied on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub config_path: Option<PathBuf>,
    pub bind_address: Option<String>,
}

/// Resolve the effective configuration.
pub fn resolve_config(options: &StartupOptions) -> Result<ServerConfig, ConfigError> {
    let mut config = match &options.config_path {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = &options.bind_address {
        config.listener.bind_address = bind.clone();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }
    Ok(config)
}

/// Run the server until a shutdown signal arrives.
pub async fn run(options: StartupOptions) -> Result<(), StartupError> {
    let config = resolve_config(&options)?;
    logging::init(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        cache_policy = ?config.router.cache_policy,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let router = demo_router(config.router.clone());

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, router);
    let mut task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut task => return Ok(result??),
        _ = signals::wait_for_signal() => {}
    }

    shutdown.trigger();
    match tokio::time::timeout(grace, task).await {
        Ok(result) => result??,
        Err(_) => tracing::warn!(
            grace_secs = grace.as_secs(),
            "Graceful shutdown timed out, dropping open connections"
        ),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

#[derive(Debug, Deserialize)]
struct EchoRequest {
    message: String,
}

/// Router with the demonstration endpoints served by the binary.
///
/// - `GET /health`
/// - `GET /users/:id`
/// - `GET /files/*`
/// - `POST /echo`
pub fn demo_router(config: RouterConfig) -> Router {
    let mut router = Router::with_config(config);
    router.use_middleware(recovery());

    router.endpoint(
        Method::GET,
        "/health",
        |_ctx: RequestContext| async { Reply::json(&json!({ "status": "ok" })) },
        &[],
    );

    router.endpoint(
        Method::GET,
        "/users/:id",
        |ctx: RequestContext| async move {
            let raw = ctx.param("id");
            if raw.is_empty() {
                // literal cache hits carry no parameters
                return Err(EndpointError::bad_request("missing user id"));
            }
            let id: u64 = raw
                .parse()
                .map_err(|_| EndpointError::bad_request(format!("invalid user id: {raw}")))?;
            Reply::json(&json!({ "id": id }))
        },
        &[],
    );

    router.endpoint(
        Method::GET,
        "/files/*",
        |ctx: RequestContext| async move {
            Reply::json(&json!({
                "path": ctx.param("*"),
                "route": ctx.matched_route(),
            }))
        },
        &[],
    );

    router.endpoint(
        Method::POST,
        "/echo",
        |mut ctx: RequestContext| async move {
            let body: EchoRequest = ctx.json().await?;
            Ok(Reply::value(json!({ "message": body.message })).with_status(StatusCode::CREATED))
        },
        &[],
    );

    router
}
