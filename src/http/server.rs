//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the frozen router in an Axum app as its only service
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Bind server to listener and stop on the shutdown broadcast

use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::http::middleware::request_id::{
    propagate_request_id_layer, request_id, set_request_id_layer,
};
use crate::routing::Router;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server fronting a [`Router`].
pub struct HttpServer {
    app: axum::Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving `router`.
    pub fn new(config: ServerConfig, router: Router) -> Self {
        let app = Self::build_app(&config, router);
        Self { app, config }
    }

    /// Build the Axum app with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &ServerConfig, router: Router) -> axum::Router {
        axum::Router::new()
            .fallback_service(router.into_service())
            .layer(RequestBodyLimitLayer::new(config.router.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(propagate_request_id_layer())
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        uri = %req.uri(),
                        request_id = request_id(req).unwrap_or_default(),
                    )
                }),
            )
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                // a closed channel also means shut down
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The assembled Axum app, for in-process testing.
    pub fn app(&self) -> axum::Router {
        self.app.clone()
    }
}
