//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout, body limit)
//!     → [routing::RouterService resolves the route]
//!     → endpoint.rs (middleware chain, adapter)
//!     → context.rs (params, query, body for the application handler)
//!     → endpoint.rs encoders / response.rs (JSON response)
//!     → Send to client
//! ```

pub mod context;
pub mod endpoint;
pub mod middleware;
pub mod response;
pub mod server;

pub use context::{RequestContext, TestContext};
pub use endpoint::{
    chain, handler_fn, middleware_fn, EndpointError, Handler, Middleware, Reply, X_ACTUAL_PATH,
};
pub use server::{HttpServer, ServerError};
