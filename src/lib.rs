//! Trie-based HTTP request router.
//!
//! Maps (method, path) pairs registered at startup to handlers, resolving
//! requests through a segment tree with static, `:param` and `*` branches,
//! a literal-path lookup cache and pooled parameter buffers.

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServerConfig;
pub use http::{EndpointError, HttpServer, Reply, RequestContext};
pub use lifecycle::Shutdown;
pub use routing::{Resolution, Router};
