//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router
//! server. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::cache::CachePolicy;

/// Root configuration for the router server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route lookup and request handling settings.
    pub router: RouterConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Router configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// How successful lookups are cached ("literal", "replay", "off").
    pub cache_policy: CachePolicy,

    /// Upper bound on cached paths, exact even under concurrent inserts.
    /// Unbounded when unset.
    pub cache_max_entries: Option<usize>,

    /// Released params buffers kept for reuse.
    pub params_pool_max_idle: usize,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cache_policy: CachePolicy::Literal,
            cache_max_entries: None,
            params_pool_max_idle: 1024,
            max_body_size: 2 * 1024 * 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Time allowed for in-flight requests after a shutdown signal, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.router.cache_policy, CachePolicy::Literal);
        assert_eq!(config.router.cache_max_entries, None);
        assert_eq!(config.timeouts.request_secs, 30);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_sections() {
        let config: ServerConfig = toml::from_str(
            r#"
            [router]
            cache_policy = "replay"
            cache_max_entries = 500

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.router.cache_policy, CachePolicy::Replay);
        assert_eq!(config.router.cache_max_entries, Some(500));
        assert_eq!(config.router.params_pool_max_idle, 1024);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let result: Result<ServerConfig, _> = toml::from_str(
            r#"
            [observability]
            log_format = "xml"
            "#,
        );
        assert!(result.is_err());
    }
}
