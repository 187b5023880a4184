//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Cross-origin headers applied to every response.
    pub cors: CorsConfig,

    /// How the destination URL is encoded in inbound requests.
    pub destination: DestinationConfig,

    /// Request forwarding policy (header deny-list, body methods).
    pub forwarding: ForwardingConfig,

    /// Outbound timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub security: SecurityConfig,

    /// Logging and metrics settings.
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

/// Cross-origin access configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Value of `Access-Control-Allow-Origin` ("*" or a single origin).
    pub allowed_origin: String,

    /// Methods advertised in `Access-Control-Allow-Methods`.
    pub allowed_methods: Vec<String>,

    /// Headers advertised in `Access-Control-Allow-Headers`.
    ///
    /// `["*"]` or an empty list echoes the preflight's
    /// `Access-Control-Request-Headers` instead of a fixed list.
    pub allowed_headers: Vec<String>,

    /// Preflight cache lifetime, sent as `Access-Control-Max-Age`.
    pub max_age_secs: u64,

    /// Advertise relayed header names in `Access-Control-Expose-Headers`.
    pub expose_headers: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: "*".to_string(),
            allowed_methods: ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_headers: vec!["*".to_string()],
            max_age_secs: 86_400,
            expose_headers: true,
        }
    }
}

/// Where the destination URL is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DestinationMode {
    /// `GET /https://example.com/resource`
    #[default]
    Path,
    /// `GET /proxy?url=https://example.com/resource`
    Query,
}

/// Destination encoding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DestinationConfig {
    /// Encoding used by this deployment. Exactly one mode is active.
    pub mode: DestinationMode,

    /// Path prefix stripped before the destination in path mode.
    pub path_prefix: String,

    /// Query parameter carrying the destination in query mode.
    pub query_param: String,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            mode: DestinationMode::Path,
            path_prefix: "/".to_string(),
            query_param: "url".to_string(),
        }
    }
}

/// Request forwarding policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Extra request headers dropped before forwarding (case-insensitive).
    pub strip_request_headers: Vec<String>,

    /// Drop proxy-chain hints (`X-Forwarded-*`, `Forwarded`, `X-Real-IP`).
    pub strip_forwarded_headers: bool,

    /// Methods whose request body is forwarded.
    pub body_methods: Vec<String>,

    /// If non-empty, every non-preflight request must carry at least one of these.
    pub require_headers: Vec<String>,

    /// `User-Agent` sent when the caller did not supply one.
    pub user_agent: String,

    /// Follow destination redirects.
    pub follow_redirects: bool,

    /// Maximum redirects followed before the call fails.
    pub max_redirects: usize,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            strip_request_headers: vec!["cookie".to_string(), "cookie2".to_string()],
            strip_forwarded_headers: true,
            body_methods: vec!["POST".to_string(), "PUT".to_string(), "PATCH".to_string()],
            require_headers: Vec::new(),
            user_agent: concat!("cors-relay/", env!("CARGO_PKG_VERSION")).to_string(),
            follow_redirects: true,
            max_redirects: 5,
        }
    }
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time for the outbound request/response in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
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

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Address of the metrics endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "cors_relay=info,tower_http=info".to_string(),
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
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.cors.allowed_origin, "*");
        assert_eq!(config.destination.mode, DestinationMode::Path);
        assert_eq!(config.forwarding.body_methods, vec!["POST", "PUT", "PATCH"]);
    }

    #[test]
    fn test_partial_section_override() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [destination]
            mode = "query"
            path_prefix = "/api/proxy"

            [cors]
            allowed_origin = "https://app.example"
            "#,
        )
        .unwrap();

        assert_eq!(config.destination.mode, DestinationMode::Query);
        assert_eq!(config.destination.query_param, "url");
        assert_eq!(config.cors.allowed_origin, "https://app.example");
        assert_eq!(config.cors.max_age_secs, 86_400);
    }
}
