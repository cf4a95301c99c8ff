//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Environment variable naming the backend address.
pub const TARGET_URL_ENV: &str = "TARGET_URL";

/// Environment variable naming the listen port.
pub const PORT_ENV: &str = "PORT";

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (host and port).
    pub listener: ListenerConfig,

    /// The single backend this proxy fronts.
    pub target: TargetConfig,

    /// Cross-origin header policy.
    pub cors: CorsConfig,

    /// Timeout configuration for the outbound call.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Overlay `TARGET_URL` and `PORT` from the given lookup.
    ///
    /// Empty values are treated as unset so the file (or default) value wins.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(TARGET_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.target.url = url;
        }
        if let Some(port) = lookup(PORT_ENV).filter(|v| !v.trim().is_empty()) {
            self.listener.port = port;
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to listen on, kept as a string the way it arrives from the environment.
    pub port: String,
}

impl ListenerConfig {
    /// The `host:port` pair handed to the TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port.trim())
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: "8080".to_string(),
        }
    }
}

/// Backend target configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TargetConfig {
    /// Absolute URL of the backend. Empty selects the built-in fallback.
    pub url: String,
}

/// Cross-origin policy applied to every routed response.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Replace whatever `Access-Control-Allow-Origin` the backend sent with `*`.
    pub normalize_origin: bool,

    /// Value of `Access-Control-Allow-Methods`.
    pub allow_methods: String,

    /// Value of `Access-Control-Allow-Headers`.
    pub allow_headers: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            normalize_origin: true,
            allow_methods: "GET, POST, PUT, OPTIONS".to_string(),
            allow_headers: "Content-Type".to_string(),
        }
    }
}

/// Timeout configuration for the outbound call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the backend to produce response headers, in seconds.
    pub response_secs: u64,

    /// Longest pause allowed between body chunks in either direction, in seconds.
    pub read_secs: u64,

    /// How long an idle pooled connection is kept, in seconds.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            response_secs: 30,
            read_secs: 30,
            idle_secs: 60,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
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
    fn defaults_match_fallbacks() {
        let config = ProxyConfig::default();
        assert_eq!(config.listener.bind_address(), "0.0.0.0:8080");
        assert!(config.target.url.is_empty());
        assert!(config.cors.normalize_origin);
        assert_eq!(config.cors.allow_methods, "GET, POST, PUT, OPTIONS");
        assert_eq!(config.cors.allow_headers, "Content-Type");
    }

    #[test]
    fn env_overrides_target_and_port() {
        let mut config = ProxyConfig::default();
        config.apply_env(|key| match key {
            TARGET_URL_ENV => Some("http://backend:9000".to_string()),
            PORT_ENV => Some("3000".to_string()),
            _ => None,
        });
        assert_eq!(config.target.url, "http://backend:9000");
        assert_eq!(config.listener.port, "3000");
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = ProxyConfig::default();
        config.target.url = "http://from-file:1234".to_string();
        config.apply_env(|_| Some(String::new()));
        assert_eq!(config.target.url, "http://from-file:1234");
        assert_eq!(config.listener.port, "8080");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [target]
            url = "http://10.0.0.5:8080"

            [cors]
            normalize_origin = false

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.target.url, "http://10.0.0.5:8080");
        assert!(!config.cors.normalize_origin);
        assert_eq!(config.cors.allow_headers, "Content-Type");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.timeouts.connect_secs, 5);
    }
}
