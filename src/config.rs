//! Configuration management for Turnstile.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::ratelimit::{presets, LimitPolicy};

/// Main configuration for the Turnstile service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnstileConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,
}

impl Default for TurnstileConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            rate_limiting: RateLimitingConfig::default(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    "127.0.0.1:8080".parse().unwrap()
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Interval between sweeps of expired entries, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Policy guarding the service's own API
    #[serde(default = "default_guard_policy")]
    pub guard: LimitPolicy,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            guard: default_guard_policy(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_guard_policy() -> LimitPolicy {
    presets::RELAXED
}

impl TurnstileConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| crate::error::TurnstileError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TurnstileConfig::default();

        assert_eq!(config.server.listen_addr, default_listen_addr());
        assert_eq!(config.rate_limiting.sweep_interval_secs, 60);
        assert_eq!(config.rate_limiting.guard, presets::RELAXED);
    }

    #[test]
    fn test_parse_partial_config() {
        let yaml = r#"
server:
  listen_addr: "0.0.0.0:9000"
"#;
        let config = TurnstileConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.server.listen_addr, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.rate_limiting.guard, presets::RELAXED);
    }

    #[test]
    fn test_parse_guard_policy() {
        let yaml = r#"
rate_limiting:
  sweep_interval_secs: 30
  guard:
    limit: 10
    window_seconds: 5
"#;
        let config = TurnstileConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.rate_limiting.sweep_interval_secs, 30);
        assert_eq!(config.rate_limiting.guard, LimitPolicy::new(10, 5));
    }

    #[test]
    fn test_invalid_yaml_is_a_config_error() {
        let result = TurnstileConfig::from_yaml("server: [not, a, map]");
        assert!(matches!(
            result,
            Err(crate::error::TurnstileError::Config(_))
        ));
    }
}
