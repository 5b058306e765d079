//! TOML configuration. Every field has a default so an empty file (or no
//! file at all) yields a working setup against the public services.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::resilience::{BreakerConfig, RetryPolicy};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub geocoder: GeocoderConfig,
    pub registry: RegistryConfig,
    pub probe: ProbeConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Nominatim-compatible search endpoint
    pub endpoint: String,
    /// Nominatim's usage policy requires an identifying User-Agent
    pub user_agent: String,
    pub country_codes: String,
    pub timeout_ms: u64,
    pub retry: RetryPolicy,
    pub breaker: BreakerConfig,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org/search".to_string(),
            user_agent: "prospect/0.1 (lead prospecting; contact@example.com)".to_string(),
            country_codes: "fr".to_string(),
            timeout_ms: 5_000,
            retry: RetryPolicy::default(),
            breaker: BreakerConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RegistryConfig {
    /// Base URL of the Sirene API; `/siret` is appended
    pub base_url: String,
    /// Falls back to synthetic data when absent
    pub api_key: Option<String>,
    pub max_results: usize,
    pub timeout_ms: u64,
    pub retry: RetryPolicy,
    pub breaker: BreakerConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.insee.fr/api-sirene/3.11".to_string(),
            api_key: None,
            max_results: 500,
            timeout_ms: 10_000,
            retry: RetryPolicy::default(),
            breaker: BreakerConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProbeConfig {
    pub enabled: bool,
    /// `{domain}` is replaced by each guessed domain
    pub url_template: String,
    pub timeout_ms: u64,
    /// Overall budget for the probe phase of one search
    pub budget_ms: u64,
    pub max_concurrency: usize,
    pub tlds: Vec<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url_template: "https://{domain}".to_string(),
            timeout_ms: 2_000,
            budget_ms: 5_000,
            max_concurrency: 16,
            tlds: vec!["fr".to_string(), "com".to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    pub request_deadline_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
            request_deadline_ms: 25_000,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [registry]
            api_key = "secret"

            [probe]
            enabled = false
            max_concurrency = 4

            [geocoder.retry]
            max_retries = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.registry.api_key.as_deref(), Some("secret"));
        assert_eq!(config.registry.max_results, 500);
        assert!(!config.probe.enabled);
        assert_eq!(config.probe.max_concurrency, 4);
        assert_eq!(config.probe.timeout_ms, 2_000);
        assert_eq!(config.geocoder.retry.max_retries, 0);
        assert_eq!(config.geocoder.retry.initial_backoff_ms, 200);
        assert_eq!(config.server.listen, "0.0.0.0:3000");
    }

    #[test]
    fn test_empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.registry.api_key.is_none());
        assert_eq!(config.geocoder.country_codes, "fr");
    }
}
