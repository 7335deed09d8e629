//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use catalog_client::{CatalogConfig, RetryPolicy};
use messaging::Destinations;

/// Log output format for the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`: bind address (default `0.0.0.0:9002`)
/// - `RUST_LOG`: tracing filter directive (default `info`)
/// - `LOG_FORMAT`: `text` or `json` (default `text`)
/// - `DATABASE_URL`: PostgreSQL connection string; unset selects the
///   in-memory repository
/// - `CATALOG_SERVICE_URI`, `CATALOG_TIMEOUT_MS`, `CATALOG_RETRY_ATTEMPTS`,
///   `CATALOG_RETRY_BACKOFF_MS`: catalog client settings
/// - `ORDER_ACCEPTED_DESTINATION`, `ORDER_DISPATCHED_DESTINATION`: message
///   destinations
///
/// Unparseable numbers fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub catalog: CatalogConfig,
    pub destinations: Destinations,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let retry = RetryPolicy::builder()
            .max_attempts(
                parse_var(&lookup, "CATALOG_RETRY_ATTEMPTS")
                    .unwrap_or(defaults.catalog.retry.max_attempts),
            )
            .initial_backoff(
                parse_var(&lookup, "CATALOG_RETRY_BACKOFF_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.catalog.retry.initial_backoff),
            )
            .build();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.log_format),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            catalog: CatalogConfig {
                base_url: lookup("CATALOG_SERVICE_URI").unwrap_or(defaults.catalog.base_url),
                timeout: parse_var(&lookup, "CATALOG_TIMEOUT_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.catalog.timeout),
                retry,
            },
            destinations: Destinations {
                order_accepted: lookup("ORDER_ACCEPTED_DESTINATION")
                    .unwrap_or(defaults.destinations.order_accepted),
                order_dispatched: lookup("ORDER_DISPATCHED_DESTINATION")
                    .unwrap_or(defaults.destinations.order_dispatched),
            },
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Reads and parses `key`; missing or unparseable values yield `None`.
fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9002,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            catalog: CatalogConfig::default(),
            destinations: Destinations::default(),
        }
    }
}
