//! # Structured Logging
//!
//! Installs the global `tracing` subscriber: a registry with an `EnvFilter` and a
//! `fmt` layer that writes either JSON lines or human-readable text.
//!
//! `RUST_LOG` takes precedence when set; otherwise the configured level applies to
//! this crate and to `tower_http` request spans.

use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::core::config::{LogFormat, LoggingConfig};
use crate::core::error::{GatewayError, GatewayResult};

const VALID_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Filter directives used when `RUST_LOG` is not set
pub fn default_directives(level: &str) -> String {
    format!("product_gateway={level},tower_http={level},warn", level = level)
}

/// Build the filter for the configured level
pub fn build_filter(config: &LoggingConfig) -> GatewayResult<EnvFilter> {
    let level = config.level.to_lowercase();
    if !VALID_LEVELS.contains(&level.as_str()) {
        return Err(GatewayError::config(format!("Invalid log level: {}", config.level)));
    }

    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_directives(&level))
            .map_err(|e| GatewayError::config(format!("Invalid log filter: {}", e))),
    }
}

/// Install the global subscriber
///
/// A second call keeps the first subscriber and only warns.
pub fn init_logging(config: &LoggingConfig) -> GatewayResult<()> {
    let filter = build_filter(config)?;

    let result = match config.format {
        LogFormat::Json => Registry::default()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init(),
        LogFormat::Text => Registry::default()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init(),
    };

    if result.is_err() {
        warn!("Tracing subscriber already initialized, skipping initialization");
        return Ok(());
    }

    info!(level = %config.level, format = ?config.format, "Structured logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_crate_and_http_spans() {
        let directives = default_directives("debug");
        assert!(directives.contains("product_gateway=debug"));
        assert!(directives.contains("tower_http=debug"));
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let config = LoggingConfig {
            level: "loud".to_string(),
            format: LogFormat::Text,
        };
        assert!(build_filter(&config).is_err());
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let config = LoggingConfig {
            level: "INFO".to_string(),
            format: LogFormat::Json,
        };
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }
}
