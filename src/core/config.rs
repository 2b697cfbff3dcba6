//! # Configuration Module
//!
//! Gateway configuration loaded from YAML with `serde_yaml`, overridden from the
//! environment, and validated before anything else starts.
//!
//! ## Sources, in order of precedence
//! 1. Environment variables (`GATEWAY_*`, see [`GatewayConfig::apply_env_overrides`])
//! 2. The YAML file named by `CONFIG_PATH`, else `config.yaml`, else `./config/gateway.yaml`
//! 3. Built-in defaults; every section and field may be omitted from the file
//!
//! Durations are written in humantime form (`500ms`, `10s`, `1m`).

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::core::error::{GatewayError, GatewayResult};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const FALLBACK_CONFIG_PATH: &str = "./config/gateway.yaml";

/// Main gateway configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP listener settings
    pub server: ServerConfig,

    /// Product service connection
    pub backend: BackendConfig,

    /// Identity attached to backend calls
    pub telemetry: TelemetryConfig,

    pub logging: LoggingConfig,

    pub metrics: MetricsConfig,
}

impl GatewayConfig {
    /// Pick the configuration file to load
    ///
    /// `CONFIG_PATH` is used as given; otherwise the first existing default location
    /// wins. `None` means run on defaults plus environment.
    pub fn resolve_path() -> Option<PathBuf> {
        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }

        [DEFAULT_CONFIG_PATH, FALLBACK_CONFIG_PATH]
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Load configuration from a YAML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        Self::load_from_file_with(path, |key| env::var(key).ok()).await
    }

    /// Load a file and apply overrides from `lookup` instead of the process environment
    pub async fn load_from_file_with<P, F>(path: P, lookup: F) -> GatewayResult<Self>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            GatewayError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let mut config = Self::from_yaml(&content)?;
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for runs without a file
    pub fn from_env() -> GatewayResult<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> GatewayResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply environment variable overrides to configuration
    ///
    /// Recognized variables: `GATEWAY_SERVER_PORT`, `GATEWAY_BIND_ADDRESS`,
    /// `GATEWAY_BACKEND_HOST`, `GATEWAY_BACKEND_PORT`, `GATEWAY_BACKEND_TIMEOUT`,
    /// `GATEWAY_BACKEND_MODE`, `GATEWAY_LOG_LEVEL`, `GATEWAY_LOG_FORMAT`,
    /// `GATEWAY_METRICS_ENABLED`.
    pub fn apply_env_overrides(&mut self) -> GatewayResult<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> GatewayResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: FromStr>(key: &str, value: String) -> GatewayResult<T>
        where
            T::Err: fmt::Display,
        {
            value
                .parse()
                .map_err(|e| GatewayError::config(format!("Invalid {}: {}", key, e)))
        }

        if let Some(port) = lookup("GATEWAY_SERVER_PORT") {
            self.server.gateway_port = parsed("GATEWAY_SERVER_PORT", port)?;
        }

        if let Some(addr) = lookup("GATEWAY_BIND_ADDRESS") {
            self.server.bind_address = addr;
        }

        if let Some(host) = lookup("GATEWAY_BACKEND_HOST") {
            self.backend.host = host;
        }

        if let Some(port) = lookup("GATEWAY_BACKEND_PORT") {
            self.backend.port = parsed("GATEWAY_BACKEND_PORT", port)?;
        }

        if let Some(timeout) = lookup("GATEWAY_BACKEND_TIMEOUT") {
            self.backend.request_timeout = humantime::parse_duration(&timeout)
                .map_err(|e| GatewayError::config(format!("Invalid GATEWAY_BACKEND_TIMEOUT: {}", e)))?;
        }

        if let Some(mode) = lookup("GATEWAY_BACKEND_MODE") {
            self.backend.mode = parsed("GATEWAY_BACKEND_MODE", mode)?;
        }

        if let Some(level) = lookup("GATEWAY_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = lookup("GATEWAY_LOG_FORMAT") {
            self.logging.format = parsed("GATEWAY_LOG_FORMAT", format)?;
        }

        if let Some(enabled) = lookup("GATEWAY_METRICS_ENABLED") {
            self.metrics.enabled = parsed("GATEWAY_METRICS_ENABLED", enabled)?;
        }

        Ok(())
    }

    /// Validate the whole configuration, reporting every problem at once
    pub fn validate(&self) -> GatewayResult<()> {
        let mut errors = Vec::new();

        if self.server.gateway_port == 0 {
            errors.push("server.gateway_port must be greater than 0".to_string());
        }
        if self.server.bind_address.is_empty() {
            errors.push("server.bind_address cannot be empty".to_string());
        } else if self.server.socket_addr().is_err() {
            errors.push(format!(
                "server.bind_address is not a valid IP address: {}",
                self.server.bind_address
            ));
        }
        if self.server.max_body_size == 0 {
            errors.push("server.max_body_size must be greater than 0".to_string());
        }

        if self.backend.mode == BackendMode::Grpc {
            if self.backend.host.is_empty() {
                errors.push("backend.host cannot be empty".to_string());
            }
            if self.backend.port == 0 {
                errors.push("backend.port must be greater than 0".to_string());
            }
        }
        if self.backend.connect_timeout.is_zero() {
            errors.push("backend.connect_timeout must be greater than 0".to_string());
        }
        if self.backend.request_timeout.is_zero() {
            errors.push("backend.request_timeout must be greater than 0".to_string());
        }

        if self.telemetry.client_id.is_empty() {
            errors.push("telemetry.client_id cannot be empty".to_string());
        }
        if self.telemetry.user_id.is_empty() {
            errors.push("telemetry.user_id cannot be empty".to_string());
        }

        if !["trace", "debug", "info", "warn", "error"]
            .contains(&self.logging.level.to_lowercase().as_str())
        {
            errors.push(format!("logging.level is not a valid level: {}", self.logging.level));
        }

        if !self.metrics.endpoint.starts_with('/') {
            errors.push(format!("metrics.endpoint must start with '/': {}", self.metrics.endpoint));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::config(format!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            )))
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub gateway_port: u16,
    /// Largest accepted request body, in bytes
    pub max_body_size: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> GatewayResult<SocketAddr> {
        let ip = self
            .bind_address
            .parse()
            .map_err(|e| GatewayError::config(format!("Invalid bind address {}: {}", self.bind_address, e)))?;
        Ok(SocketAddr::new(ip, self.gateway_port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            gateway_port: 8080,
            max_body_size: 1024 * 1024,
        }
    }
}

/// Which [`crate::backend::ProductBackend`] the gateway uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendMode {
    /// Remote product service over gRPC
    Grpc,
    /// Process-local store
    InMemory,
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grpc => f.write_str("grpc"),
            Self::InMemory => f.write_str("in_memory"),
        }
    }
}

impl FromStr for BackendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grpc" => Ok(Self::Grpc),
            "in_memory" | "memory" => Ok(Self::InMemory),
            other => Err(format!("unknown backend mode {:?} (expected grpc or in_memory)", other)),
        }
    }
}

/// Product service connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub mode: BackendMode,
    pub host: String,
    pub port: u16,

    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Deadline applied to every backend call
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// gzip request and response messages
    pub compression: bool,
}

impl BackendConfig {
    pub fn endpoint_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::Grpc,
            host: "localhost".to_string(),
            port: 50051,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            compression: false,
        }
    }
}

/// Identity sent with every backend call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub client_id: String,
    pub user_id: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            client_id: "web-api-client-us-east-1".to_string(),
            user_id: "some-test-user-id".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "pretty" => Ok(Self::Text),
            other => Err(format!("unknown log format {:?} (expected json or text)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Path serving the Prometheus scrape output
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "/metrics".to_string(),
        }
    }
}
