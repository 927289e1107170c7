// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

use crate::resource::DEFAULT_WELCOME_FILE;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub static_files: StaticFilesConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// Static resource roots
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct StaticFilesConfig {
    /// Folder inside the bundled asset tree
    #[serde(default)]
    pub packaged_root: Option<String>,
    /// Directory on the local filesystem
    #[serde(default)]
    pub external_root: Option<String>,
    #[serde(default = "default_welcome_file")]
    pub welcome_file: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_welcome_file() -> String {
    DEFAULT_WELCOME_FILE.to_string()
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            packaged_root: None,
            external_root: None,
            welcome_file: default_welcome_file(),
        }
    }
}

/// Health check configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HealthConfig {
    /// Enable health check endpoints
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    /// Liveness probe path (default: /healthz)
    #[serde(default = "default_healthz_path")]
    pub liveness_path: String,
    /// Readiness probe path (default: /readyz)
    #[serde(default = "default_readyz_path")]
    pub readiness_path: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_enabled() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_healthz_path() -> String {
    "/healthz".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_readyz_path() -> String {
    "/readyz".to_string()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            liveness_path: default_healthz_path(),
            readiness_path: default_readyz_path(),
        }
    }
}
