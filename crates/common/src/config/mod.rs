//! Configuration management for Citegraph services
//!
//! Layered sources, later ones win:
//! - `config/default`, `config/{APP_ENV}`, `config/local` (any format the
//!   `config` crate reads)
//! - `APP__SECTION__KEY` environment variables
//!
//! Only `database.url` is required; every analytics knob has a default.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Analytics job configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL (for writes)
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyticsConfig {
    /// Authors per page (and per bulk write) in the h-index fill job
    #[serde(default = "default_h_index_batch_size")]
    pub h_index_batch_size: usize,

    /// Log fill-job progress every this many authors
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,

    /// Upper bound on papers scanned by the corpus graph build
    #[serde(default = "default_graph_max_papers")]
    pub graph_max_papers: u64,

    /// Log corpus graph progress every this many papers
    #[serde(default = "default_graph_log_interval")]
    pub graph_log_interval: u64,

    /// Page size for cursor scans
    #[serde(default = "default_scan_batch_size")]
    pub scan_batch_size: usize,

    /// Maximum ego graphs kept in the in-process cache
    #[serde(default = "default_ego_cache_capacity")]
    pub ego_cache_capacity: usize,

    /// Lifetime of a cached ego graph in seconds
    #[serde(default = "default_ego_cache_ttl")]
    pub ego_cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for logs and metrics
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_h_index_batch_size() -> usize { 1000 }
fn default_progress_interval() -> u64 { 10_000 }
fn default_graph_max_papers() -> u64 { 1_000_000 }
fn default_graph_log_interval() -> u64 { 100_000 }
fn default_scan_batch_size() -> usize { 1000 }
fn default_ego_cache_capacity() -> usize { 1024 }
fn default_ego_cache_ttl() -> u64 { 600 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 0 }
fn default_service_name() -> String { "citegraph".to_string() }

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            h_index_batch_size: default_h_index_batch_size(),
            progress_interval: default_progress_interval(),
            graph_max_papers: default_graph_max_papers(),
            graph_log_interval: default_graph_log_interval(),
            scan_batch_size: default_scan_batch_size(),
            ego_cache_capacity: default_ego_cache_capacity(),
            ego_cache_ttl_secs: default_ego_cache_ttl(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load the layered configuration for the current `APP_ENV`
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g. APP__ANALYTICS__H_INDEX_BATCH_SIZE=500
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load one explicit file plus environment overrides
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }
}

impl AnalyticsConfig {
    /// Ego graph cache TTL; `None` when set to 0 (no expiry)
    pub fn ego_cache_ttl(&self) -> Option<Duration> {
        (self.ego_cache_ttl_secs > 0).then(|| Duration::from_secs(self.ego_cache_ttl_secs))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgres://localhost/citegraph".to_string(),
                read_url: None,
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
            },
            analytics: AnalyticsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}
