//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: MINIORG_, nested keys separated by `__`)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/miniorg/config.toml
//! 4. System directory: /etc/miniorg/config.toml
//! 5. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "MINIORG_";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Per-host rate limiting
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// GET response caching
    #[serde(default)]
    pub output_cache: OutputCacheConfig,

    /// Middleware configuration
    #[serde(default)]
    pub middleware: MiddlewareConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            port: default_port(),
            log_level: default_log_level(),
            timeout_secs: default_timeout(),
            environment: default_environment(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum idle connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Maximum retry attempts for establishing the pool
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retry attempts in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Apply embedded migrations on startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout_secs: default_connection_timeout(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay(),
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    /// In-memory database with a single connection, used by tests and demos
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Token bucket rate limiting, partitioned by the request's Host header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bucket capacity (requests allowed back to back)
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,

    /// Tokens replenished per second
    #[serde(default = "default_per_second")]
    pub per_second: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            burst_size: default_burst_size(),
            per_second: default_per_second(),
        }
    }
}

/// Output cache for successful GET responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputCacheConfig {
    /// Enable response caching
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// TTL for list and query routes
    #[serde(default = "default_cache_ttl")]
    pub default_ttl_secs: u64,

    /// TTL for single-entity detail routes
    #[serde(default = "default_detail_cache_ttl")]
    pub detail_ttl_secs: u64,

    /// Most responses held at once
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

impl Default for OutputCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl_secs: default_cache_ttl(),
            detail_ttl_secs: default_detail_cache_ttl(),
            max_entries: default_cache_max_entries(),
        }
    }
}

impl OutputCacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn detail_ttl(&self) -> Duration {
        Duration::from_secs(self.detail_ttl_secs)
    }
}

/// Middleware configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Request body size limit in MB
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,

    /// CORS mode: permissive, restrictive or disabled
    #[serde(default = "default_cors_mode")]
    pub cors_mode: String,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            body_limit_mb: default_body_limit_mb(),
            cors_mode: default_cors_mode(),
        }
    }
}

// Default value functions
fn default_service_name() -> String {
    "miniorg".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_database_url() -> String {
    "sqlite://miniorg.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1
}

fn default_true() -> bool {
    true
}

fn default_burst_size() -> u32 {
    3
}

fn default_per_second() -> u32 {
    5
}

fn default_cache_ttl() -> u64 {
    10
}

fn default_detail_cache_ttl() -> u64 {
    30
}

fn default_cache_max_entries() -> usize {
    crate::middleware::output_cache::DEFAULT_MAX_ENTRIES
}

fn default_body_limit_mb() -> usize {
    10
}

fn default_cors_mode() -> String {
    "permissive".to_string()
}

impl Config {
    /// Load configuration from all sources
    ///
    /// Searches for config files in this order (highest priority first):
    /// 1. Current working directory: ./config.toml
    /// 2. XDG config directory: ~/.config/miniorg/config.toml
    /// 3. System directory: /etc/miniorg/config.toml
    ///
    /// Environment variables (MINIORG_ prefix) override all file-based configs.
    pub fn load() -> Result<Self> {
        let config_paths = Self::find_config_paths();

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Lowest priority first so later merges win
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Bypasses the search path. Environment variables still apply.
    pub fn load_from(path: &str) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// Configuration for tests: in-memory database, no rate limiting, no caching
    pub fn for_tests() -> Self {
        Self {
            database: DatabaseConfig::in_memory(),
            rate_limit: RateLimitConfig {
                enabled: false,
                ..RateLimitConfig::default()
            },
            output_cache: OutputCacheConfig {
                enabled: false,
                ..OutputCacheConfig::default()
            },
            ..Self::default()
        }
    }

    fn find_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix("miniorg");
        if let Some(path) = xdg_dirs.find_config_file("config.toml") {
            paths.push(path);
        }

        paths.push(PathBuf::from("/etc/miniorg/config.toml"));
        paths
    }
}
