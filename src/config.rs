//! Configuration management for tronwatch
//!
//! Loads configuration from YAML files and environment variables.
//! Environment variables override YAML values.
//!
//! This covers process-level configuration only (bind address, database
//! path, job cadence). Operator-tunable values such as retention windows
//! and the whale threshold live in the database and are read through
//! [`crate::settings::SettingsCache`].

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Chain parameters of the observed network
    #[serde(default)]
    pub chain: ChainConfig,
    /// Background job cadence
    #[serde(default)]
    pub jobs: JobsConfig,
    /// Pool membership discovery
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// In-memory cache sizing
    #[serde(default)]
    pub cache: CacheConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/tronwatch.db")
}

fn default_max_connections() -> u32 {
    5
}

/// Chain parameters
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    /// Seconds between produced blocks (TRON mainnet: 3)
    #[serde(default = "default_block_interval_secs")]
    pub block_interval_secs: u64,
}

fn default_block_interval_secs() -> u64 {
    3
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            block_interval_secs: default_block_interval_secs(),
        }
    }
}

/// Background job cadence
#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    /// Interval between summation aggregator runs (seconds)
    #[serde(default = "default_summation_interval_secs")]
    pub summation_interval_secs: u64,
    /// Enable the purge job
    #[serde(default = "default_purge_enabled")]
    pub purge_enabled: bool,
}

fn default_summation_interval_secs() -> u64 {
    600
}

fn default_purge_enabled() -> bool {
    true
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            summation_interval_secs: default_summation_interval_secs(),
            purge_enabled: default_purge_enabled(),
        }
    }
}

/// Pool membership discovery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Enable the discovery background loop
    #[serde(default)]
    pub enabled: bool,
    /// Full-node HTTP endpoint used to read account permissions
    #[serde(default = "default_discovery_endpoint")]
    pub endpoint: String,
    /// Interval between discovery cycles (seconds)
    #[serde(default = "default_discovery_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_discovery_endpoint() -> String {
    "https://api.trongrid.io".to_string()
}

fn default_discovery_interval_secs() -> u64 {
    300
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_discovery_endpoint(),
            poll_interval_secs: default_discovery_interval_secs(),
        }
    }
}

/// In-memory cache sizing
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Capacity of the sampled-summations response cache
    #[serde(default = "default_query_cache_capacity")]
    pub query_capacity: usize,
    /// Capacity of the pool membership lookup cache
    #[serde(default = "default_membership_cache_capacity")]
    pub membership_capacity: usize,
    /// TTL for membership lookup entries (seconds)
    #[serde(default = "default_membership_cache_ttl_secs")]
    pub membership_ttl_secs: i64,
}

fn default_query_cache_capacity() -> usize {
    256
}

fn default_membership_cache_capacity() -> usize {
    4096
}

fn default_membership_cache_ttl_secs() -> i64 {
    600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            query_capacity: default_query_cache_capacity(),
            membership_capacity: default_membership_cache_capacity(),
            membership_ttl_secs: default_membership_cache_ttl_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (TRONWATCH_*)
    /// 2. config/config.yaml (if exists)
    /// 3. config.yaml (if exists)
    /// 4. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.path", "data/tronwatch.db")?
            .set_default("database.max_connections", 5)?
            // Load from config files (lower priority)
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name("config/config").required(false))
            // Override with environment variables (highest priority)
            // TRONWATCH_SERVER__PORT=8081 -> server.port = 8081
            .add_source(
                Environment::with_prefix("TRONWATCH")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(","),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs.summation_interval_secs == 0 {
            return Err(ConfigError::Message(
                "jobs.summation_interval_secs must be positive".to_string(),
            ));
        }

        if self.chain.block_interval_secs == 0 {
            return Err(ConfigError::Message(
                "chain.block_interval_secs must be positive".to_string(),
            ));
        }

        if self.discovery.enabled && self.discovery.endpoint.is_empty() {
            return Err(ConfigError::Message(
                "discovery.endpoint must be set when discovery is enabled".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(default_port(), 8080);
        assert_eq!(default_block_interval_secs(), 3);
        assert_eq!(default_summation_interval_secs(), 600);
    }

    #[test]
    fn test_validate_rejects_zero_intervals() {
        let mut config = AppConfig {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            database: DatabaseConfig {
                path: default_db_path(),
                max_connections: default_max_connections(),
            },
            chain: ChainConfig::default(),
            jobs: JobsConfig::default(),
            discovery: DiscoveryConfig::default(),
            cache: CacheConfig::default(),
        };
        assert!(config.validate().is_ok());

        config.jobs.summation_interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
