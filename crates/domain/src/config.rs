//! Configuration structures

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DRAIN_INTERVAL_SECS, DEFAULT_RECONCILE_INTERVAL_SECS};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub provider: ProviderConfig,
}

/// Local database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// Backend sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the remote backend API
    pub base_url: String,
    /// Drain interval in seconds
    pub interval_seconds: u64,
    pub enabled: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.bodylog.app/v1".to_string(),
            interval_seconds: DEFAULT_DRAIN_INTERVAL_SECS,
            enabled: true,
        }
    }
}

/// External health-data provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Reconciliation interval in seconds
    pub interval_seconds: u64,
    /// Whether the user has granted read access to provider data
    pub read_enabled: bool,
    /// Whether the user has granted write access to provider data
    pub write_enabled: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_RECONCILE_INTERVAL_SECS,
            read_enabled: false,
            write_enabled: false,
        }
    }
}
