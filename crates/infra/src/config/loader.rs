//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `BODYLOG_DB_PATH`: Database file path (required)
//! - `BODYLOG_DB_POOL_SIZE`: Connection pool size (required)
//! - `BODYLOG_SYNC_BASE_URL`: Backend API base URL
//! - `BODYLOG_SYNC_INTERVAL`: Drain interval in seconds
//! - `BODYLOG_SYNC_ENABLED`: Whether backend sync is enabled (true/false)
//! - `BODYLOG_PROVIDER_INTERVAL`: Reconcile interval in seconds
//! - `BODYLOG_PROVIDER_READ_ENABLED`: Provider read access (true/false)
//! - `BODYLOG_PROVIDER_WRITE_ENABLED`: Provider write access (true/false)

use std::path::{Path, PathBuf};

use bodylog_domain::{
    BodylogError, Config, DatabaseConfig, ProviderConfig, Result, SyncConfig,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variables are missing, falls back to loading from a config file.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The database path and pool size are required; sync and provider
/// settings fall back to their defaults when unset.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("BODYLOG_DB_PATH")?;
    let db_pool_size = env_var("BODYLOG_DB_POOL_SIZE").and_then(|s| {
        s.parse::<u32>().map_err(|e| BodylogError::Config(format!("Invalid pool size: {e}")))
    })?;

    let sync_defaults = SyncConfig::default();
    let sync_base_url =
        std::env::var("BODYLOG_SYNC_BASE_URL").unwrap_or(sync_defaults.base_url);
    let sync_interval = env_u64("BODYLOG_SYNC_INTERVAL", sync_defaults.interval_seconds)?;
    let sync_enabled = env_bool("BODYLOG_SYNC_ENABLED", sync_defaults.enabled);

    let provider_defaults = ProviderConfig::default();
    let provider_interval =
        env_u64("BODYLOG_PROVIDER_INTERVAL", provider_defaults.interval_seconds)?;
    let provider_read = env_bool("BODYLOG_PROVIDER_READ_ENABLED", provider_defaults.read_enabled);
    let provider_write =
        env_bool("BODYLOG_PROVIDER_WRITE_ENABLED", provider_defaults.write_enabled);

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size: db_pool_size },
        sync: SyncConfig {
            base_url: sync_base_url,
            interval_seconds: sync_interval,
            enabled: sync_enabled,
        },
        provider: ProviderConfig {
            interval_seconds: provider_interval,
            read_enabled: provider_read,
            write_enabled: provider_write,
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(BodylogError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            BodylogError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BodylogError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| BodylogError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| BodylogError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(BodylogError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the working directory, two parent levels, and the executable
/// directory for `config.{json,toml}` and `bodylog.{json,toml}`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("bodylog.json"),
            cwd.join("bodylog.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("bodylog.json"),
                exe_dir.join("bodylog.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| BodylogError::Config(format!("Missing required environment variable: {key}")))
}

fn env_u64(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|e| BodylogError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
