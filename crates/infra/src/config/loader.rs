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
//! Required:
//! - `COURSE_EXPORT_API_URL`: Endpoint receiving the completion `PUT`
//! - `COURSE_EXPORT_API_TOKEN`: Bearer token for the endpoint
//! - `COURSE_EXPORT_DB_PATH`: SQLite database file path
//!
//! Optional (defaults in parentheses):
//! - `COURSE_EXPORT_DB_POOL_SIZE`: Connection pool size (4)
//! - `COURSE_EXPORT_WORKER_POLL_MS`: Task poll interval in milliseconds (1000)
//! - `COURSE_EXPORT_WORKER_BATCH_SIZE`: Tasks claimed per poll (20)
//! - `COURSE_EXPORT_WORKER_CONCURRENCY`: Exports running at once (1)
//! - `COURSE_EXPORT_LOG_LEVEL`: `EnvFilter` directive (`info`)
//! - `COURSE_EXPORT_LOG_JSON`: JSON log output, true/false (false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./course-export.json` or `./course-export.toml` (current working
//!    directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use course_export_domain::{
    ApiConfig, Config, CourseExportError, DatabaseConfig, LoggingConfig, Result, WorkerConfig,
};

pub const ENV_API_URL: &str = "COURSE_EXPORT_API_URL";
pub const ENV_API_TOKEN: &str = "COURSE_EXPORT_API_TOKEN";
pub const ENV_DB_PATH: &str = "COURSE_EXPORT_DB_PATH";
pub const ENV_DB_POOL_SIZE: &str = "COURSE_EXPORT_DB_POOL_SIZE";
pub const ENV_WORKER_POLL_MS: &str = "COURSE_EXPORT_WORKER_POLL_MS";
pub const ENV_WORKER_BATCH_SIZE: &str = "COURSE_EXPORT_WORKER_BATCH_SIZE";
pub const ENV_WORKER_CONCURRENCY: &str = "COURSE_EXPORT_WORKER_CONCURRENCY";
pub const ENV_LOG_LEVEL: &str = "COURSE_EXPORT_LOG_LEVEL";
pub const ENV_LOG_JSON: &str = "COURSE_EXPORT_LOG_JSON";

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `CourseExportError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
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
/// # Errors
/// Returns `CourseExportError::Config` if required variables are missing
/// or any variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let api = ApiConfig::new(env_var(ENV_API_URL)?, env_var(ENV_API_TOKEN)?);

    let database = DatabaseConfig {
        path: env_var(ENV_DB_PATH)?,
        pool_size: env_parse(ENV_DB_POOL_SIZE, "pool size")?.unwrap_or(4),
    };

    let defaults = WorkerConfig::default();
    let worker = WorkerConfig {
        poll_interval_ms: env_parse(ENV_WORKER_POLL_MS, "poll interval")?
            .unwrap_or(defaults.poll_interval_ms),
        batch_size: env_parse(ENV_WORKER_BATCH_SIZE, "batch size")?
            .unwrap_or(defaults.batch_size),
        concurrency: env_parse(ENV_WORKER_CONCURRENCY, "worker concurrency")?
            .unwrap_or(defaults.concurrency),
        join_timeout_ms: defaults.join_timeout_ms,
    };

    let logging = LoggingConfig {
        level: std::env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| LoggingConfig::default().level),
        json: env_bool(ENV_LOG_JSON, false),
    };

    Ok(Config { api, database, worker, logging })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `CourseExportError::Config` if the file is missing, unreadable
/// or not a valid configuration.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CourseExportError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CourseExportError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CourseExportError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format chosen by extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CourseExportError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CourseExportError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(CourseExportError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations and return the first config file found.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 6] = [
        "config.json",
        "config.toml",
        "course-export.json",
        "course-export.toml",
        "../config.json",
        "../config.toml",
    ];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf)) {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
pub(crate) fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        CourseExportError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional numeric environment variable; unset yields `None`.
fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| CourseExportError::Config(format!("Invalid {what}: {e}"))),
        Err(_) => Ok(None),
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
