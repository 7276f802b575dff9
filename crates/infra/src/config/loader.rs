//! Configuration loader
//!
//! Loads [`TallyConfig`] from a config file and/or environment variables.
//!
//! ## Loading Strategy
//! 1. Probe the standard locations for a config file
//! 2. If one is found, parse it (JSON or TOML, by extension)
//! 3. Otherwise start from the defaults
//! 4. Apply environment overrides on top
//!
//! ## Environment Variables
//! - `TALLY_HOST`: Tally server host
//! - `TALLY_PORT`: Tally XML server port
//! - `TALLY_COMPANY`: default company name
//! - `TALLY_TIMEOUT`: per-request timeout (`30s`, `2m`, bare seconds)
//! - `TALLY_MAX_RETRIES`: retries after the first attempt
//! - `TALLY_RETRY_DELAY`: initial backoff (`500ms`, `1s`, bare milliseconds)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./tally.{toml,json}` then `./config.{toml,json}`
//! 2. The same names in the parent and grandparent directory
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::time::Duration;

use tallybridge_domain::{Result, TallyConfig, TallyError};

pub const ENV_HOST: &str = "TALLY_HOST";
pub const ENV_PORT: &str = "TALLY_PORT";
pub const ENV_COMPANY: &str = "TALLY_COMPANY";
pub const ENV_TIMEOUT: &str = "TALLY_TIMEOUT";
pub const ENV_MAX_RETRIES: &str = "TALLY_MAX_RETRIES";
pub const ENV_RETRY_DELAY: &str = "TALLY_RETRY_DELAY";

const CONFIG_FILE_NAMES: [&str; 4] = ["tally.toml", "tally.json", "config.toml", "config.json"];

/// Load configuration from the first config file found, then the
/// environment.
///
/// Without a config file the defaults are used as the base.
///
/// # Errors
/// Returns `TallyError::Config` if a found file cannot be parsed or an
/// environment variable holds an invalid value.
pub fn load() -> Result<TallyConfig> {
    let base = match probe_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, using defaults");
            TallyConfig::default()
        }
    };

    let config = apply_env_overrides(base)?;
    tracing::info!(
        base_url = %config.base_url(),
        company = config.company().unwrap_or(""),
        max_retries = config.max_retries,
        "Tally configuration loaded"
    );
    Ok(config)
}

/// Load configuration from defaults plus environment variables only.
///
/// # Errors
/// Returns `TallyError::Config` if a variable has an invalid value.
pub fn load_from_env() -> Result<TallyConfig> {
    apply_env_overrides(TallyConfig::default())
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Environment
/// overrides are not applied here.
///
/// # Errors
/// Returns `TallyError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<TallyConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(TallyError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            TallyError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| TallyError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Overlay the `TALLY_*` environment variables onto `config`.
///
/// Unset or empty variables leave the existing value alone.
///
/// # Errors
/// Returns `TallyError::Config` naming the offending variable.
pub fn apply_env_overrides(mut config: TallyConfig) -> Result<TallyConfig> {
    if let Some(host) = env_value(ENV_HOST) {
        config.host = host;
    }

    if let Some(port) = env_value(ENV_PORT) {
        config.port = port
            .parse::<u16>()
            .map_err(|e| TallyError::Config(format!("Invalid {ENV_PORT} {port:?}: {e}")))?;
    }

    // An explicitly empty company clears the file value.
    if let Ok(company) = std::env::var(ENV_COMPANY) {
        config.company = company.trim().to_string();
    }

    if let Some(timeout) = env_value(ENV_TIMEOUT) {
        let timeout = parse_duration(&timeout, Duration::from_secs)
            .ok_or_else(|| TallyError::Config(format!("Invalid {ENV_TIMEOUT}: {timeout:?}")))?;
        config.timeout_secs = timeout.as_secs().max(1);
    }

    if let Some(retries) = env_value(ENV_MAX_RETRIES) {
        config.max_retries = retries.parse::<u32>().map_err(|e| {
            TallyError::Config(format!("Invalid {ENV_MAX_RETRIES} {retries:?}: {e}"))
        })?;
    }

    if let Some(delay) = env_value(ENV_RETRY_DELAY) {
        let delay = parse_duration(&delay, Duration::from_millis)
            .ok_or_else(|| TallyError::Config(format!("Invalid {ENV_RETRY_DELAY}: {delay:?}")))?;
        config.retry_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    }

    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `TallyError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<TallyConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| TallyError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| TallyError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(TallyError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the working directory, its two nearest ancestors, then the
/// executable's directory.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend(cwd.ancestors().take(3).map(Path::to_path_buf));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Non-empty, trimmed environment variable.
fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Parse `500ms`, `30s`, `2m` or a bare integer in `bare_unit`.
fn parse_duration(raw: &str, bare_unit: fn(u64) -> Duration) -> Option<Duration> {
    let raw = raw.trim();
    let split = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let value = digits.parse::<u64>().ok()?;

    match unit.trim() {
        "" => Some(bare_unit(value)),
        "ms" => Some(Duration::from_millis(value)),
        "s" => Some(Duration::from_secs(value)),
        "m" => Some(Duration::from_secs(value.checked_mul(60)?)),
        _ => None,
    }
}
