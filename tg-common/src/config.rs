//! Configuration loading and resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument or environment variable (handled by the binary)
//! 2. TOML config file
//! 3. Compiled default
//!
//! A missing or broken TOML file never stops startup; the compiled defaults
//! apply and the problem is handed back for logging.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Directory name used under the platform config/data directories
pub const APP_DIR_NAME: &str = "trackguessr";

/// Bootstrap configuration read from TOML
///
/// All fields are optional; anything left out falls back to [`CompiledDefaults`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the quiz backend (no trailing path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,

    /// File holding best scores and the leaderboard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,

    /// Pause between "round complete" and returning to the menu
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_reset_delay_ms: Option<u64>,

    /// Quiz request timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Built-in fallbacks for every setting
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub backend_url: String,
    pub data_file: PathBuf,
    pub round_reset_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl CompiledDefaults {
    /// Defaults for the platform this binary runs on
    pub fn for_current_platform() -> Self {
        let data_dir = dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(format!("./{}_data", APP_DIR_NAME)));

        Self {
            backend_url: "http://127.0.0.1:5000".to_string(),
            data_file: data_dir.join("scores.json"),
            round_reset_delay_ms: 2500,
            request_timeout_secs: 30,
            log_level: default_log_level(),
        }
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub backend_url: Option<String>,
    pub data_file: Option<PathBuf>,
    pub round_reset_delay_ms: Option<u64>,
    pub log_level: Option<String>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend_url: String,
    pub data_file: PathBuf,
    pub round_reset_delay: Duration,
    pub request_timeout: Duration,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Merge overrides, TOML values and compiled defaults, in that priority
    pub fn resolve(overrides: SettingsOverrides, toml: TomlConfig, defaults: CompiledDefaults) -> Self {
        let TomlConfig {
            backend_url,
            data_file,
            round_reset_delay_ms,
            request_timeout_secs,
            logging,
        } = toml;

        let backend_url = overrides
            .backend_url
            .or(backend_url)
            .unwrap_or(defaults.backend_url);
        let round_reset_delay_ms = overrides
            .round_reset_delay_ms
            .or(round_reset_delay_ms)
            .unwrap_or(defaults.round_reset_delay_ms);
        let log_level = match overrides.log_level {
            Some(level) => level,
            None if logging.level.trim().is_empty() => defaults.log_level,
            None => logging.level,
        };

        Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            data_file: overrides.data_file.or(data_file).unwrap_or(defaults.data_file),
            round_reset_delay: Duration::from_millis(round_reset_delay_ms),
            request_timeout: Duration::from_secs(
                request_timeout_secs.unwrap_or(defaults.request_timeout_secs),
            ),
            log_level,
            log_file: logging.file,
        }
    }
}

/// Default config file location (`<config dir>/trackguessr/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Load the config file if there is one, falling back to an empty config
///
/// `explicit` is a path the user asked for; otherwise the default location is
/// tried. A file that cannot be used yields the defaults plus a description of
/// the problem, so callers can report it once logging is set up.
pub fn load_toml_config_or_default(explicit: Option<&Path>) -> (TomlConfig, Option<String>) {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("No config file found, using defaults");
                return (TomlConfig::default(), None);
            }
        },
    };

    match load_toml_config(&path) {
        Ok(config) => {
            debug!(path = %path.display(), "Loaded config file");
            (config, None)
        }
        Err(e) => (
            TomlConfig::default(),
            Some(format!("Ignoring config file {}: {}", path.display(), e)),
        ),
    }
}

/// Serialize `config` and write it atomically to `path`
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
    write_atomic(path, content.as_bytes())
}

/// Write `contents` to `path` through a sibling temp file and a rename
///
/// Readers see either the old file or the new one, never a partial write.
/// Parent directories are created as needed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .ok_or_else(|| Error::InvalidInput(format!("Not a file path: {}", path.display())))?;
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, contents)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}
