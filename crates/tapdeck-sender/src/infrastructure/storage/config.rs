//! TOML-based configuration persistence for the sender.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\TapDeck\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/tapdeck/config.toml` or `~/.config/tapdeck/config.toml`
//! - macOS:    `~/Library/Application Support/TapDeck/config.toml`
//!
//! Example:
//!
//! ```toml
//! [sender]
//! log_level = "info"
//! mode = "relative"
//!
//! [network]
//! target_host = "192.168.1.20"
//! target_port = 8888
//!
//! [touch]
//! palm_threshold = 200.0
//! sensitivity = 2.0
//!
//! [layout]
//! left_keys = ["s", "d", "f"]
//! right_keys = ["j", "k", "l"]
//! ```
//!
//! # Serde default values
//!
//! Every section and every field has a default, so a missing file, a missing
//! section, or a missing field all fall back to the built-in values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tapdeck_core::{protocol::DEFAULT_PORT, ClassifierConfig, LayoutConfig, LayoutError, Mode};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The `[layout]` section is inconsistent.
    #[error("invalid layout: {0}")]
    Layout(#[from] LayoutError),

    /// A value is outside its allowed range.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub sender: SenderConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub touch: ClassifierConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
}

/// General sender behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SenderConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Trackpad mode at startup.
    #[serde(default)]
    pub mode: Mode,
    /// Surface width used until the input source reports a resize.
    #[serde(default = "default_surface_width")]
    pub surface_width: f32,
    /// Surface height used until the input source reports a resize.
    #[serde(default = "default_surface_height")]
    pub surface_height: f32,
}

/// Receiver address and outbound queue settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// Host name or IP address of the receiving machine.
    #[serde(default = "default_target_host")]
    pub target_host: String,
    /// UDP port the receiver listens on.
    #[serde(default = "default_target_port")]
    pub target_port: u16,
    /// Local IP address to send from.  `"0.0.0.0"` lets the OS choose.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Maximum number of datagrams waiting to be sent.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_surface_width() -> f32 {
    1280.0
}
fn default_surface_height() -> f32 {
    800.0
}
fn default_target_host() -> String {
    "127.0.0.1".to_string()
}
fn default_target_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_queue_capacity() -> usize {
    256
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            mode: Mode::default(),
            surface_width: default_surface_width(),
            surface_height: default_surface_height(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            target_host: default_target_host(),
            target_port: default_target_port(),
            bind_address: default_bind_address(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl AppConfig {
    /// Checks cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Layout`] for an invalid `[layout]` section and
    /// [`ConfigError::Invalid`] for out-of-range scalar values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.validate()?;

        let touch = &self.touch;
        if !(touch.palm_threshold.is_finite() && touch.palm_threshold > 0.0) {
            return Err(invalid("touch.palm_threshold", "must be a positive number"));
        }
        if !touch.sensitivity.is_finite() {
            return Err(invalid("touch.sensitivity", "must be finite"));
        }
        if !(touch.jitter_epsilon.is_finite() && touch.jitter_epsilon >= 0.0) {
            return Err(invalid("touch.jitter_epsilon", "must be zero or positive"));
        }
        if self.network.queue_capacity == 0 {
            return Err(invalid("network.queue_capacity", "must be at least 1"));
        }
        if self.network.target_host.trim().is_empty() {
            return Err(invalid("network.target_host", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform config file, returning
/// `AppConfig::default()` if the file does not yet exist.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning the defaults if it does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to the platform config file.
///
/// # Errors
///
/// See [`save_config_to`].
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_file_path()?)
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory including the `TapDeck` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("TapDeck"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("tapdeck"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("TapDeck")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
