//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/vibeloop/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/vibeloop/` (~/.config/vibeloop/)
//! - Data: `$XDG_DATA_HOME/vibeloop/` (~/.local/share/vibeloop/)
//! - State/Logs: `$XDG_STATE_HOME/vibeloop/` (~/.local/state/vibeloop/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Storage backend selection
    #[serde(default)]
    pub storage: StorageConfig,

    /// Local user defaults
    #[serde(default)]
    pub user: UserConfig,

    /// Pet tuning
    #[serde(default)]
    pub pet: PetConfig,

    /// Daily practice rules
    #[serde(default)]
    pub practice: PracticeConfig,

    /// Serverless functions endpoint (holder checks)
    #[serde(default)]
    pub functions: FunctionsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which storage backend to use
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite database in the data directory
    #[default]
    Sqlite,
    /// Single JSON blob, mirroring the SQLite tables
    Demo,
}

/// Storage configuration
#[derive(Debug, Deserialize, Default)]
pub struct StorageConfig {
    /// Backend to open
    #[serde(default)]
    pub backend: StorageBackend,

    /// Override for the database / demo file location
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolved path of the backing file for the selected backend
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        match self.backend {
            StorageBackend::Sqlite => Config::database_path(),
            StorageBackend::Demo => Config::demo_path(),
        }
    }
}

/// Local user defaults
#[derive(Debug, Deserialize)]
pub struct UserConfig {
    /// User id used when the CLI is not given `--user`
    #[serde(default = "default_user_id")]
    pub default_user: String,

    /// Display name stored on first profile creation
    pub display_name: Option<String>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            default_user: default_user_id(),
            display_name: None,
        }
    }
}

fn default_user_id() -> String {
    "local".to_string()
}

/// Pet tuning
#[derive(Debug, Deserialize, Clone)]
pub struct PetConfig {
    /// Name given to a freshly hatched pet
    #[serde(default = "default_pet_name")]
    pub default_name: String,

    /// Minutes between feedings
    #[serde(default = "default_feed_cooldown")]
    pub feed_cooldown_minutes: u32,

    /// Minutes between cleanings
    #[serde(default = "default_clean_cooldown")]
    pub clean_cooldown_minutes: u32,

    /// Minutes between breathing sessions
    #[serde(default = "default_breathe_cooldown")]
    pub breathe_cooldown_minutes: u32,

    /// Minutes between play sessions
    #[serde(default = "default_play_cooldown")]
    pub play_cooldown_minutes: u32,
}

impl Default for PetConfig {
    fn default() -> Self {
        Self {
            default_name: default_pet_name(),
            feed_cooldown_minutes: default_feed_cooldown(),
            clean_cooldown_minutes: default_clean_cooldown(),
            breathe_cooldown_minutes: default_breathe_cooldown(),
            play_cooldown_minutes: default_play_cooldown(),
        }
    }
}

fn default_pet_name() -> String {
    "Vibe".to_string()
}

fn default_feed_cooldown() -> u32 {
    60
}

fn default_clean_cooldown() -> u32 {
    120
}

fn default_breathe_cooldown() -> u32 {
    15
}

fn default_play_cooldown() -> u32 {
    10
}

/// Daily practice rules
#[derive(Debug, Deserialize, Clone)]
pub struct PracticeConfig {
    /// Minimum reflection length (characters, after trimming)
    #[serde(default = "default_min_reflection_chars")]
    pub min_reflection_chars: usize,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            min_reflection_chars: default_min_reflection_chars(),
        }
    }
}

fn default_min_reflection_chars() -> usize {
    20
}

/// Serverless functions configuration
///
/// Holder eligibility is decided by an external function; vibeloop only
/// invokes it by name and reads back a boolean.
#[derive(Debug, Deserialize, Clone)]
pub struct FunctionsConfig {
    /// Base URL of the functions host (e.g., `https://project.example.co`)
    pub base_url: Option<String>,

    /// Bearer key sent with each invocation
    pub api_key: Option<String>,

    /// Name of the holder-check function
    #[serde(default = "default_holder_check")]
    pub holder_check: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_functions_timeout")]
    pub timeout_secs: u64,

    /// Max retry attempts for transient failures
    #[serde(default = "default_functions_max_retries")]
    pub max_retries: usize,
}

impl Default for FunctionsConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            holder_check: default_holder_check(),
            timeout_secs: default_functions_timeout(),
            max_retries: default_functions_max_retries(),
        }
    }
}

impl FunctionsConfig {
    /// Check if a functions host is configured
    pub fn is_ready(&self) -> bool {
        self.base_url.is_some()
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_none() {
            return Err(Error::Config(
                "functions.base_url is required for holder checks".to_string(),
            ));
        }
        if self.holder_check.trim().is_empty() {
            return Err(Error::Config(
                "functions.holder_check must name a function".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "functions.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_holder_check() -> String {
    "check-holder".to_string()
}

fn default_functions_timeout() -> u64 {
    10
}

fn default_functions_max_retries() -> usize {
    2
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/vibeloop/config.toml` (~/.config/vibeloop/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("vibeloop").join("config.toml")
    }

    /// Returns the data directory path
    ///
    /// `$XDG_DATA_HOME/vibeloop/` (~/.local/share/vibeloop/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("vibeloop")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/vibeloop/` (~/.local/state/vibeloop/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("vibeloop")
    }

    /// Returns the SQLite database file path
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Returns the demo-mode blob path
    pub fn demo_path() -> PathBuf {
        Self::data_dir().join("demo.json")
    }

    /// Returns the local pull cache path
    pub fn cache_path() -> PathBuf {
        Self::data_dir().join("cache.json")
    }
}
