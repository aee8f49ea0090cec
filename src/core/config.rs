//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.confab/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConfabConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub devices: DevicesConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DevicesConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ExportConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UiConfig {
    pub max_input_chars: Option<usize>,
    pub toast_seconds: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_MAX_INPUT_CHARS: usize = 4000;
pub const DEFAULT_TOAST_SECONDS: u64 = 5;

const CONFIG_DIR: &str = ".confab";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub storage_dir: PathBuf,
    pub devices_dir: PathBuf,
    pub export_dir: PathBuf,
    pub max_input_chars: usize,
    pub toast_seconds: u64,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// `~/.confab`, or `./.confab` when there is no home directory.
fn confab_home() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(CONFIG_DIR))
        .unwrap_or_else(|| PathBuf::from(CONFIG_DIR))
}

/// Returns the path to `~/.confab/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_DIR).join("config.toml"))
}

/// Load config from `~/.confab/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ConfabConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ConfabConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(ConfabConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<ConfabConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(ConfabConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ConfabConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

const DEFAULT_CONFIG: &str = r#"# Confab Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [server]
# base_url = "http://localhost:5000"   # Or set CONFAB_BASE_URL, or pass --base-url

# [storage]
# dir = "~/.confab/storage"            # conversations.json, userPreferences.json

# [devices]
# dir = "~/.confab/devices"            # camera.png, screen.png, microphone.wav

# [export]
# dir = "."                            # Where conversation-<id>.txt is written

# [ui]
# max_input_chars = 4000
# toast_seconds = 5
"#;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_base_url` is the `--base-url` flag (None = not specified).
pub fn resolve(config: &ConfabConfig, cli_base_url: Option<&str>) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let base_url = cli_base_url
        .map(|s| s.to_string())
        .or_else(|| std::env::var("CONFAB_BASE_URL").ok())
        .or_else(|| config.server.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let home = confab_home();

    ResolvedConfig {
        base_url,
        storage_dir: config
            .storage
            .dir
            .clone()
            .unwrap_or_else(|| home.join("storage")),
        devices_dir: config
            .devices
            .dir
            .clone()
            .unwrap_or_else(|| home.join("devices")),
        export_dir: config
            .export
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".")),
        max_input_chars: config
            .ui
            .max_input_chars
            .unwrap_or(DEFAULT_MAX_INPUT_CHARS),
        toast_seconds: config.ui.toast_seconds.unwrap_or(DEFAULT_TOAST_SECONDS),
    }
}
