//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.tabnav/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.
//!
//! Tabs are identified at runtime by their position in the resolved tab
//! list, which is what the binary uses as its tab id type.

use log::{LevelFilter, debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::navigator::DEFAULT_INFO_CAPACITY;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NavConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    /// `None` keeps the built-in tabs. An explicit empty list is an error.
    pub tabs: Option<Vec<TabEntry>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub default_tab: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    pub info_capacity: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TabEntry {
    pub id: String,
    pub title: Option<String>,
    pub detachable: Option<bool>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;
pub const DEFAULT_LOG_FILE: &str = "tabnav.log";

const DEFAULT_TABS: [(&str, &str); 4] = [
    ("home", "Home"),
    ("search", "Search"),
    ("library", "Library"),
    ("profile", "Profile"),
];

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

/// One configured tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSpec {
    pub id: String,
    pub title: String,
    /// Whether the tab's root view may be detached while hidden.
    pub detachable: bool,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub tabs: Vec<TabSpec>,
    /// Index into `tabs`.
    pub default_tab: usize,
    pub log_level: LevelFilter,
    pub log_file: PathBuf,
    pub info_capacity: usize,
}

impl ResolvedConfig {
    /// Position of the tab with the given id.
    pub fn tab_index(&self, id: &str) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.id == id)
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.tabnav/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".tabnav").join("config.toml"))
}

/// Load config from `path`, or from `~/.tabnav/config.toml` when `None`.
///
/// If the default file doesn't exist, generates a commented-out default and
/// returns `NavConfig::default()`. An explicit path that doesn't exist is an
/// I/O error. A malformed file is `ConfigError::Parse`.
pub fn load_config(path: Option<&Path>) -> Result<NavConfig, ConfigError> {
    if let Some(path) = path {
        return read_config(path);
    }

    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(NavConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(NavConfig::default());
    }
    read_config(&path)
}

fn read_config(path: &Path) -> Result<NavConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: NavConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# tabnav configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# default_tab = "home"          # Or set TABNAV_DEFAULT_TAB
# log_level = "debug"           # "off", "error", "warn", "info", "debug", "trace"
# log_file = "tabnav.log"
# info_capacity = 256           # Info events buffered per observer

# [[tabs]]
# id = "home"
# title = "Home"
# detachable = true             # false keeps the root's visual state while hidden

# [[tabs]]
# id = "search"
# title = "Search"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_tab` and `cli_log_level` are from CLI flags (None = not specified).
pub fn resolve(
    config: &NavConfig,
    cli_tab: Option<&str>,
    cli_log_level: Option<&str>,
) -> Result<ResolvedConfig, ConfigError> {
    let tabs = resolve_tabs(config.tabs.as_deref())?;

    // Default tab: CLI → env → config → first tab
    let default_id = cli_tab
        .map(|s| s.to_string())
        .or_else(|| std::env::var("TABNAV_DEFAULT_TAB").ok())
        .or_else(|| config.general.default_tab.clone());
    let default_tab = match default_id {
        Some(id) => tabs
            .iter()
            .position(|tab| tab.id == id)
            .ok_or_else(|| ConfigError::Invalid(format!("default tab {id:?} is not configured")))?,
        None => 0,
    };

    // Log level: CLI → env → config → default
    let log_level = match cli_log_level
        .map(|s| s.to_string())
        .or_else(|| std::env::var("TABNAV_LOG_LEVEL").ok())
        .or_else(|| config.general.log_level.clone())
    {
        Some(level) => LevelFilter::from_str(&level)
            .map_err(|_| ConfigError::Invalid(format!("unknown log level {level:?}")))?,
        None => DEFAULT_LOG_LEVEL,
    };

    let info_capacity = config.general.info_capacity.unwrap_or(DEFAULT_INFO_CAPACITY);
    if info_capacity == 0 {
        return Err(ConfigError::Invalid("info_capacity must be at least 1".to_string()));
    }

    Ok(ResolvedConfig {
        tabs,
        default_tab,
        log_level,
        log_file: PathBuf::from(
            config
                .general
                .log_file
                .as_deref()
                .unwrap_or(DEFAULT_LOG_FILE),
        ),
        info_capacity,
    })
}

fn resolve_tabs(entries: Option<&[TabEntry]>) -> Result<Vec<TabSpec>, ConfigError> {
    let Some(entries) = entries else {
        return Ok(DEFAULT_TABS
            .iter()
            .map(|(id, title)| TabSpec {
                id: id.to_string(),
                title: title.to_string(),
                detachable: true,
            })
            .collect());
    };
    if entries.is_empty() {
        return Err(ConfigError::Invalid("at least one tab is required".to_string()));
    }

    let mut seen = HashSet::new();
    entries
        .iter()
        .map(|entry| {
            if !seen.insert(entry.id.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate tab id {:?}", entry.id)));
            }
            Ok(TabSpec {
                id: entry.id.clone(),
                // Title falls back to the id
                title: entry.title.clone().unwrap_or_else(|| entry.id.clone()),
                detachable: entry.detachable.unwrap_or(true),
            })
        })
        .collect()
}
