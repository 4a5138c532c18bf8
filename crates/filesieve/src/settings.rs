//! Startup configuration
//!
//! Read once from TOML when the program starts. The tool never writes this
//! file; session changes (sort order, toggles) are forgotten on exit.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::filter::{FilterState, SortColumn, SortState, TypeFilter};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub browse: BrowseSettings,
    #[serde(default)]
    pub filter: FilterSettings,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseSettings {
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub show: TypeFilter,
    #[serde(default = "default_sort")]
    pub sort: SortColumn,
    #[serde(default)]
    pub sort_reverse: bool,
}

impl Default for BrowseSettings {
    fn default() -> Self {
        Self {
            recursive: false,
            show: TypeFilter::All,
            sort: default_sort(),
            sort_reverse: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FilterSettings {
    #[serde(default)]
    pub use_regex: bool,
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// Log file for the TUI; CLI commands log to stderr
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: None,
            level: default_log_level(),
        }
    }
}

fn default_sort() -> SortColumn {
    SortColumn::Name
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Settings {
    /// Load settings from a file, or return defaults if file doesn't exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;

        Ok(settings)
    }

    pub fn default_path() -> PathBuf {
        config_dir().join("settings.toml")
    }

    pub fn initial_filter(&self) -> FilterState {
        FilterState {
            pattern: String::new(),
            use_regex: self.filter.use_regex,
            case_sensitive: self.filter.case_sensitive,
            type_filter: self.browse.show,
        }
    }

    pub fn initial_sort(&self) -> SortState {
        SortState {
            column: self.browse.sort,
            reverse: self.browse.sort_reverse,
        }
    }
}

/// `<platform config dir>/filesieve`
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("filesieve")
}

// Platform config directory lookup without pulling in the dirs crate
mod dirs {
    use std::path::PathBuf;

    pub fn config_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var_os("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
                })
        }
        #[cfg(target_os = "windows")]
        {
            std::env::var_os("APPDATA").map(PathBuf::from)
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }
}
