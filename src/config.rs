//! @dose
//! purpose: Configuration file parsing for modcli.toml. Holds the default changelog path and
//!     the Steam Workshop ignore list.
//!
//! when-editing:
//!     - !Config is loaded once at startup in main.rs and passed to command handlers
//!     - Defaults mirror what a typical Don't Starve Together mod repository ships
//!
//! invariants:
//!     - Config::load returns default config if modcli.toml doesn't exist
//!     - Config::from_path fails if an explicitly requested file is missing or not a file
//!
//! gotchas:
//!     - A present but unparsable modcli.toml only warns when loaded implicitly
//!     - Setting workshop.ignore replaces the default list, it does not extend it

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the implicitly loaded configuration file
pub const CONFIG_FILE_NAME: &str = "modcli.toml";

/// Main configuration structure matching modcli.toml
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub changelog: ChangelogConfig,
    pub workshop: WorkshopConfig,
}

/// Changelog command configuration
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ChangelogConfig {
    /// Changelog used when no path argument is given
    pub path: PathBuf,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("CHANGELOG.md"),
        }
    }
}

/// Workshop command configuration
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WorkshopConfig {
    /// Ignore patterns (gitignore-like, leading / anchors at the mod root)
    pub ignore: Vec<String>,
}

impl Default for WorkshopConfig {
    fn default() -> Self {
        Self {
            ignore: [
                ".*",
                "CHANGELOG.md",
                "Makefile",
                "README.md",
                "codecov.yml",
                "config.ld",
                "docs/",
                "lcov.info",
                "luacov.*",
                "modicon.png",
                "preview.gif",
                "readme/",
                "spec/",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Config {
    /// Load configuration from modcli.toml in the given directory
    pub fn load(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", config_path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", config_path.display(), e);
                Self::default()
            }
        }
    }

    /// Load an explicitly requested configuration file
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("open {}: no such file", path.display());
        }
        if path.is_dir() {
            bail!("open {}: expected file but got directory", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Explicit path when given, modcli.toml in `dir` otherwise
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_path(path),
            None => Ok(Self::load(dir)),
        }
    }
}
