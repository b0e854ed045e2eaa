//! Configuration management for cmdgate.
//!
//! Handles loading configuration from a TOML file. Every key is optional; a
//! missing file yields the defaults.

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for cmdgate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Character that starts a command invocation.
    #[serde(default = "default_prefix")]
    pub prefix: char,

    /// User id that bypasses every permission check.
    #[serde(default)]
    pub maintainer: Option<u64>,

    /// Permission policy settings.
    #[serde(default)]
    pub permissions: PermissionsConfig,

    /// Help command settings.
    #[serde(default)]
    pub help: HelpConfig,
}

fn default_prefix() -> char {
    '!'
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            maintainer: None,
            permissions: PermissionsConfig::default(),
            help: HelpConfig::default(),
        }
    }
}

/// Where permission policy documents are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsConfig {
    /// Directory tree holding one document per command container.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// File extension of policy documents.
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_directory() -> PathBuf {
    PathBuf::from("permissions")
}

fn default_extension() -> String {
    "prm".to_string()
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            extension: default_extension(),
        }
    }
}

/// Help command configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpConfig {
    /// Commands listed per help page.
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_per_page() -> usize {
    20
}

impl Default for HelpConfig {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cmdgate")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| GateError::io(path, e))?;

        Self::parse_toml(&content, path)
    }

    /// Parses and validates configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            GateError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_whitespace() {
            return Err(GateError::config("prefix must not be whitespace"));
        }
        if self.help.per_page == 0 {
            return Err(GateError::config("help.per_page must be at least 1"));
        }
        if self.permissions.extension.is_empty() {
            return Err(GateError::config("permissions.extension must not be empty"));
        }
        Ok(())
    }
}
