// src/config.rs

//! Configuration for packsmith
//!
//! Tool locations and scratch-directory policy, read from a TOML file:
//!
//! ```toml
//! [tools]
//! choco = "/opt/chocolatey/bin/choco"
//! makecatalogs = "/usr/local/munki/makecatalogs"
//!
//! [packaging]
//! scratch_root = "/var/tmp/packsmith"
//! keep_workdir = false
//! ```
//!
//! Every key is optional. Processor input variables take precedence over
//! the values configured here.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default config file name under the user's config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Explicit executable locations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolPaths {
    pub makecatalogs: Option<PathBuf>,
    pub munkiimport: Option<PathBuf>,
    pub choco: Option<PathBuf>,
    pub nuget: Option<PathBuf>,
    pub signtool: Option<PathBuf>,
}

/// Scratch directory policy for the packager
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackagingConfig {
    /// Parent directory for scratch directories (system temp dir when unset)
    pub scratch_root: Option<PathBuf>,
    /// Keep scratch directories after packing (for debugging)
    #[serde(default)]
    pub keep_workdir: bool,
}

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolPaths,

    #[serde(default)]
    pub packaging: PackagingConfig,
}

impl Config {
    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        debug!("Loaded configuration from {}", path.display());
        Self::parse(&content)
    }

    /// Default location: `<config dir>/packsmith/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("packsmith").join(CONFIG_FILE_NAME))
    }

    /// Load from the default location if a file exists there, else defaults
    pub fn discover() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
