//! Passkeeper configuration
//!
//! Configuration files, first match wins:
//! - ./passkeeper.yaml - Per-directory settings
//! - ~/.config/passkeeper/config.yaml - User settings
//!
//! `PASSKEEPER_ROOT` overrides the configured root.

use crate::paths::Paths;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the per-directory config file
pub const LOCAL_CONFIG: &str = "passkeeper.yaml";

/// Environment variable overriding the root directory
pub const ROOT_ENV: &str = "PASSKEEPER_ROOT";

/// Where passkeeper keeps its key and store files
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Root directory; the invocation directory when unset
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Key file name, relative to root
    #[serde(default = "default_key_file")]
    pub key_file: String,

    /// Store directory name, relative to root
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Suffix appended to the service name for the plaintext scratch file
    #[serde(default = "default_scratch_suffix")]
    pub scratch_suffix: String,

    /// File extension for store and scratch files
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_key_file() -> String {
    "secret.key".to_string()
}

fn default_store_dir() -> String {
    "passwords".to_string()
}

fn default_scratch_suffix() -> String {
    "-decrypt".to_string()
}

fn default_extension() -> String {
    "txt".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            key_file: default_key_file(),
            store_dir: default_store_dir(),
            scratch_suffix: default_scratch_suffix(),
            extension: default_extension(),
        }
    }
}

impl Config {
    /// Load configuration from the standard locations, then apply `PASSKEEPER_ROOT`
    pub fn load() -> Result<Self> {
        let local = PathBuf::from(LOCAL_CONFIG);
        let mut config = if local.exists() {
            Self::load_from(&local)?
        } else {
            match Paths::global_config() {
                Some(global) => Self::load_from(&global)?,
                None => Self::default(),
            }
        };

        if let Ok(root) = std::env::var(ROOT_ENV) {
            if !root.is_empty() {
                config.root = Some(PathBuf::from(root));
            }
        }

        Ok(config)
    }

    /// Load configuration from a specific path, defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        // An empty file is a valid "all defaults" config
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {:?}", path))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Replace the root directory if one is given
    pub fn with_root(mut self, root: Option<PathBuf>) -> Self {
        if root.is_some() {
            self.root = root;
        }
        self
    }
}
