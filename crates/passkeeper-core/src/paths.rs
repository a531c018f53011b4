//! Standard paths used by passkeeper

use crate::config::Config;
use std::path::{Path, PathBuf};

/// Resolved passkeeper locations
#[derive(Debug, Clone)]
pub struct Paths {
    /// Raw key file shared by every service (<root>/secret.key)
    pub key_file: PathBuf,
    /// Directory holding one store file per service (<root>/passwords)
    pub store_dir: PathBuf,
    scratch_suffix: String,
    extension: String,
}

impl Default for Paths {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Paths {
    /// Derive paths from a loaded configuration
    pub fn from_config(config: &Config) -> Self {
        let root = config.root.clone().unwrap_or_else(|| PathBuf::from("."));

        Self {
            key_file: root.join(&config.key_file),
            store_dir: root.join(&config.store_dir),
            scratch_suffix: config.scratch_suffix.clone(),
            extension: config.extension.clone(),
        }
    }

    /// Default layout under an explicit root
    pub fn under(root: &Path) -> Self {
        let config = Config {
            root: Some(root.to_path_buf()),
            ..Config::default()
        };
        Self::from_config(&config)
    }

    /// Encrypted store file for a service
    pub fn store_file(&self, service: &str) -> PathBuf {
        self.store_dir.join(format!("{}.{}", service, self.extension))
    }

    /// Plaintext scratch mirror for a service
    pub fn scratch_file(&self, service: &str) -> PathBuf {
        self.store_dir.join(format!(
            "{}{}.{}",
            service, self.scratch_suffix, self.extension
        ))
    }

    /// Whether a service's store file would land on another service's scratch file
    ///
    /// An empty suffix makes every store file its own scratch file.
    pub fn collides_with_scratch(&self, service: &str) -> bool {
        self.scratch_suffix.is_empty() || service.ends_with(&self.scratch_suffix)
    }

    /// Global configuration file (~/.config/passkeeper/config.yaml)
    pub fn global_config() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("passkeeper").join("config.yaml"))
    }
}
