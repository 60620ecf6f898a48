//! Configuration file loading and environment overrides
//!
//! Precedence (low to high):
//! 1. Built-in defaults
//! 2. `lodestone.yaml` in the working directory, else `~/.lodestone/config.yaml`
//! 3. Environment variables (`LODESTONE_*`)
//! 4. An explicit `--config` path replaces step 2

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use tracing::debug;

/// Configuration file names to search for in the working directory
const CONFIG_FILE_NAMES: &[&str] = &["lodestone.yaml", "lodestone.yml"];

/// Environment variable overriding the data directory
pub const ENV_DATA_DIR: &str = "LODESTONE_DATA_DIR";

/// Environment variable overriding the reported server version
pub const ENV_SERVER_VERSION: &str = "LODESTONE_SERVER_VERSION";

/// Server version assumed when none is configured
const DEFAULT_SERVER_VERSION: &str = "5.0.0";

/// Loaded Lodestone configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LodestoneConfig {
    /// Directory holding content packs, installation records, and platform state
    #[serde(default = "default_data_dir")]
    pub data_dir: Utf8PathBuf,

    /// Version of the platform the packs are installed into
    #[serde(default = "default_server_version")]
    pub server_version: String,

    /// Installed plugins and their versions
    #[serde(default)]
    pub plugins: BTreeMap<String, String>,
}

fn default_data_dir() -> Utf8PathBuf {
    dirs::home_dir()
        .and_then(|home| Utf8PathBuf::from_path_buf(home).ok())
        .map(|home| home.join(".lodestone"))
        .unwrap_or_else(|| Utf8PathBuf::from(".lodestone"))
}

fn default_server_version() -> String {
    DEFAULT_SERVER_VERSION.to_string()
}

impl Default for LodestoneConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            server_version: default_server_version(),
            plugins: BTreeMap::new(),
        }
    }
}

impl LodestoneConfig {
    /// Load configuration from the given path, or search for one
    ///
    /// An explicit path must exist. Without one, a missing file falls back
    /// to defaults.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let config = match path {
            Some(p) => Self::load_file(p)?,
            None => match Self::find_config() {
                Some(p) => Self::load_file(&p)?,
                None => {
                    debug!("No configuration file found, using defaults");
                    Self::default()
                }
            },
        };

        let config = config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Utf8Path) -> Result<Self> {
        debug!("Loading configuration from {}", path);
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config_not_found(path.as_str())
            } else {
                Error::Io(e)
            }
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(&content)?)
    }

    /// Search the working directory, then the home directory
    fn find_config() -> Option<Utf8PathBuf> {
        let cwd = env::current_dir()
            .ok()
            .and_then(|p| Utf8PathBuf::from_path_buf(p).ok());

        if let Some(cwd) = cwd {
            for name in CONFIG_FILE_NAMES {
                let candidate = cwd.join(name);
                if candidate.exists() {
                    return Some(candidate);
                }
            }
        }

        let home_config = default_data_dir().join("config.yaml");
        home_config.exists().then_some(home_config)
    }

    fn apply_env_overrides(mut self) -> Self {
        if let Ok(dir) = env::var(ENV_DATA_DIR) {
            if !dir.trim().is_empty() {
                self.data_dir = Utf8PathBuf::from(dir);
            }
        }
        if let Ok(version) = env::var(ENV_SERVER_VERSION) {
            if !version.trim().is_empty() {
                self.server_version = version.trim().to_string();
            }
        }
        self
    }

    fn validate(&self) -> Result<()> {
        semver::Version::parse(&self.server_version).map_err(|e| {
            Error::invalid_config(format!(
                "server_version '{}' is not a semantic version: {}",
                self.server_version, e
            ))
        })?;

        for (plugin, version) in &self.plugins {
            semver::Version::parse(version).map_err(|e| {
                Error::invalid_config(format!(
                    "plugin '{}' version '{}' is not a semantic version: {}",
                    plugin, version, e
                ))
            })?;
        }
        Ok(())
    }

    /// Directory scanned for content pack files
    pub fn content_packs_dir(&self) -> Utf8PathBuf {
        self.data_dir.join("content-packs")
    }

    /// File holding installation records
    pub fn installations_path(&self) -> Utf8PathBuf {
        self.data_dir.join("installations.json")
    }

    /// File holding the reference platform's live objects
    pub fn platform_state_path(&self) -> Utf8PathBuf {
        self.data_dir.join("platform.json")
    }
}
