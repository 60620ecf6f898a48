//! Environment constraints a content pack requires before installation

use semver::VersionReq;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A named requirement the running platform must satisfy
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    /// Minimum (or ranged) server version
    ServerVersion { version: String },
    /// A plugin that must be installed at a matching version
    PluginVersion { plugin: String, version: String },
}

impl Constraint {
    /// Require a server version matching `requirement`
    pub fn server_version(requirement: &str) -> Result<Self> {
        let constraint = Self::ServerVersion {
            version: requirement.trim().to_string(),
        };
        constraint.validate()?;
        Ok(constraint)
    }

    /// Require `plugin` at a version matching `requirement`
    pub fn plugin_version(plugin: &str, requirement: &str) -> Result<Self> {
        let constraint = Self::PluginVersion {
            plugin: plugin.trim().to_string(),
            version: requirement.trim().to_string(),
        };
        constraint.validate()?;
        Ok(constraint)
    }

    /// Check the constraint is well-formed
    pub fn validate(&self) -> Result<()> {
        if let Self::PluginVersion { plugin, .. } = self {
            if plugin.is_empty() {
                return Err(Error::invalid_constraint(
                    self.to_string(),
                    "plugin name must not be blank",
                ));
            }
        }
        self.version_req().map(|_| ())
    }

    /// Parsed version requirement
    pub fn version_req(&self) -> Result<VersionReq> {
        let raw = match self {
            Self::ServerVersion { version } | Self::PluginVersion { version, .. } => version,
        };
        VersionReq::parse(raw)
            .map_err(|e| Error::invalid_constraint(self.to_string(), e.to_string()))
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ServerVersion { version } => write!(f, "server-version {}", version),
            Self::PluginVersion { plugin, version } => write!(f, "plugin {} {}", plugin, version),
        }
    }
}
