//! Built-in constraint checkers backed by configured platform versions

use anyhow::{Context, Result};
use lodestone_core::types::Constraint;
use lodestone_engine::ConstraintChecker;
use semver::Version;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Confirms server version requirements against the running server
pub struct ServerVersionChecker {
    version: Version,
}

impl ServerVersionChecker {
    pub fn new(version: &str) -> Result<Self> {
        let version = Version::parse(version.trim())
            .with_context(|| format!("Invalid server version: {}", version))?;
        Ok(Self { version })
    }
}

impl ConstraintChecker for ServerVersionChecker {
    fn check_constraints(&self, required: &BTreeSet<Constraint>) -> BTreeSet<Constraint> {
        required
            .iter()
            .filter(|c| matches!(c, Constraint::ServerVersion { .. }))
            .filter(|c| match c.version_req() {
                Ok(req) => req.matches(&self.version),
                Err(e) => {
                    debug!("Ignoring unparseable constraint {}: {}", c, e);
                    false
                }
            })
            .cloned()
            .collect()
    }
}

/// Confirms plugin requirements against the installed plugins
#[derive(Default)]
pub struct PluginVersionChecker {
    plugins: BTreeMap<String, Version>,
}

impl PluginVersionChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from plugin name to version string pairs
    pub fn from_versions(plugins: &BTreeMap<String, String>) -> Result<Self> {
        let plugins = plugins
            .iter()
            .map(|(name, version)| {
                Version::parse(version.trim())
                    .map(|v| (name.clone(), v))
                    .with_context(|| format!("Invalid version for plugin {}: {}", name, version))
            })
            .collect::<Result<_>>()?;
        Ok(Self { plugins })
    }

    pub fn with_plugin(mut self, name: impl Into<String>, version: Version) -> Self {
        self.plugins.insert(name.into(), version);
        self
    }
}

impl ConstraintChecker for PluginVersionChecker {
    fn check_constraints(&self, required: &BTreeSet<Constraint>) -> BTreeSet<Constraint> {
        required
            .iter()
            .filter(|c| match c {
                Constraint::PluginVersion { plugin, .. } => {
                    match (self.plugins.get(plugin), c.version_req()) {
                        (Some(installed), Ok(req)) => req.matches(installed),
                        _ => false,
                    }
                }
                Constraint::ServerVersion { .. } => false,
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_engine::ConstraintCheckerRegistry;
    use std::sync::Arc;

    fn required() -> BTreeSet<Constraint> {
        BTreeSet::from([
            Constraint::server_version(">=5.0.0").unwrap(),
            Constraint::plugin_version("org.example.geo", "^1.2").unwrap(),
        ])
    }

    #[test]
    fn test_server_checker_claims_matching_requirements_only() {
        let checker = ServerVersionChecker::new("5.1.0").unwrap();
        let claimed = checker.check_constraints(&required());
        assert_eq!(claimed, BTreeSet::from([Constraint::server_version(">=5.0.0").unwrap()]));

        let old = ServerVersionChecker::new("4.3.0").unwrap();
        assert!(old.check_constraints(&required()).is_empty());
    }

    #[test]
    fn test_plugin_checker_requires_installed_matching_version() {
        let installed =
            PluginVersionChecker::new().with_plugin("org.example.geo", Version::new(1, 4, 0));
        assert_eq!(installed.check_constraints(&required()).len(), 1);

        let outdated =
            PluginVersionChecker::new().with_plugin("org.example.geo", Version::new(2, 0, 0));
        assert!(outdated.check_constraints(&required()).is_empty());

        assert!(PluginVersionChecker::new().check_constraints(&required()).is_empty());
    }

    #[test]
    fn test_registry_of_builtin_checkers() {
        let plugins = BTreeMap::from([("org.example.geo".to_string(), "1.2.3".to_string())]);
        let registry = ConstraintCheckerRegistry::new()
            .with_checker(Arc::new(ServerVersionChecker::new("5.0.0").unwrap()))
            .with_checker(Arc::new(PluginVersionChecker::from_versions(&plugins).unwrap()));
        assert!(registry.check(&required()).is_ok());
    }

    #[test]
    fn test_invalid_versions_rejected() {
        assert!(ServerVersionChecker::new("five").is_err());
        let plugins = BTreeMap::from([("p".to_string(), "latest".to_string())]);
        assert!(PluginVersionChecker::from_versions(&plugins).is_err());
    }
}
