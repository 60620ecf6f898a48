//! Reference platform integration for Lodestone
//!
//! This crate handles:
//! - An in-memory platform holding inputs, outputs, streams, pipeline rules, and grok patterns
//! - One entity catalog per platform object type
//! - Server and plugin version constraint checkers
//! - Wiring catalogs and checkers from configuration

pub mod catalogs;
pub mod codec;
pub mod constraints;
pub mod platform;

pub use catalogs::{
    GrokPatternCatalog, InputCatalog, OutputCatalog, PipelineRuleCatalog, StreamCatalog,
};
pub use constraints::{PluginVersionChecker, ServerVersionChecker};
pub use platform::{InMemoryPlatform, PlatformState};

use anyhow::Result;
use lodestone_core::LodestoneConfig;
use lodestone_engine::{CatalogRegistry, ConstraintCheckerRegistry};
use std::sync::Arc;

/// Registry with a catalog for every platform object type
pub fn catalog_registry(platform: Arc<InMemoryPlatform>) -> CatalogRegistry {
    CatalogRegistry::new()
        .with_catalog(Arc::new(InputCatalog::new(platform.clone())))
        .with_catalog(Arc::new(OutputCatalog::new(platform.clone())))
        .with_catalog(Arc::new(StreamCatalog::new(platform.clone())))
        .with_catalog(Arc::new(PipelineRuleCatalog::new(platform.clone())))
        .with_catalog(Arc::new(GrokPatternCatalog::new(platform)))
}

/// Checkers for the server and plugin versions named in the configuration
pub fn checker_registry(config: &LodestoneConfig) -> Result<ConstraintCheckerRegistry> {
    Ok(ConstraintCheckerRegistry::new()
        .with_checker(Arc::new(ServerVersionChecker::new(&config.server_version)?))
        .with_checker(Arc::new(PluginVersionChecker::from_versions(&config.plugins)?)))
}
