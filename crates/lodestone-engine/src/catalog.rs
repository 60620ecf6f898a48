//! Pluggable per-model-type entity catalogs

use anyhow::Result;
use async_trait::async_trait;
use lodestone_core::types::{
    Entity, EntityDescriptor, EntityExcerpt, ModelType, NativeEntityDescriptor,
};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::context::InstallationContext;

/// Adapter between portable entity definitions and live platform objects
///
/// One implementation per model type. Implementations must make `create`
/// and `find_existing` safe under concurrent installs; singleton types
/// should perform an atomic find-or-insert against their backing store.
#[async_trait]
pub trait EntityCatalog: Send + Sync {
    /// Whether this catalog handles the model type
    fn supports(&self, model_type: &ModelType) -> bool;

    /// Browsing view of all live objects of this type
    async fn list_entity_excerpts(&self) -> Result<Vec<EntityExcerpt>>;

    /// Encode one live object into portable form; `None` if it does not exist
    async fn collect_entity(&self, descriptor: &EntityDescriptor) -> Result<Option<Entity>>;

    /// Other live entities this one depends on, for recursive export
    async fn resolve(&self, descriptor: &EntityDescriptor) -> Result<BTreeSet<EntityDescriptor>>;

    /// Existing equivalent object for singleton-by-identity types
    async fn find_existing(
        &self,
        _entity: &Entity,
        _context: &InstallationContext,
    ) -> Result<Option<NativeEntityDescriptor>> {
        Ok(None)
    }

    /// Decode the entity with parameters substituted and create the live object
    async fn create(
        &self,
        entity: &Entity,
        context: &InstallationContext,
    ) -> Result<NativeEntityDescriptor>;

    /// Whether live objects of this type can be quiesced before removal
    fn supports_stop(&self) -> bool {
        false
    }

    /// Quiesce a live object
    async fn stop(&self, _native: &NativeEntityDescriptor) -> Result<()> {
        Ok(())
    }

    /// Remove a live object
    async fn delete(&self, native: &NativeEntityDescriptor) -> Result<()>;
}

/// Explicit registry of catalogs, built once at startup
#[derive(Clone, Default)]
pub struct CatalogRegistry {
    catalogs: Vec<Arc<dyn EntityCatalog>>,
}

impl CatalogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn EntityCatalog>) -> Self {
        self.catalogs.push(catalog);
        self
    }

    pub fn register(&mut self, catalog: Arc<dyn EntityCatalog>) {
        self.catalogs.push(catalog);
    }

    /// First registered catalog supporting the model type
    pub fn for_type(&self, model_type: &ModelType) -> Option<&Arc<dyn EntityCatalog>> {
        self.catalogs.iter().find(|c| c.supports(model_type))
    }

    /// Like [`for_type`](Self::for_type), failing with `NoCatalog`
    pub fn require(
        &self,
        model_type: &ModelType,
    ) -> lodestone_core::Result<&Arc<dyn EntityCatalog>> {
        self.for_type(model_type)
            .ok_or_else(|| lodestone_core::Error::NoCatalog {
                model_type: model_type.clone(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn EntityCatalog>> {
        self.catalogs.iter()
    }

    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }
}
