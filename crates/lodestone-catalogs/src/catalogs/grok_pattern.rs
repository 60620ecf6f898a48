use anyhow::Result;
use async_trait::async_trait;
use lodestone_core::types::{
    model_types, Entity, EntityDescriptor, EntityExcerpt, ModelType, NativeEntityDescriptor,
};
use lodestone_engine::substitution::PayloadReader;
use lodestone_engine::{EntityCatalog, InstallationContext};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use super::{excerpt, not_found};
use crate::codec::PayloadBuilder;
use crate::platform::{GrokPattern, InMemoryPlatform};

/// Grok patterns, which are singletons identified by name
///
/// A pack whose pattern already exists reuses it instead of creating a
/// duplicate, so several packs may share one pattern.
pub struct GrokPatternCatalog {
    platform: Arc<InMemoryPlatform>,
}

impl GrokPatternCatalog {
    pub fn new(platform: Arc<InMemoryPlatform>) -> Self {
        Self { platform }
    }

    fn native(
        entity: &Entity,
        pattern: &GrokPattern,
        found_on_system: bool,
    ) -> NativeEntityDescriptor {
        NativeEntityDescriptor::create(
            entity.id.clone(),
            pattern.id.as_str(),
            model_types::grok_pattern(),
            pattern.name.as_str(),
            found_on_system,
        )
    }
}

#[async_trait]
impl EntityCatalog for GrokPatternCatalog {
    fn supports(&self, model_type: &ModelType) -> bool {
        *model_type == model_types::grok_pattern()
    }

    async fn list_entity_excerpts(&self) -> Result<Vec<EntityExcerpt>> {
        self.platform.with_state(|state| {
            state
                .grok_patterns
                .values()
                .map(|p| excerpt(&p.id, model_types::grok_pattern(), &p.name))
                .collect()
        })
    }

    async fn collect_entity(&self, descriptor: &EntityDescriptor) -> Result<Option<Entity>> {
        let pattern = self
            .platform
            .with_state(|state| state.grok_patterns.get(descriptor.id.as_str()).cloned())?;

        Ok(pattern.map(|pattern| {
            let data = PayloadBuilder::new()
                .string("name", &pattern.name)
                .string("pattern", &pattern.pattern)
                .build();
            Entity::new(pattern.id, model_types::grok_pattern(), data)
        }))
    }

    async fn resolve(&self, _descriptor: &EntityDescriptor) -> Result<BTreeSet<EntityDescriptor>> {
        Ok(BTreeSet::new())
    }

    async fn find_existing(
        &self,
        entity: &Entity,
        context: &InstallationContext,
    ) -> Result<Option<NativeEntityDescriptor>> {
        let name = PayloadReader::new(&entity.data, context.parameters()).string("name")?;
        let existing = self.platform.with_state(|state| {
            state
                .grok_patterns
                .values()
                .find(|p| p.name == name)
                .cloned()
        })?;
        Ok(existing.map(|pattern| Self::native(entity, &pattern, true)))
    }

    async fn create(
        &self,
        entity: &Entity,
        context: &InstallationContext,
    ) -> Result<NativeEntityDescriptor> {
        let reader = PayloadReader::new(&entity.data, context.parameters());
        let name = reader.string("name")?;
        let pattern = reader.string("pattern")?;

        // Another install may have inserted the same name since find_existing
        let (stored, existed) = self.platform.find_or_insert_grok_pattern(&name, &pattern)?;
        if existed {
            debug!("Grok pattern {} appeared concurrently, reusing it", name);
        }
        Ok(Self::native(entity, &stored, existed))
    }

    async fn delete(&self, native: &NativeEntityDescriptor) -> Result<()> {
        self.platform
            .with_state(|state| state.grok_patterns.remove(native.id.as_str()))?
            .map(|_| ())
            .ok_or_else(|| not_found(native))
    }
}
