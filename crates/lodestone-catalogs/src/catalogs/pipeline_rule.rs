use anyhow::Result;
use async_trait::async_trait;
use lodestone_core::types::{
    model_types, Entity, EntityDescriptor, EntityExcerpt, ModelType, NativeEntityDescriptor,
};
use lodestone_engine::substitution::PayloadReader;
use lodestone_engine::{EntityCatalog, InstallationContext};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::{excerpt, not_found};
use crate::codec::PayloadBuilder;
use crate::platform::{new_id, InMemoryPlatform, PipelineRule};

pub struct PipelineRuleCatalog {
    platform: Arc<InMemoryPlatform>,
}

impl PipelineRuleCatalog {
    pub fn new(platform: Arc<InMemoryPlatform>) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl EntityCatalog for PipelineRuleCatalog {
    fn supports(&self, model_type: &ModelType) -> bool {
        *model_type == model_types::pipeline_rule()
    }

    async fn list_entity_excerpts(&self) -> Result<Vec<EntityExcerpt>> {
        self.platform.with_state(|state| {
            state
                .pipeline_rules
                .values()
                .map(|r| excerpt(&r.id, model_types::pipeline_rule(), &r.title))
                .collect()
        })
    }

    async fn collect_entity(&self, descriptor: &EntityDescriptor) -> Result<Option<Entity>> {
        let rule = self
            .platform
            .with_state(|state| state.pipeline_rules.get(descriptor.id.as_str()).cloned())?;

        Ok(rule.map(|rule| {
            let data = PayloadBuilder::new()
                .string("title", &rule.title)
                .optional_string("description", rule.description.as_deref())
                .string("source", &rule.source)
                .build();
            Entity::new(rule.id, model_types::pipeline_rule(), data)
        }))
    }

    async fn resolve(&self, _descriptor: &EntityDescriptor) -> Result<BTreeSet<EntityDescriptor>> {
        Ok(BTreeSet::new())
    }

    async fn create(
        &self,
        entity: &Entity,
        context: &InstallationContext,
    ) -> Result<NativeEntityDescriptor> {
        let reader = PayloadReader::new(&entity.data, context.parameters());
        let rule = PipelineRule {
            id: new_id(),
            title: reader.string("title")?,
            description: reader.optional_string("description")?,
            source: reader.string("source")?,
        };

        let native = NativeEntityDescriptor::create(
            entity.id.clone(),
            rule.id.as_str(),
            model_types::pipeline_rule(),
            rule.title.as_str(),
            false,
        );
        self.platform
            .with_state(|state| state.pipeline_rules.insert(rule.id.clone(), rule))?;
        Ok(native)
    }

    async fn delete(&self, native: &NativeEntityDescriptor) -> Result<()> {
        self.platform
            .with_state(|state| state.pipeline_rules.remove(native.id.as_str()))?
            .map(|_| ())
            .ok_or_else(|| not_found(native))
    }
}
