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
use crate::platform::{new_id, InMemoryPlatform, Output};

pub struct OutputCatalog {
    platform: Arc<InMemoryPlatform>,
}

impl OutputCatalog {
    pub fn new(platform: Arc<InMemoryPlatform>) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl EntityCatalog for OutputCatalog {
    fn supports(&self, model_type: &ModelType) -> bool {
        *model_type == model_types::output()
    }

    async fn list_entity_excerpts(&self) -> Result<Vec<EntityExcerpt>> {
        self.platform.with_state(|state| {
            state
                .outputs
                .values()
                .map(|o| excerpt(&o.id, model_types::output(), &o.title))
                .collect()
        })
    }

    async fn collect_entity(&self, descriptor: &EntityDescriptor) -> Result<Option<Entity>> {
        let output = self
            .platform
            .with_state(|state| state.outputs.get(descriptor.id.as_str()).cloned())?;

        Ok(output.map(|output| {
            let data = PayloadBuilder::new()
                .string("title", &output.title)
                .string("type", &output.output_type)
                .map("configuration", &output.configuration)
                .build();
            Entity::new(output.id, model_types::output(), data)
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
        let output = Output {
            id: new_id(),
            title: reader.string("title")?,
            output_type: reader.string("type")?,
            configuration: reader.map("configuration")?,
        };

        let native = NativeEntityDescriptor::create(
            entity.id.clone(),
            output.id.as_str(),
            model_types::output(),
            output.title.as_str(),
            false,
        );
        self.platform
            .with_state(|state| state.outputs.insert(output.id.clone(), output))?;
        Ok(native)
    }

    async fn delete(&self, native: &NativeEntityDescriptor) -> Result<()> {
        let removed = self.platform.with_state(|state| {
            // Streams must not keep pointing at a removed output
            for stream in state.streams.values_mut() {
                stream.outputs.retain(|id| id != native.id.as_str());
            }
            state.outputs.remove(native.id.as_str())
        })?;
        removed.map(|_| ()).ok_or_else(|| not_found(native))
    }
}
