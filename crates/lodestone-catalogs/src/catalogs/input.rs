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
use crate::platform::{new_id, InMemoryPlatform, Input};

/// Message inputs; running inputs are stopped before removal
pub struct InputCatalog {
    platform: Arc<InMemoryPlatform>,
}

impl InputCatalog {
    pub fn new(platform: Arc<InMemoryPlatform>) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl EntityCatalog for InputCatalog {
    fn supports(&self, model_type: &ModelType) -> bool {
        *model_type == model_types::input()
    }

    async fn list_entity_excerpts(&self) -> Result<Vec<EntityExcerpt>> {
        self.platform.with_state(|state| {
            state
                .inputs
                .values()
                .map(|i| excerpt(&i.id, model_types::input(), &i.title))
                .collect()
        })
    }

    async fn collect_entity(&self, descriptor: &EntityDescriptor) -> Result<Option<Entity>> {
        let input = self
            .platform
            .with_state(|state| state.inputs.get(descriptor.id.as_str()).cloned())?;

        Ok(input.map(|input| {
            let data = PayloadBuilder::new()
                .string("title", &input.title)
                .string("type", &input.input_type)
                .boolean("global", input.global)
                .map("configuration", &input.configuration)
                .build();
            Entity::new(input.id, model_types::input(), data)
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
        let input = Input {
            id: new_id(),
            title: reader.string("title")?,
            input_type: reader.string("type")?,
            global: reader.boolean_or("global", false)?,
            configuration: reader.map("configuration")?,
            running: true,
        };

        let native = NativeEntityDescriptor::create(
            entity.id.clone(),
            input.id.as_str(),
            model_types::input(),
            input.title.as_str(),
            false,
        );
        debug!("Launching input {} ({})", input.title, input.input_type);
        self.platform
            .with_state(|state| state.inputs.insert(input.id.clone(), input))?;
        Ok(native)
    }

    fn supports_stop(&self) -> bool {
        true
    }

    async fn stop(&self, native: &NativeEntityDescriptor) -> Result<()> {
        self.platform.with_state(|state| {
            match state.inputs.get_mut(native.id.as_str()) {
                Some(input) => {
                    input.running = false;
                    Ok(())
                }
                None => Err(not_found(native)),
            }
        })?
    }

    async fn delete(&self, native: &NativeEntityDescriptor) -> Result<()> {
        self.platform
            .with_state(|state| state.inputs.remove(native.id.as_str()))?
            .map(|_| ())
            .ok_or_else(|| not_found(native))
    }
}
