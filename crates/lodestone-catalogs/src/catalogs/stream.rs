use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lodestone_core::types::{
    model_types, Entity, EntityDescriptor, EntityExcerpt, ModelId, ModelType,
    NativeEntityDescriptor, Reference,
};
use lodestone_engine::substitution::PayloadReader;
use lodestone_engine::{EntityCatalog, InstallationContext};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::{excerpt, not_found};
use crate::codec::PayloadBuilder;
use crate::platform::{new_id, InMemoryPlatform, Stream};

/// Message streams routed to outputs
///
/// A stream payload lists its outputs as entity references; on create
/// they are translated to the live output ids recorded in the context.
pub struct StreamCatalog {
    platform: Arc<InMemoryPlatform>,
}

impl StreamCatalog {
    pub fn new(platform: Arc<InMemoryPlatform>) -> Self {
        Self { platform }
    }

    fn output_descriptors(stream: &Stream) -> Vec<EntityDescriptor> {
        stream
            .outputs
            .iter()
            .map(|id| EntityDescriptor::new(ModelId::from(id.as_str()), model_types::output()))
            .collect()
    }
}

#[async_trait]
impl EntityCatalog for StreamCatalog {
    fn supports(&self, model_type: &ModelType) -> bool {
        *model_type == model_types::stream()
    }

    async fn list_entity_excerpts(&self) -> Result<Vec<EntityExcerpt>> {
        self.platform.with_state(|state| {
            state
                .streams
                .values()
                .map(|s| excerpt(&s.id, model_types::stream(), &s.title))
                .collect()
        })
    }

    async fn collect_entity(&self, descriptor: &EntityDescriptor) -> Result<Option<Entity>> {
        let stream = self
            .platform
            .with_state(|state| state.streams.get(descriptor.id.as_str()).cloned())?;

        Ok(stream.map(|stream| {
            let outputs = Self::output_descriptors(&stream)
                .into_iter()
                .map(Reference::entity)
                .collect();
            let data = PayloadBuilder::new()
                .string("title", &stream.title)
                .optional_string("description", stream.description.as_deref())
                .reference("outputs", Reference::List(outputs))
                .build();
            Entity::new(stream.id, model_types::stream(), data)
        }))
    }

    async fn resolve(&self, descriptor: &EntityDescriptor) -> Result<BTreeSet<EntityDescriptor>> {
        let stream = self
            .platform
            .with_state(|state| state.streams.get(descriptor.id.as_str()).cloned())?;
        Ok(stream
            .map(|s| Self::output_descriptors(&s).into_iter().collect())
            .unwrap_or_default())
    }

    async fn create(
        &self,
        entity: &Entity,
        context: &InstallationContext,
    ) -> Result<NativeEntityDescriptor> {
        let reader = PayloadReader::new(&entity.data, context.parameters());

        let outputs = reader
            .entity_list("outputs")?
            .iter()
            .map(|output| {
                context
                    .native_id(output)
                    .map(|id| id.to_string())
                    .ok_or_else(|| anyhow!("output {} has not been installed", output))
            })
            .collect::<Result<Vec<_>>>()?;

        let stream = Stream {
            id: new_id(),
            title: reader.string("title")?,
            description: reader.optional_string("description")?,
            outputs,
            disabled: false,
        };

        let native = NativeEntityDescriptor::create(
            entity.id.clone(),
            stream.id.as_str(),
            model_types::stream(),
            stream.title.as_str(),
            false,
        );
        self.platform
            .with_state(|state| state.streams.insert(stream.id.clone(), stream))?;
        Ok(native)
    }

    fn supports_stop(&self) -> bool {
        true
    }

    async fn stop(&self, native: &NativeEntityDescriptor) -> Result<()> {
        self.platform.with_state(|state| {
            match state.streams.get_mut(native.id.as_str()) {
                Some(stream) => {
                    stream.disabled = true;
                    Ok(())
                }
                None => Err(not_found(native)),
            }
        })?
    }

    async fn delete(&self, native: &NativeEntityDescriptor) -> Result<()> {
        self.platform
            .with_state(|state| state.streams.remove(native.id.as_str()))?
            .map(|_| ())
            .ok_or_else(|| not_found(native))
    }
}
