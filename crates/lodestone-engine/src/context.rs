//! In-progress state of a single install attempt

use lodestone_core::types::{EntityDescriptor, ModelId, NativeEntityDescriptor, Parameters};
use std::collections::HashMap;

/// Accumulates the live objects produced while one install runs
///
/// Owned by the installer and handed to catalogs by shared reference, so
/// there is exactly one writer. Entries keep creation order; unwind walks
/// them backwards.
#[derive(Debug, Clone)]
pub struct InstallationContext {
    parameters: Parameters,
    entities: Vec<NativeEntityDescriptor>,
    index: HashMap<EntityDescriptor, usize>,
    comment: String,
    username: String,
}

impl InstallationContext {
    pub fn new(
        parameters: Parameters,
        comment: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            parameters,
            entities: Vec::new(),
            index: HashMap::new(),
            comment: comment.into(),
            username: username.into(),
        }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Record the live object installed for a pack entity
    pub fn add_entity(&mut self, native: NativeEntityDescriptor) {
        let descriptor = native.entity_descriptor();
        self.index.insert(descriptor, self.entities.len());
        self.entities.push(native);
    }

    /// Live object installed for a pack entity, if it has been processed
    pub fn native_entity(&self, descriptor: &EntityDescriptor) -> Option<&NativeEntityDescriptor> {
        self.index.get(descriptor).map(|&i| &self.entities[i])
    }

    /// Live id of a dependency, for catalogs that translate cross-references
    pub fn native_id(&self, descriptor: &EntityDescriptor) -> Option<&ModelId> {
        self.native_entity(descriptor).map(|native| &native.id)
    }

    /// Objects this install created (not reused), newest first
    pub fn created_newest_first(&self) -> impl Iterator<Item = &NativeEntityDescriptor> {
        self.entities.iter().rev().filter(|native| !native.found_on_system)
    }

    pub fn entities(&self) -> &[NativeEntityDescriptor] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Consume the context, yielding bindings and live objects in creation order
    pub fn into_parts(self) -> (Parameters, Vec<NativeEntityDescriptor>) {
        (self.parameters, self.entities)
    }
}
