//! Builders for content pack test fixtures

#![allow(dead_code)]

use lodestone_core::types::{
    Constraint, ContentPack, ContentPackV1, Entity, EntityDescriptor, ModelId, ModelType, Parameter,
    Reference, ReferenceMap, ValueReference,
};

/// Payload field holding an entity's cross-references
pub const DEPENDS_ON: &str = "depends_on";

pub fn descriptor(id: &str, model_type: ModelType) -> EntityDescriptor {
    EntityDescriptor::new(ModelId::from(id), model_type)
}

/// Builder for a single entity and its references
pub struct EntityBuilder {
    id: String,
    model_type: ModelType,
    data: ReferenceMap,
    depends_on: Vec<EntityDescriptor>,
}

impl EntityBuilder {
    pub fn new(id: &str, model_type: ModelType) -> Self {
        Self {
            id: id.to_string(),
            model_type,
            data: ReferenceMap::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: ValueReference) -> Self {
        self.data.insert(name.to_string(), value.into());
        self
    }

    pub fn depends_on(mut self, dependency: EntityDescriptor) -> Self {
        self.depends_on.push(dependency);
        self
    }

    pub fn build(mut self) -> Entity {
        if !self.depends_on.is_empty() {
            let refs = self.depends_on.into_iter().map(Reference::entity).collect();
            self.data.insert(DEPENDS_ON.to_string(), Reference::List(refs));
        }
        Entity::new(self.id, self.model_type, self.data)
    }
}

/// Builder for V1 content packs
pub struct ContentPackBuilder {
    pack: ContentPackV1,
}

impl ContentPackBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            pack: ContentPackV1::new(id, 1),
        }
    }

    pub fn with_revision(mut self, rev: u32) -> Self {
        self.pack.rev = rev;
        self
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.pack = self.pack.with_entity(entity);
        self
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.pack = self.pack.with_parameter(parameter);
        self
    }

    pub fn requires(mut self, constraint: Constraint) -> Self {
        self.pack = self.pack.with_constraint(constraint);
        self
    }

    pub fn build(self) -> ContentPack {
        self.pack.into()
    }
}

/// Pack of `count` independent entities `e1..eN`, created in id order
pub fn independent_pack(id: &str, model_type: ModelType, count: usize) -> ContentPack {
    (1..=count)
        .fold(ContentPackBuilder::new(id), |builder, i| {
            builder.with_entity(EntityBuilder::new(&format!("e{}", i), model_type.clone()).build())
        })
        .build()
}
