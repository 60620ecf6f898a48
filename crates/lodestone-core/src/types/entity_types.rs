//! Entity identity, payload trees, and live-object handles

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::ValueReference;

/// Identifier of an entity inside a content pack or on the platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ModelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entity model type together with its schema version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelType {
    pub name: String,
    pub version: String,
}

impl ModelType {
    pub fn of(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

/// Model types shipped with the reference catalogs
pub mod model_types {
    use super::ModelType;

    pub const INPUT: &str = "input";
    pub const OUTPUT: &str = "output";
    pub const STREAM: &str = "stream";
    pub const PIPELINE_RULE: &str = "pipeline_rule";
    pub const GROK_PATTERN: &str = "grok_pattern";

    pub fn input() -> ModelType {
        ModelType::of(INPUT, "1")
    }

    pub fn output() -> ModelType {
        ModelType::of(OUTPUT, "1")
    }

    pub fn stream() -> ModelType {
        ModelType::of(STREAM, "1")
    }

    pub fn pipeline_rule() -> ModelType {
        ModelType::of(PIPELINE_RULE, "1")
    }

    pub fn grok_pattern() -> ModelType {
        ModelType::of(GROK_PATTERN, "1")
    }
}

/// Identity key of an entity: graph node, cross-reference target, and reuse key
///
/// Ordered by model type, then id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityDescriptor {
    #[serde(rename = "type")]
    pub model_type: ModelType,
    pub id: ModelId,
}

impl EntityDescriptor {
    pub fn new(id: ModelId, model_type: ModelType) -> Self {
        Self { id, model_type }
    }
}

impl std::fmt::Display for EntityDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.model_type, self.id)
    }
}

/// Payload object: field name to reference node
pub type ReferenceMap = BTreeMap<String, Reference>;

/// One node of an entity payload tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    /// Cross-reference to another entity of the same pack
    Entity {
        #[serde(rename = "@entity")]
        entity: EntityDescriptor,
    },
    /// Literal or parameter placeholder
    Value(ValueReference),
    /// Ordered collection
    List(Vec<Reference>),
    /// Nested object
    Map(ReferenceMap),
}

impl Reference {
    pub fn entity(descriptor: EntityDescriptor) -> Self {
        Self::Entity { entity: descriptor }
    }

    /// Collect every entity descriptor referenced at any depth below this node
    pub fn collect_references(&self, found: &mut BTreeSet<EntityDescriptor>) {
        match self {
            Reference::Entity { entity } => {
                found.insert(entity.clone());
            }
            Reference::Value(_) => {}
            Reference::List(items) => {
                for item in items {
                    item.collect_references(found);
                }
            }
            Reference::Map(map) => {
                for value in map.values() {
                    value.collect_references(found);
                }
            }
        }
    }
}

impl From<ValueReference> for Reference {
    fn from(value: ValueReference) -> Self {
        Self::Value(value)
    }
}

/// An entity definition inside a content pack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: ModelId,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    #[serde(default)]
    pub data: ReferenceMap,
}

impl Entity {
    pub fn new(id: impl Into<ModelId>, model_type: ModelType, data: ReferenceMap) -> Self {
        Self {
            id: id.into(),
            model_type,
            data,
        }
    }

    pub fn descriptor(&self) -> EntityDescriptor {
        EntityDescriptor::new(self.id.clone(), self.model_type.clone())
    }

    /// Descriptors of all other entities this one references from its payload
    pub fn references(&self) -> BTreeSet<EntityDescriptor> {
        let mut found = BTreeSet::new();
        for value in self.data.values() {
            value.collect_references(&mut found);
        }
        found
    }
}

/// Lightweight browsing view of a live object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityExcerpt {
    pub id: ModelId,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    pub title: String,
}

/// Handle to a live platform object created or reused for a pack entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NativeEntityDescriptor {
    /// Entity id inside the content pack
    pub content_pack_entity_id: ModelId,
    /// Id of the live object on the platform
    pub id: ModelId,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    pub title: String,
    /// Existing object that was reused rather than created
    #[serde(default)]
    pub found_on_system: bool,
}

impl NativeEntityDescriptor {
    pub fn create(
        content_pack_entity_id: ModelId,
        id: impl Into<ModelId>,
        model_type: ModelType,
        title: impl Into<String>,
        found_on_system: bool,
    ) -> Self {
        Self {
            content_pack_entity_id,
            id: id.into(),
            model_type,
            title: title.into(),
            found_on_system,
        }
    }

    /// Descriptor of the pack entity this object was installed for
    pub fn entity_descriptor(&self) -> EntityDescriptor {
        EntityDescriptor::new(
            self.content_pack_entity_id.clone(),
            self.model_type.clone(),
        )
    }
}

impl std::fmt::Display for NativeEntityDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}' ({})", self.model_type, self.title, self.id)
    }
}
