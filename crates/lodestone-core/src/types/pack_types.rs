//! Content pack definitions

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use super::{Constraint, Entity, ModelId, Parameter};
use crate::error::{Error, Result};

/// Version tag of the only pack format with an installer
pub const CONTENT_PACK_V1: &str = "1";

/// A versioned bundle of entities, parameters, and required constraints
///
/// Each variant is one pack format; installers dispatch on the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "v")]
#[non_exhaustive]
pub enum ContentPack {
    #[serde(rename = "1")]
    V1(ContentPackV1),
}

/// Version 1 content pack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPackV1 {
    pub id: ModelId,
    pub rev: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub requires: BTreeSet<Constraint>,
}

impl ContentPack {
    /// Parse a pack from YAML (or JSON) text
    ///
    /// The version tag is read first so an unknown format is reported as
    /// unsupported rather than as a parse failure.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(content)?;
        let version = match value.get("v") {
            Some(serde_yaml_ng::Value::String(s)) => s.clone(),
            Some(serde_yaml_ng::Value::Number(n)) => n.to_string(),
            Some(_) | None => {
                return Err(Error::invalid_content_pack("missing version tag 'v'"))
            }
        };

        if version != CONTENT_PACK_V1 {
            return Err(Error::unsupported_version(version));
        }

        let mut value = value;
        if let Some(mapping) = value.as_mapping_mut() {
            mapping.insert(
                serde_yaml_ng::Value::from("v"),
                serde_yaml_ng::Value::from(CONTENT_PACK_V1),
            );
        }

        let pack: ContentPack = serde_yaml_ng::from_value(value)?;
        pack.validate()?;
        Ok(pack)
    }

    /// Load a pack file
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn version(&self) -> &'static str {
        match self {
            ContentPack::V1(_) => CONTENT_PACK_V1,
        }
    }

    pub fn id(&self) -> &ModelId {
        match self {
            ContentPack::V1(pack) => &pack.id,
        }
    }

    pub fn revision(&self) -> u32 {
        match self {
            ContentPack::V1(pack) => pack.rev,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ContentPack::V1(pack) => pack.validate(),
        }
    }
}

impl From<ContentPackV1> for ContentPack {
    fn from(pack: ContentPackV1) -> Self {
        ContentPack::V1(pack)
    }
}

impl ContentPackV1 {
    /// Create an empty pack
    pub fn new(id: impl Into<ModelId>, rev: u32) -> Self {
        Self {
            id: id.into(),
            rev,
            name: String::new(),
            summary: String::new(),
            description: String::new(),
            vendor: String::new(),
            url: None,
            parameters: Vec::new(),
            entities: Vec::new(),
            requires: BTreeSet::new(),
        }
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.requires.insert(constraint);
        self
    }

    /// Check pack-level invariants that individual fields cannot enforce
    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().trim().is_empty() {
            return Err(Error::invalid_content_pack("id must not be blank"));
        }

        let mut names = HashSet::new();
        for parameter in &self.parameters {
            if !names.insert(parameter.name()) {
                return Err(Error::invalid_parameter(
                    parameter.name(),
                    "declared more than once",
                ));
            }
        }

        for constraint in &self.requires {
            constraint.validate()?;
        }

        Ok(())
    }
}
