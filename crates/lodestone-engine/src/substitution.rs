//! Parameter substitution into entity payloads
//!
//! Catalogs decode their typed payloads through these helpers so that
//! placeholders resolve against the install's validated bindings.

use anyhow::{anyhow, Result};
use lodestone_core::types::{EntityDescriptor, Parameters, Reference, ReferenceMap, ValueReference};
use lodestone_core::Error;

/// Resolve a placeholder to its bound literal; literals pass through
pub fn resolve_value(
    value: &ValueReference,
    parameters: &Parameters,
) -> lodestone_core::Result<ValueReference> {
    match value {
        ValueReference::Parameter(name) => {
            let bound = parameters
                .get(name)
                .ok_or_else(|| Error::unbound_parameter(name))?;
            if bound.is_parameter() {
                return Err(Error::unbound_parameter(name));
            }
            Ok(bound.clone())
        }
        literal => Ok(literal.clone()),
    }
}

/// Resolve a whole payload node into plain JSON
///
/// Entity cross-references are kept as `{"@entity": ...}` objects; the
/// owning catalog maps them to live ids.
pub fn resolve_json(
    reference: &Reference,
    parameters: &Parameters,
) -> lodestone_core::Result<serde_json::Value> {
    match reference {
        Reference::Value(value) => {
            let literal = resolve_value(value, parameters)?;
            literal
                .to_json()
                .ok_or_else(|| Error::invalid_value(format!("cannot convert {} to JSON", literal)))
        }
        Reference::Entity { entity } => Ok(serde_json::json!({ "@entity": entity })),
        Reference::List(items) => items
            .iter()
            .map(|item| resolve_json(item, parameters))
            .collect::<lodestone_core::Result<Vec<_>>>()
            .map(serde_json::Value::Array),
        Reference::Map(map) => resolve_map(map, parameters).map(serde_json::Value::Object),
    }
}

/// Resolve every field of a payload map
pub fn resolve_map(
    map: &ReferenceMap,
    parameters: &Parameters,
) -> lodestone_core::Result<serde_json::Map<String, serde_json::Value>> {
    map.iter()
        .map(|(key, value)| -> lodestone_core::Result<_> {
            Ok((key.clone(), resolve_json(value, parameters)?))
        })
        .collect()
}

/// Typed field accessor over a payload map with bound parameters
pub struct PayloadReader<'a> {
    data: &'a ReferenceMap,
    parameters: &'a Parameters,
}

impl<'a> PayloadReader<'a> {
    pub fn new(data: &'a ReferenceMap, parameters: &'a Parameters) -> Self {
        Self { data, parameters }
    }

    fn value(&self, field: &str) -> Result<Option<ValueReference>> {
        match self.data.get(field) {
            None => Ok(None),
            Some(Reference::Value(value)) => Ok(Some(resolve_value(value, self.parameters)?)),
            Some(_) => Err(anyhow!("field '{}' is not a value", field)),
        }
    }

    /// Required string field
    pub fn string(&self, field: &str) -> Result<String> {
        self.optional_string(field)?
            .ok_or_else(|| anyhow!("missing required field '{}'", field))
    }

    pub fn optional_string(&self, field: &str) -> Result<Option<String>> {
        match self.value(field)? {
            None => Ok(None),
            Some(ValueReference::String(s)) => Ok(Some(s)),
            Some(other) => Err(anyhow!(
                "field '{}' must be a string, found {}",
                field,
                other.value_type()
            )),
        }
    }

    /// Boolean field with a fallback when absent
    pub fn boolean_or(&self, field: &str, default: bool) -> Result<bool> {
        match self.value(field)? {
            None => Ok(default),
            Some(ValueReference::Boolean(b)) => Ok(b),
            Some(other) => Err(anyhow!(
                "field '{}' must be a boolean, found {}",
                field,
                other.value_type()
            )),
        }
    }

    /// Nested map resolved to JSON; absent maps become empty
    pub fn map(&self, field: &str) -> Result<serde_json::Map<String, serde_json::Value>> {
        match self.data.get(field) {
            None => Ok(serde_json::Map::new()),
            Some(Reference::Map(map)) => Ok(resolve_map(map, self.parameters)?),
            Some(_) => Err(anyhow!("field '{}' must be a map", field)),
        }
    }

    /// Entity references listed under `field`
    pub fn entity_list(&self, field: &str) -> Result<Vec<EntityDescriptor>> {
        match self.data.get(field) {
            None => Ok(Vec::new()),
            Some(Reference::List(items)) => items
                .iter()
                .map(|item| match item {
                    Reference::Entity { entity } => Ok(entity.clone()),
                    _ => Err(anyhow!("field '{}' must only contain entity references", field)),
                })
                .collect(),
            Some(_) => Err(anyhow!("field '{}' must be a list", field)),
        }
    }
}
