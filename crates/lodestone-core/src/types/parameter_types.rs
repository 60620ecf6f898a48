//! Parameter declarations and validated parameter bindings

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ValueReference, ValueType};
use crate::error::{Error, Result};

/// A named, typed parameter declared by a content pack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParameter", into = "RawParameter")]
pub struct Parameter {
    name: String,
    title: String,
    description: String,
    value_type: ValueType,
    default_value: Option<ValueReference>,
}

/// Parameter as written in a pack file, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawParameter {
    name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "type")]
    value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_value: Option<serde_json::Value>,
}

impl TryFrom<RawParameter> for Parameter {
    type Error = Error;

    fn try_from(raw: RawParameter) -> Result<Self> {
        let default_value = raw
            .default_value
            .as_ref()
            .map(|value| {
                ValueReference::from_json(raw.value_type, value)
                    .map_err(|e| Error::invalid_parameter(&raw.name, e.to_string()))
            })
            .transpose()?;

        let mut parameter = Parameter::new(raw.name, raw.value_type, default_value)?;
        parameter.title = raw.title;
        parameter.description = raw.description;
        Ok(parameter)
    }
}

impl From<Parameter> for RawParameter {
    fn from(parameter: Parameter) -> Self {
        Self {
            default_value: parameter.default_value.as_ref().and_then(ValueReference::to_json),
            name: parameter.name,
            title: parameter.title,
            description: parameter.description,
            value_type: parameter.value_type,
        }
    }
}

impl Parameter {
    /// Declare a parameter
    ///
    /// The name must not be blank, the kind must be a literal kind, and a
    /// default (when present) must be a literal of that kind.
    pub fn new(
        name: impl Into<String>,
        value_type: ValueType,
        default_value: Option<ValueReference>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::invalid_parameter(name, "name must not be blank"));
        }
        if value_type == ValueType::Parameter {
            return Err(Error::invalid_parameter(
                name,
                "declared type must be a literal type",
            ));
        }
        if let Some(default) = &default_value {
            if default.value_type() != value_type {
                return Err(Error::invalid_parameter(
                    name,
                    format!(
                        "default value has type {} but the parameter is declared as {}",
                        default.value_type(),
                        value_type
                    ),
                ));
            }
        }

        Ok(Self {
            title: name.clone(),
            name,
            description: String::new(),
            value_type,
            default_value,
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn default_value(&self) -> Option<&ValueReference> {
        self.default_value.as_ref()
    }
}

/// Validated parameter bindings covering exactly a pack's declared parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, ValueReference>);

impl Parameters {
    /// Wrap bindings that have already been validated
    pub fn from_validated(bindings: BTreeMap<String, ValueReference>) -> Self {
        Self(bindings)
    }

    pub fn get(&self, name: &str) -> Option<&ValueReference> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ValueReference)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &BTreeMap<String, ValueReference> {
        &self.0
    }

    pub fn into_inner(self) -> BTreeMap<String, ValueReference> {
        self.0
    }
}
