//! Literal-or-parameter values used throughout entity payloads

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Primitive kinds a value reference can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Integer,
    Double,
    Boolean,
    Parameter,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::String => write!(f, "string"),
            ValueType::Integer => write!(f, "integer"),
            ValueType::Double => write!(f, "double"),
            ValueType::Boolean => write!(f, "boolean"),
            ValueType::Parameter => write!(f, "parameter"),
        }
    }
}

/// A value that is either a typed literal or a named-parameter placeholder
///
/// Serialized as `{"type": "string", "value": "..."}`; a placeholder is
/// `{"type": "parameter", "value": "PARAM_NAME"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ValueReference {
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    Parameter(String),
}

impl ValueReference {
    /// Create a string literal
    pub fn of(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Create a placeholder for a named parameter
    pub fn parameter(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::invalid_value("parameter name must not be blank"));
        }
        Ok(Self::Parameter(name))
    }

    /// Build a literal of the given kind from a JSON value
    pub fn from_json(value_type: ValueType, value: &serde_json::Value) -> Result<Self> {
        let mismatch =
            || Error::invalid_value(format!("expected {} but found {}", value_type, value));

        match value_type {
            ValueType::String => value
                .as_str()
                .map(|s| Self::String(s.to_string()))
                .ok_or_else(mismatch),
            ValueType::Integer => value.as_i64().map(Self::Integer).ok_or_else(mismatch),
            ValueType::Double => value.as_f64().map(Self::Double).ok_or_else(mismatch),
            ValueType::Boolean => value.as_bool().map(Self::Boolean).ok_or_else(mismatch),
            ValueType::Parameter => Err(Error::invalid_value(
                "a literal cannot have the parameter type",
            )),
        }
    }

    /// Parse a literal of the given kind from its textual form
    pub fn parse(value_type: ValueType, raw: &str) -> Result<Self> {
        let invalid = |e: &dyn std::fmt::Display| {
            Error::invalid_value(format!("'{}' is not a valid {}: {}", raw, value_type, e))
        };

        match value_type {
            ValueType::String => Ok(Self::String(raw.to_string())),
            ValueType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Self::Integer)
                .map_err(|e| invalid(&e)),
            ValueType::Double => raw
                .trim()
                .parse::<f64>()
                .map(Self::Double)
                .map_err(|e| invalid(&e)),
            ValueType::Boolean => raw
                .trim()
                .parse::<bool>()
                .map(Self::Boolean)
                .map_err(|e| invalid(&e)),
            ValueType::Parameter => Self::parameter(raw),
        }
    }

    /// Kind carried by this reference
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::String(_) => ValueType::String,
            Self::Integer(_) => ValueType::Integer,
            Self::Double(_) => ValueType::Double,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Parameter(_) => ValueType::Parameter,
        }
    }

    /// Whether this is a named-parameter placeholder
    pub fn is_parameter(&self) -> bool {
        matches!(self, Self::Parameter(_))
    }

    /// Placeholder name, if this is one
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            Self::Parameter(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Convert a literal into plain JSON; placeholders have no JSON form
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Self::String(s) => Some(serde_json::Value::from(s.as_str())),
            Self::Integer(i) => Some(serde_json::Value::from(*i)),
            Self::Double(d) => Some(serde_json::Value::from(*d)),
            Self::Boolean(b) => Some(serde_json::Value::from(*b)),
            Self::Parameter(_) => None,
        }
    }
}

impl std::fmt::Display for ValueReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Double(d) => write!(f, "{}", d),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Parameter(name) => write!(f, "${{{}}}", name),
        }
    }
}
