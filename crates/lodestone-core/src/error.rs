//! Error types for lodestone-core

use std::fmt::Display;

use thiserror::Error;

use crate::types::{Constraint, EntityDescriptor, ModelType, ValueType};

/// Result type alias using lodestone-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Lodestone
#[derive(Error, Debug)]
pub enum Error {
    /// Content pack version tag has no installer
    #[error("Unsupported content pack version: {version}")]
    UnsupportedVersion { version: String },

    /// Required constraints nobody could confirm
    #[error("Unfulfilled constraints: {}", join(.missing))]
    UnfulfilledConstraints { missing: Vec<Constraint> },

    /// Declared parameter was not supplied and has no default
    #[error("Empty default value for missing parameter {parameter}")]
    MissingDefaultValue { parameter: String },

    /// Supplied parameter value has the wrong kind
    #[error(
        "Incompatible value types for parameter {parameter}, \
         content pack expected {expected}, parameters provided {provided}"
    )]
    IncompatibleParameterType {
        parameter: String,
        expected: ValueType,
        provided: ValueType,
    },

    /// Entities referenced by the pack but not declared in it
    #[error("Unexpected entities in content pack: {}", join(.entities))]
    UnexpectedEntity { entities: Vec<EntityDescriptor> },

    /// Two entities share a descriptor
    #[error("Duplicate entity in content pack: {entity}")]
    DuplicateEntity { entity: EntityDescriptor },

    /// Entity references form a cycle
    #[error("Circular dependency detected: {}", chain(.cycle))]
    CyclicDependency { cycle: Vec<EntityDescriptor> },

    /// Creating a live object failed; everything created before it was removed
    #[error("Failed to create entity {entity}: {source}")]
    EntityCreationFailed {
        entity: EntityDescriptor,
        #[source]
        source: anyhow::Error,
    },

    /// No registered catalog handles this model type
    #[error("No entity catalog registered for model type {model_type}")]
    NoCatalog { model_type: ModelType },

    /// A placeholder names a parameter with no binding
    #[error("Parameter {parameter} is referenced but not bound")]
    UnboundParameter { parameter: String },

    /// A value does not match its declared type
    #[error("Invalid value: {message}")]
    InvalidValue { message: String },

    /// Invalid parameter declaration
    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: String, message: String },

    /// Invalid constraint declaration
    #[error("Invalid constraint {constraint}: {message}")]
    InvalidConstraint { constraint: String, message: String },

    /// Structurally invalid content pack
    #[error("Invalid content pack: {message}")]
    InvalidContentPack { message: String },

    /// Install was cancelled between two entities
    #[error("Installation cancelled")]
    Cancelled,

    /// A catalog failed while listing or exporting live objects
    #[error("Catalog error: {message}: {source}")]
    Catalog {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// Content pack or installation store failure
    #[error("Store error: {message}: {source}")]
    Store {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

fn join<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn chain<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl Error {
    /// Create an unsupported version error
    pub fn unsupported_version(version: impl Into<String>) -> Self {
        Self::UnsupportedVersion {
            version: version.into(),
        }
    }

    /// Create a missing default value error
    pub fn missing_default_value(parameter: impl Into<String>) -> Self {
        Self::MissingDefaultValue {
            parameter: parameter.into(),
        }
    }

    /// Create an incompatible parameter type error
    pub fn incompatible_parameter_type(
        parameter: impl Into<String>,
        expected: ValueType,
        provided: ValueType,
    ) -> Self {
        Self::IncompatibleParameterType {
            parameter: parameter.into(),
            expected,
            provided,
        }
    }

    /// Wrap a catalog failure for one entity
    pub fn entity_creation_failed(entity: EntityDescriptor, source: anyhow::Error) -> Self {
        Self::EntityCreationFailed { entity, source }
    }

    /// Create an unbound parameter error
    pub fn unbound_parameter(parameter: impl Into<String>) -> Self {
        Self::UnboundParameter {
            parameter: parameter.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid constraint error
    pub fn invalid_constraint(constraint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConstraint {
            constraint: constraint.into(),
            message: message.into(),
        }
    }

    /// Create an invalid content pack error
    pub fn invalid_content_pack(message: impl Into<String>) -> Self {
        Self::InvalidContentPack {
            message: message.into(),
        }
    }

    /// Wrap a store failure
    pub fn store(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Store {
            message: message.into(),
            source,
        }
    }

    /// Wrap a catalog failure outside of install
    pub fn catalog(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Catalog {
            message: message.into(),
            source,
        }
    }

    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error aborted the install before any entity was touched
    pub fn is_pre_install(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedVersion { .. }
                | Self::UnfulfilledConstraints { .. }
                | Self::MissingDefaultValue { .. }
                | Self::IncompatibleParameterType { .. }
                | Self::UnexpectedEntity { .. }
                | Self::DuplicateEntity { .. }
                | Self::CyclicDependency { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{model_types, ModelId};

    #[test]
    fn test_unfulfilled_constraints_lists_all_missing() {
        let err = Error::UnfulfilledConstraints {
            missing: vec![
                Constraint::server_version(">=5.0.0").unwrap(),
                Constraint::plugin_version("org.example.geo", "^1.2").unwrap(),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("server-version >=5.0.0"));
        assert!(msg.contains("plugin org.example.geo ^1.2"));
    }

    #[test]
    fn test_cycle_is_rendered_as_path() {
        let a = EntityDescriptor::new(ModelId::from("a"), model_types::stream());
        let b = EntityDescriptor::new(ModelId::from("b"), model_types::output());
        let err = Error::CyclicDependency {
            cycle: vec![a.clone(), b, a],
        };
        assert_eq!(
            err.to_string(),
            "Circular dependency detected: stream:1/a -> output:1/b -> stream:1/a"
        );
    }

    #[test]
    fn test_entity_creation_failed_keeps_source() {
        let entity = EntityDescriptor::new(ModelId::from("o1"), model_types::output());
        let err = Error::entity_creation_failed(entity, anyhow::anyhow!("disk full"));
        assert!(err.to_string().contains("disk full"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_pre_install());
    }

    #[test]
    fn test_pre_install_classification() {
        assert!(Error::missing_default_value("port").is_pre_install());
        assert!(Error::unsupported_version("2").is_pre_install());
        assert!(!Error::Cancelled.is_pre_install());
    }
}
