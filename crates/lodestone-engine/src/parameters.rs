//! Validation of caller-supplied parameter bindings against a pack's declarations

use lodestone_core::types::{Parameter, Parameters, ValueReference};
use lodestone_core::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Validate supplied bindings and fill in defaults
///
/// Undeclared names are dropped. Every declared parameter ends up bound,
/// either to the supplied literal (whose kind must match the declaration)
/// or to its default.
pub fn validate_parameters(
    provided: &BTreeMap<String, ValueReference>,
    declared: &[Parameter],
) -> Result<Parameters> {
    let declared_names: BTreeSet<&str> = declared.iter().map(Parameter::name).collect();

    let unused: Vec<&str> = provided
        .keys()
        .map(String::as_str)
        .filter(|name| !declared_names.contains(name))
        .collect();
    if !unused.is_empty() {
        debug!("Unused parameters: {:?}", unused);
    }

    let mut validated = BTreeMap::new();
    for parameter in declared {
        let name = parameter.name();
        let value = match provided.get(name) {
            Some(value) => {
                if value.value_type() != parameter.value_type() {
                    return Err(Error::incompatible_parameter_type(
                        name,
                        parameter.value_type(),
                        value.value_type(),
                    ));
                }
                value.clone()
            }
            None => parameter
                .default_value()
                .cloned()
                .ok_or_else(|| Error::missing_default_value(name))?,
        };
        validated.insert(name.to_string(), value);
    }

    Ok(Parameters::from_validated(validated))
}
