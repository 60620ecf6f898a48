//! Encoding live JSON values back into portable payloads

use lodestone_core::types::{Reference, ReferenceMap, ValueReference};

/// Literal payload node for a JSON value; `null` has no portable form
pub fn to_reference(value: &serde_json::Value) -> Option<Reference> {
    use serde_json::Value;

    match value {
        Value::Null => None,
        Value::Bool(b) => Some(ValueReference::Boolean(*b).into()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(ValueReference::Integer(i).into()),
            None => n.as_f64().map(|f| ValueReference::Double(f).into()),
        },
        Value::String(s) => Some(ValueReference::of(s.as_str()).into()),
        Value::Array(items) => Some(Reference::List(
            items.iter().filter_map(to_reference).collect(),
        )),
        Value::Object(map) => Some(Reference::Map(to_reference_map(map))),
    }
}

pub fn to_reference_map(map: &serde_json::Map<String, serde_json::Value>) -> ReferenceMap {
    map.iter()
        .filter_map(|(key, value)| to_reference(value).map(|r| (key.clone(), r)))
        .collect()
}

/// Payload builder for catalog encoders
#[derive(Default)]
pub struct PayloadBuilder {
    data: ReferenceMap,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(mut self, field: &str, value: impl Into<String>) -> Self {
        self.data.insert(field.to_string(), ValueReference::of(value).into());
        self
    }

    pub fn optional_string(self, field: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.string(field, value),
            None => self,
        }
    }

    pub fn boolean(mut self, field: &str, value: bool) -> Self {
        self.data.insert(field.to_string(), ValueReference::Boolean(value).into());
        self
    }

    pub fn map(mut self, field: &str, value: &serde_json::Map<String, serde_json::Value>) -> Self {
        self.data.insert(field.to_string(), Reference::Map(to_reference_map(value)));
        self
    }

    pub fn reference(mut self, field: &str, value: Reference) -> Self {
        self.data.insert(field.to_string(), value);
        self
    }

    pub fn build(self) -> ReferenceMap {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_becomes_literals() {
        let value = json!({
            "port": 5044,
            "ratio": 0.5,
            "tls": false,
            "hosts": ["a"],
            "unset": null
        });
        let map = to_reference_map(value.as_object().unwrap());

        assert_eq!(map["port"], Reference::Value(ValueReference::Integer(5044)));
        assert_eq!(map["ratio"], Reference::Value(ValueReference::Double(0.5)));
        assert_eq!(map["tls"], Reference::Value(ValueReference::Boolean(false)));
        assert_eq!(
            map["hosts"],
            Reference::List(vec![Reference::Value(ValueReference::of("a"))])
        );
        assert!(!map.contains_key("unset"));
    }
}
