//! Persisted record of a completed content pack installation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ModelId, NativeEntityDescriptor, Parameters, ValueReference};

/// Snapshot of what an install requested and which live objects it produced
///
/// The record is never updated after it is written; drift between it and
/// the live objects is detected by re-deriving state, not by mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPackInstallation {
    pub id: String,
    pub content_pack_id: ModelId,
    pub content_pack_revision: u32,
    pub parameters: BTreeMap<String, ValueReference>,
    /// Live objects in creation order
    #[serde(default)]
    pub entities: Vec<NativeEntityDescriptor>,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl ContentPackInstallation {
    /// Build a record for a successful install with a fresh id
    pub fn new(
        content_pack_id: ModelId,
        content_pack_revision: u32,
        parameters: Parameters,
        entities: Vec<NativeEntityDescriptor>,
        comment: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content_pack_id,
            content_pack_revision,
            parameters: parameters.into_inner(),
            entities,
            comment: comment.into(),
            created_at: Utc::now(),
            created_by: created_by.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::model_types;

    #[test]
    fn test_record_serializes_expected_layout() {
        let native = NativeEntityDescriptor::create(
            ModelId::from("o1"),
            "5c1f",
            model_types::output(),
            "o1",
            false,
        );
        let record = ContentPackInstallation::new(
            ModelId::from("cp-1"),
            1,
            Parameters::default(),
            vec![native],
            "c",
            "u",
        );

        let json = serde_json::to_value(&record).unwrap();
        for key in [
            "id",
            "content_pack_id",
            "content_pack_revision",
            "parameters",
            "entities",
            "comment",
            "created_at",
            "created_by",
        ] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(json["content_pack_id"], "cp-1");

        let back: ContentPackInstallation = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_ids_are_unique() {
        let record = || {
            let parameters = Parameters::default();
            ContentPackInstallation::new(ModelId::from("cp"), 1, parameters, vec![], "", "u")
        };
        let a = record();
        let b = record();
        assert_ne!(a.id, b.id);
    }
}
