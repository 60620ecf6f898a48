//! In-memory platform objects
//!
//! Stands in for the live log-management server. State can be persisted
//! to a JSON snapshot so separate CLI runs see each other's objects.

use anyhow::{anyhow, Context, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

type JsonMap = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub input_type: String,
    #[serde(default)]
    pub global: bool,
    #[serde(default)]
    pub configuration: JsonMap,
    #[serde(default)]
    pub running: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub output_type: String,
    #[serde(default)]
    pub configuration: JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Ids of live outputs
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRule {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrokPattern {
    pub id: String,
    pub name: String,
    pub pattern: String,
}

/// Every live object, keyed by id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformState {
    #[serde(default)]
    pub inputs: BTreeMap<String, Input>,
    #[serde(default)]
    pub outputs: BTreeMap<String, Output>,
    #[serde(default)]
    pub streams: BTreeMap<String, Stream>,
    #[serde(default)]
    pub pipeline_rules: BTreeMap<String, PipelineRule>,
    #[serde(default)]
    pub grok_patterns: BTreeMap<String, GrokPattern>,
}

impl PlatformState {
    pub fn object_count(&self) -> usize {
        self.inputs.len()
            + self.outputs.len()
            + self.streams.len()
            + self.pipeline_rules.len()
            + self.grok_patterns.len()
    }
}

/// Shared platform handle; every operation is one critical section
#[derive(Debug, Default)]
pub struct InMemoryPlatform {
    state: Mutex<PlatformState>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: PlatformState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Load a snapshot; a missing file yields an empty platform
    pub fn load_from(path: &Utf8Path) -> Result<Self> {
        if !path.exists() {
            debug!("No platform snapshot at {}, starting empty", path);
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read platform snapshot {}", path))?;
        let state: PlatformState = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse platform snapshot {}", path))?;
        Ok(Self::from_state(state))
    }

    pub fn save_to(&self, path: &Utf8Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot()?)
            .context("Failed to serialize platform snapshot")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent))?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write platform snapshot {}", path))?;
        Ok(())
    }

    pub fn snapshot(&self) -> Result<PlatformState> {
        Ok(self.lock()?.clone())
    }

    /// Run `f` with exclusive access to the state
    pub fn with_state<T>(&self, f: impl FnOnce(&mut PlatformState) -> T) -> Result<T> {
        let mut state = self.lock()?;
        Ok(f(&mut state))
    }

    /// Return the pattern with `name`, inserting it if absent
    ///
    /// The boolean is true when the pattern already existed.
    pub fn find_or_insert_grok_pattern(
        &self,
        name: &str,
        pattern: &str,
    ) -> Result<(GrokPattern, bool)> {
        self.with_state(|state| {
            if let Some(existing) = state.grok_patterns.values().find(|p| p.name == name) {
                return (existing.clone(), true);
            }
            let created = GrokPattern {
                id: new_id(),
                name: name.to_string(),
                pattern: pattern.to_string(),
            };
            state.grok_patterns.insert(created.id.clone(), created.clone());
            (created, false)
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, PlatformState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("platform state lock poisoned"))
    }
}

/// Fresh id for a live object
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn test_grok_find_or_insert_is_idempotent() {
        let platform = InMemoryPlatform::new();
        let (first, existed) = platform.find_or_insert_grok_pattern("IPV4", "\\d+").unwrap();
        assert!(!existed);
        let (second, existed) = platform.find_or_insert_grok_pattern("IPV4", "ignored").unwrap();
        assert!(existed);
        assert_eq!(first, second);
        assert_eq!(second.pattern, "\\d+");
        assert_eq!(platform.snapshot().unwrap().grok_patterns.len(), 1);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("state/platform.json")).unwrap();

        let platform = InMemoryPlatform::new();
        platform
            .with_state(|state| {
                state.outputs.insert(
                    "o1".into(),
                    Output {
                        id: "o1".into(),
                        title: "archive".into(),
                        output_type: "gelf".into(),
                        configuration: JsonMap::new(),
                    },
                );
            })
            .unwrap();
        platform.save_to(&path).unwrap();

        let reloaded = InMemoryPlatform::load_from(&path).unwrap();
        assert_eq!(reloaded.snapshot().unwrap(), platform.snapshot().unwrap());
        assert_eq!(reloaded.snapshot().unwrap().object_count(), 1);
    }

    #[test]
    fn test_missing_snapshot_is_empty() {
        let path = Utf8Path::new("/nonexistent/platform.json");
        let platform = InMemoryPlatform::load_from(path).unwrap();
        assert_eq!(platform.snapshot().unwrap().object_count(), 0);
    }
}
