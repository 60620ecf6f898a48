//! File-backed stores
//!
//! Content packs live as one YAML file per revision in a directory.
//! Installation records live in a single JSON file guarded by an exclusive
//! file lock, so concurrent installs from separate processes do not lose
//! each other's records.

use anyhow::{Context, Result};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use fs4::fs_std::FileExt;
use lodestone_core::types::{ContentPack, ContentPackInstallation, ModelId};
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use tracing::{debug, warn};

use super::{ContentPackStore, InstallationStore};

/// Directory of content pack files
pub struct FileContentPackStore {
    dir: Utf8PathBuf,
}

impl FileContentPackStore {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File for a pack revision; ids that could escape the directory are rejected
    fn path_for(&self, id: &ModelId, revision: u32) -> Result<Utf8PathBuf> {
        let raw = id.as_str();
        if raw.is_empty() || raw.contains(['/', '\\']) || raw.contains("..") {
            anyhow::bail!("Content pack id {:?} cannot be used as a file name", raw);
        }
        Ok(self.dir.join(format!("{}-{}.yaml", raw, revision)))
    }

    fn is_pack_file(path: &Utf8Path) -> bool {
        matches!(path.extension(), Some("yaml" | "yml" | "json"))
    }

    /// Parse every pack file in the directory, skipping unreadable ones
    fn scan(dir: &Utf8Path) -> Result<Vec<ContentPack>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut packs = Vec::new();
        let mut entries: Vec<_> = dir
            .read_dir_utf8()
            .with_context(|| format!("Failed to read content pack directory {}", dir))?
            .filter_map(|e| e.ok())
            .map(|e| e.path().to_owned())
            .filter(|p| Self::is_pack_file(p))
            .collect();
        entries.sort();

        for path in entries {
            match ContentPack::load(&path) {
                Ok(pack) => packs.push(pack),
                Err(e) => warn!("Skipping unreadable content pack {}: {}", path, e),
            }
        }
        Ok(packs)
    }
}

#[async_trait]
impl ContentPackStore for FileContentPackStore {
    async fn load(&self, id: &ModelId, revision: u32) -> Result<Option<ContentPack>> {
        let path = self.path_for(id, revision)?;
        let dir = self.dir.clone();
        let id = id.clone();

        tokio::task::spawn_blocking(move || {
            if path.exists() {
                let pack = ContentPack::load(&path)
                    .with_context(|| format!("Failed to load content pack {}", path))?;
                return Ok(Some(pack));
            }
            // Hand-authored files may use any name
            Ok(Self::scan(&dir)?
                .into_iter()
                .find(|p| p.id() == &id && p.revision() == revision))
        })
        .await
        .context("Content pack load task panicked")?
    }

    async fn save(&self, pack: &ContentPack) -> Result<()> {
        let path = self.path_for(pack.id(), pack.revision())?;
        let dir = self.dir.clone();
        let content =
            serde_yaml_ng::to_string(pack).context("Failed to serialize content pack")?;

        tokio::task::spawn_blocking(move || {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create content pack directory {}", dir))?;
            fs::write(&path, content)
                .with_context(|| format!("Failed to write content pack {}", path))?;
            debug!("Saved content pack to {}", path);
            Ok(())
        })
        .await
        .context("Content pack save task panicked")?
    }

    async fn list(&self) -> Result<Vec<ContentPack>> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || Self::scan(&dir))
            .await
            .context("Content pack list task panicked")?
    }
}

/// Installation records in one JSON file
pub struct FileInstallationStore {
    path: Utf8PathBuf,
}

impl FileInstallationStore {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(path: &Utf8Path) -> Result<Vec<ContentPackInstallation>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = fs::File::open(path).context("Failed to open installation store")?;
        file.lock_shared()
            .context("Failed to acquire shared lock on installation store")?;
        let mut content = String::new();
        (&file)
            .read_to_string(&mut content)
            .context("Failed to read installation store")?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Vec<ContentPackInstallation>> {
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(content).context("Failed to parse installation store")
    }

    /// Read-modify-write under an exclusive lock
    fn modify<T>(
        path: &Utf8Path,
        f: impl FnOnce(&mut Vec<ContentPackInstallation>) -> T,
    ) -> Result<T> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create installation store directory")?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .context("Failed to open installation store")?;

        // Released when `file` is dropped
        file.lock_exclusive()
            .context("Failed to acquire exclusive lock on installation store")?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read installation store")?;
        let mut records = Self::parse(&content)?;

        let result = f(&mut records);

        let json = serde_json::to_string_pretty(&records)
            .context("Failed to serialize installations")?;
        file.seek(SeekFrom::Start(0))?;
        file.set_len(0)?;
        file.write_all(json.as_bytes())
            .context("Failed to write installation store")?;
        file.sync_all().context("Failed to sync installation store")?;

        Ok(result)
    }

    async fn run<T: Send + 'static>(
        &self,
        f: impl FnOnce(&Utf8Path) -> Result<T> + Send + 'static,
    ) -> Result<T> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || f(&path))
            .await
            .context("Installation store task panicked")?
    }
}

#[async_trait]
impl InstallationStore for FileInstallationStore {
    async fn save(&self, installation: &ContentPackInstallation) -> Result<()> {
        let installation = installation.clone();
        self.run(move |path| {
            Self::modify(path, |records| {
                records.retain(|r| r.id != installation.id);
                records.push(installation);
            })
        })
        .await
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.run(move |path| {
            if !path.exists() {
                return Ok(false);
            }
            Self::modify(path, |records| {
                let before = records.len();
                records.retain(|r| r.id != id);
                records.len() != before
            })
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ContentPackInstallation>> {
        let id = id.to_string();
        self.run(move |path| Ok(Self::read_all(path)?.into_iter().find(|r| r.id == id)))
            .await
    }

    async fn find_by_content_pack(&self, id: &ModelId) -> Result<Vec<ContentPackInstallation>> {
        let id = id.clone();
        self.run(move |path| {
            Ok(Self::read_all(path)?
                .into_iter()
                .filter(|r| r.content_pack_id == id)
                .collect())
        })
        .await
    }

    async fn list(&self) -> Result<Vec<ContentPackInstallation>> {
        self.run(|path| Self::read_all(path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_core::types::{ContentPackV1, Parameters};

    fn utf8(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[tokio::test]
    async fn test_pack_round_trip_through_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileContentPackStore::new(utf8(&dir).join("packs"));

        let pack: ContentPack = ContentPackV1::new("cp-1", 4).into();
        store.save(&pack).await.unwrap();

        let loaded = store.load(&ModelId::from("cp-1"), 4).await.unwrap();
        assert_eq!(loaded, Some(pack));
        assert!(store.load(&ModelId::from("cp-1"), 5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pack_found_under_arbitrary_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(&dir);
        fs::write(root.join("beats.yml"), "v: \"1\"\nid: beats\nrev: 2\n").unwrap();
        fs::write(root.join("broken.yaml"), "v: [").unwrap();

        let store = FileContentPackStore::new(root);
        let loaded = store.load(&ModelId::from("beats"), 2).await.unwrap();
        assert!(loaded.is_some());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_pack_id_cannot_escape_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(&dir);
        let store = FileContentPackStore::new(root.join("packs"));

        for id in ["../outside", "nested/pack", "..", "back\\slash"] {
            let pack: ContentPack = ContentPackV1::new(id, 1).into();
            assert!(store.save(&pack).await.is_err(), "{} was accepted", id);
            assert!(store.load(&ModelId::from(id), 1).await.is_err());
        }
        assert!(!root.join("outside-1.yaml").exists());
        assert!(!root.join("packs").exists());
    }

    #[tokio::test]
    async fn test_installation_records_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = utf8(&dir).join("state").join("installations.json");
        let store = FileInstallationStore::new(path.clone());

        let record = |id: &str, comment: &str| {
            let parameters = Parameters::default();
            ContentPackInstallation::new(ModelId::from(id), 1, parameters, vec![], comment, "u")
        };
        let first = record("cp", "one");
        let second = record("other", "two");
        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();

        let reopened = FileInstallationStore::new(path);
        assert_eq!(reopened.list().await.unwrap().len(), 2);
        assert_eq!(reopened.find_by_id(&first.id).await.unwrap(), Some(first.clone()));
        assert_eq!(
            reopened.find_by_content_pack(&ModelId::from("other")).await.unwrap(),
            vec![second]
        );

        assert!(reopened.delete_by_id(&first.id).await.unwrap());
        assert!(reopened.find_by_id(&first.id).await.unwrap().is_none());
        assert_eq!(reopened.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_without_file_is_false() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileInstallationStore::new(utf8(&dir).join("none.json"));
        assert!(!store.delete_by_id("missing").await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }
}
