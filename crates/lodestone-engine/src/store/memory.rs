//! In-memory stores, used by tests and embedders

use anyhow::Result;
use async_trait::async_trait;
use lodestone_core::types::{ContentPack, ContentPackInstallation, ModelId};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{ContentPackStore, InstallationStore};

#[derive(Default)]
pub struct InMemoryContentPackStore {
    packs: RwLock<BTreeMap<(ModelId, u32), ContentPack>>,
}

impl InMemoryContentPackStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentPackStore for InMemoryContentPackStore {
    async fn load(&self, id: &ModelId, revision: u32) -> Result<Option<ContentPack>> {
        Ok(self.packs.read().await.get(&(id.clone(), revision)).cloned())
    }

    async fn save(&self, pack: &ContentPack) -> Result<()> {
        self.packs
            .write()
            .await
            .insert((pack.id().clone(), pack.revision()), pack.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ContentPack>> {
        Ok(self.packs.read().await.values().cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryInstallationStore {
    installations: RwLock<BTreeMap<String, ContentPackInstallation>>,
}

impl InMemoryInstallationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.installations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.installations.read().await.is_empty()
    }
}

#[async_trait]
impl InstallationStore for InMemoryInstallationStore {
    async fn save(&self, installation: &ContentPackInstallation) -> Result<()> {
        self.installations
            .write()
            .await
            .insert(installation.id.clone(), installation.clone());
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        Ok(self.installations.write().await.remove(id).is_some())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ContentPackInstallation>> {
        Ok(self.installations.read().await.get(id).cloned())
    }

    async fn find_by_content_pack(&self, id: &ModelId) -> Result<Vec<ContentPackInstallation>> {
        Ok(self
            .installations
            .read()
            .await
            .values()
            .filter(|i| &i.content_pack_id == id)
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<ContentPackInstallation>> {
        Ok(self.installations.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_core::types::{ContentPackV1, Parameters};

    #[tokio::test]
    async fn test_pack_store_keys_by_revision() {
        let store = InMemoryContentPackStore::new();
        store.save(&ContentPackV1::new("cp", 1).into()).await.unwrap();
        store.save(&ContentPackV1::new("cp", 2).into()).await.unwrap();

        let id = ModelId::from("cp");
        assert_eq!(store.load(&id, 2).await.unwrap().unwrap().revision(), 2);
        assert!(store.load(&id, 3).await.unwrap().is_none());
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_installation_store_delete() {
        let store = InMemoryInstallationStore::new();
        let parameters = Parameters::default();
        let record =
            ContentPackInstallation::new(ModelId::from("cp"), 1, parameters, vec![], "", "u");
        store.save(&record).await.unwrap();

        assert_eq!(store.find_by_content_pack(&ModelId::from("cp")).await.unwrap().len(), 1);
        assert!(store.delete_by_id(&record.id).await.unwrap());
        assert!(!store.delete_by_id(&record.id).await.unwrap());
        assert!(store.is_empty().await);
    }
}
