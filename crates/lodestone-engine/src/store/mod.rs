//! Persistence interfaces for content packs and installation records

mod file;
mod memory;

pub use file::{FileContentPackStore, FileInstallationStore};
pub use memory::{InMemoryContentPackStore, InMemoryInstallationStore};

use anyhow::Result;
use async_trait::async_trait;
use lodestone_core::types::{ContentPack, ContentPackInstallation, ModelId};

/// Source of content pack definitions
#[async_trait]
pub trait ContentPackStore: Send + Sync {
    /// Load one revision of a pack
    async fn load(&self, id: &ModelId, revision: u32) -> Result<Option<ContentPack>>;

    /// Store a pack revision, replacing an identical id and revision
    async fn save(&self, pack: &ContentPack) -> Result<()>;

    /// All stored packs
    async fn list(&self) -> Result<Vec<ContentPack>>;
}

/// Persistence of installation records
#[async_trait]
pub trait InstallationStore: Send + Sync {
    async fn save(&self, installation: &ContentPackInstallation) -> Result<()>;

    /// Delete a record; returns whether it existed
    async fn delete_by_id(&self, id: &str) -> Result<bool>;

    async fn find_by_id(&self, id: &str) -> Result<Option<ContentPackInstallation>>;

    async fn find_by_content_pack(&self, id: &ModelId) -> Result<Vec<ContentPackInstallation>>;

    async fn list(&self) -> Result<Vec<ContentPackInstallation>>;
}
