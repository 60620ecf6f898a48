//! Mock platform components
//!
//! Catalogs share one journal so tests can assert the global order of
//! create, stop, and delete calls across model types.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lodestone_core::types::{
    Constraint, ContentPackInstallation, Entity, EntityDescriptor, EntityExcerpt, ModelId,
    ModelType, NativeEntityDescriptor,
};
use lodestone_engine::store::{InMemoryContentPackStore, InMemoryInstallationStore};
use lodestone_engine::{
    CancellationFlag, CatalogRegistry, ConstraintChecker, ConstraintCheckerRegistry,
    ContentPackService, EntityCatalog, InstallationContext, InstallationStore,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One platform call made by a catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    Created(EntityDescriptor),
    Reused(EntityDescriptor),
    Stopped(ModelId),
    Deleted(ModelId),
}

/// Shared, ordered record of catalog calls
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<CatalogEvent>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: CatalogEvent) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<CatalogEvent> {
        self.0.lock().unwrap().clone()
    }

    /// Pack entity ids in creation order
    pub fn created(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                CatalogEvent::Created(d) => Some(d.id.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Native ids in deletion order
    pub fn deleted(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                CatalogEvent::Deleted(id) => Some(id.to_string()),
                _ => None,
            })
            .collect()
    }
}

/// Native id the recording catalog assigns to a pack entity
pub fn native_id(entity_id: &str) -> String {
    format!("live-{}", entity_id)
}

/// Catalog that journals calls and fails on request
pub struct RecordingCatalog {
    model_type: ModelType,
    journal: Journal,
    live: Mutex<BTreeMap<ModelId, NativeEntityDescriptor>>,
    create_calls: AtomicUsize,
    fail_create_at: Option<usize>,
    fail_delete: BTreeSet<String>,
    fail_stop: BTreeSet<String>,
    singleton: bool,
    stoppable: bool,
    cancel_after: Option<(usize, CancellationFlag)>,
}

impl RecordingCatalog {
    pub fn new(model_type: ModelType, journal: &Journal) -> Self {
        Self {
            model_type,
            journal: journal.clone(),
            live: Mutex::new(BTreeMap::new()),
            create_calls: AtomicUsize::new(0),
            fail_create_at: None,
            fail_delete: BTreeSet::new(),
            fail_stop: BTreeSet::new(),
            singleton: false,
            stoppable: false,
            cancel_after: None,
        }
    }

    /// Fail the nth create call (1-based)
    pub fn failing_create_at(mut self, call: usize) -> Self {
        self.fail_create_at = Some(call);
        self
    }

    /// Fail deletion of the object installed for this pack entity
    pub fn failing_delete_of(mut self, entity_id: &str) -> Self {
        self.fail_delete.insert(native_id(entity_id));
        self
    }

    pub fn failing_stop_of(mut self, entity_id: &str) -> Self {
        self.fail_stop.insert(native_id(entity_id));
        self
    }

    /// Reuse a live object with the same id instead of creating another
    pub fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    pub fn stoppable(mut self) -> Self {
        self.stoppable = true;
        self
    }

    /// Trip the flag once `calls` creates have succeeded
    pub fn cancelling_after(mut self, calls: usize, flag: CancellationFlag) -> Self {
        self.cancel_after = Some((calls, flag));
        self
    }

    pub fn live_ids(&self) -> Vec<String> {
        self.live.lock().unwrap().keys().map(ToString::to_string).collect()
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }
}

#[async_trait]
impl EntityCatalog for RecordingCatalog {
    fn supports(&self, model_type: &ModelType) -> bool {
        self.model_type == *model_type
    }

    async fn list_entity_excerpts(&self) -> Result<Vec<EntityExcerpt>> {
        Ok(self
            .live
            .lock()
            .unwrap()
            .values()
            .map(|n| EntityExcerpt {
                id: n.id.clone(),
                model_type: n.model_type.clone(),
                title: n.title.clone(),
            })
            .collect())
    }

    async fn collect_entity(&self, _descriptor: &EntityDescriptor) -> Result<Option<Entity>> {
        Ok(None)
    }

    async fn resolve(&self, _descriptor: &EntityDescriptor) -> Result<BTreeSet<EntityDescriptor>> {
        Ok(BTreeSet::new())
    }

    async fn find_existing(
        &self,
        entity: &Entity,
        _context: &InstallationContext,
    ) -> Result<Option<NativeEntityDescriptor>> {
        if !self.singleton {
            return Ok(None);
        }
        let id = ModelId::from(native_id(entity.id.as_str()));
        let existing = self.live.lock().unwrap().get(&id).map(|native| {
            let mut reused = native.clone();
            reused.content_pack_entity_id = entity.id.clone();
            reused
        });
        if existing.is_some() {
            self.journal.push(CatalogEvent::Reused(entity.descriptor()));
        }
        Ok(existing)
    }

    async fn create(
        &self,
        entity: &Entity,
        context: &InstallationContext,
    ) -> Result<NativeEntityDescriptor> {
        let call = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_create_at == Some(call) {
            return Err(anyhow!("platform rejected {}", entity.id));
        }

        // Dependencies must already exist
        for dependency in entity.references() {
            if context.native_id(&dependency).is_none() {
                return Err(anyhow!("{} created before its dependency {}", entity.id, dependency));
            }
        }

        let native = NativeEntityDescriptor::create(
            entity.id.clone(),
            native_id(entity.id.as_str()),
            entity.model_type.clone(),
            entity.id.to_string(),
            false,
        );
        self.live.lock().unwrap().insert(native.id.clone(), native.clone());
        self.journal.push(CatalogEvent::Created(entity.descriptor()));

        if let Some((after, flag)) = &self.cancel_after {
            if call == *after {
                flag.cancel();
            }
        }
        Ok(native)
    }

    fn supports_stop(&self) -> bool {
        self.stoppable
    }

    async fn stop(&self, native: &NativeEntityDescriptor) -> Result<()> {
        if self.fail_stop.contains(native.id.as_str()) {
            return Err(anyhow!("{} refused to stop", native.id));
        }
        self.journal.push(CatalogEvent::Stopped(native.id.clone()));
        Ok(())
    }

    async fn delete(&self, native: &NativeEntityDescriptor) -> Result<()> {
        if self.fail_delete.contains(native.id.as_str()) {
            return Err(anyhow!("{} is in use", native.id));
        }
        self.live.lock().unwrap().remove(&native.id);
        self.journal.push(CatalogEvent::Deleted(native.id.clone()));
        Ok(())
    }
}

/// Checker that confirms a fixed set of constraints
pub struct StaticChecker {
    confirms: BTreeSet<Constraint>,
}

impl StaticChecker {
    pub fn new(confirms: impl IntoIterator<Item = Constraint>) -> Self {
        Self {
            confirms: confirms.into_iter().collect(),
        }
    }
}

impl ConstraintChecker for StaticChecker {
    fn check_constraints(&self, _required: &BTreeSet<Constraint>) -> BTreeSet<Constraint> {
        self.confirms.clone()
    }
}

/// Installation store whose writes always fail
#[derive(Default)]
pub struct FailingInstallationStore;

#[async_trait]
impl InstallationStore for FailingInstallationStore {
    async fn save(&self, _installation: &ContentPackInstallation) -> Result<()> {
        Err(anyhow!("disk full"))
    }

    async fn delete_by_id(&self, _id: &str) -> Result<bool> {
        Err(anyhow!("disk full"))
    }

    async fn find_by_id(&self, _id: &str) -> Result<Option<ContentPackInstallation>> {
        Ok(None)
    }

    async fn find_by_content_pack(&self, _id: &ModelId) -> Result<Vec<ContentPackInstallation>> {
        Ok(Vec::new())
    }

    async fn list(&self) -> Result<Vec<ContentPackInstallation>> {
        Ok(Vec::new())
    }
}

/// Service wired to in-memory stores
pub struct TestHarness {
    pub service: ContentPackService,
    pub packs: Arc<InMemoryContentPackStore>,
    pub installations: Arc<InMemoryInstallationStore>,
}

impl TestHarness {
    pub fn new(catalogs: Vec<Arc<RecordingCatalog>>) -> Self {
        Self::with_checkers(catalogs, ConstraintCheckerRegistry::new())
    }

    pub fn with_checkers(
        catalogs: Vec<Arc<RecordingCatalog>>,
        checkers: ConstraintCheckerRegistry,
    ) -> Self {
        let registry = catalogs
            .into_iter()
            .fold(CatalogRegistry::new(), |registry, catalog| registry.with_catalog(catalog));
        let packs = Arc::new(InMemoryContentPackStore::new());
        let installations = Arc::new(InMemoryInstallationStore::new());
        let service =
            ContentPackService::new(registry, checkers, packs.clone(), installations.clone());
        Self {
            service,
            packs,
            installations,
        }
    }
}
