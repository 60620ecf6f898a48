//! Content pack installation and uninstallation
//!
//! Install runs in three stages: pre-install checks (constraints,
//! parameters, graph), sequential creation in dependency order, and
//! persisting the installation record. A failure in the last two stages
//! unwinds everything the attempt created, newest first, before the
//! original error is returned.

use lodestone_core::types::{
    ContentPack, ContentPackInstallation, ContentPackV1, Entity, EntityDescriptor, EntityExcerpt,
    ModelId, ModelType, NativeEntityDescriptor, Parameters, ValueReference,
};
use lodestone_core::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cancellation::CancellationFlag;
use crate::catalog::CatalogRegistry;
use crate::constraints::ConstraintCheckerRegistry;
use crate::context::InstallationContext;
use crate::graph::EntityGraph;
use crate::parameters::validate_parameters;
use crate::report::{UninstallPhase, UninstallReport};
use crate::store::{ContentPackStore, InstallationStore};

/// Outcome of a dry run: what an install would bind and create
#[derive(Debug, Clone)]
pub struct InstallPlan {
    pub content_pack_id: ModelId,
    pub revision: u32,
    pub parameters: Parameters,
    /// Entities in creation order
    pub order: Vec<EntityDescriptor>,
    /// Direct dependencies of each entity
    pub dependencies: BTreeMap<EntityDescriptor, BTreeSet<EntityDescriptor>>,
}

/// Orchestrates installs and uninstalls against the registered catalogs
///
/// Holds only shared registries and stores, so clones are cheap and may
/// drive installs from separate tasks.
#[derive(Clone)]
pub struct ContentPackService {
    catalogs: Arc<CatalogRegistry>,
    checkers: Arc<ConstraintCheckerRegistry>,
    packs: Arc<dyn ContentPackStore>,
    installations: Arc<dyn InstallationStore>,
}

impl ContentPackService {
    pub fn new(
        catalogs: CatalogRegistry,
        checkers: ConstraintCheckerRegistry,
        packs: Arc<dyn ContentPackStore>,
        installations: Arc<dyn InstallationStore>,
    ) -> Self {
        Self {
            catalogs: Arc::new(catalogs),
            checkers: Arc::new(checkers),
            packs,
            installations,
        }
    }

    pub fn catalogs(&self) -> &CatalogRegistry {
        &self.catalogs
    }

    pub fn content_packs(&self) -> &Arc<dyn ContentPackStore> {
        &self.packs
    }

    pub fn installations(&self) -> &Arc<dyn InstallationStore> {
        &self.installations
    }

    /// Install a pack with the supplied parameter bindings
    pub async fn install_content_pack(
        &self,
        pack: &ContentPack,
        parameters: &BTreeMap<String, ValueReference>,
        comment: &str,
        user: &str,
    ) -> Result<ContentPackInstallation> {
        self.install_content_pack_with(pack, parameters, comment, user, &CancellationFlag::new())
            .await
    }

    /// Install a pack, checking `cancel` before each entity
    pub async fn install_content_pack_with(
        &self,
        pack: &ContentPack,
        parameters: &BTreeMap<String, ValueReference>,
        comment: &str,
        user: &str,
        cancel: &CancellationFlag,
    ) -> Result<ContentPackInstallation> {
        match pack {
            ContentPack::V1(v1) => self.install_v1(v1, parameters, comment, user, cancel).await,
            other => Err(Error::unsupported_version(other.version())),
        }
    }

    /// Load a stored pack revision and install it
    pub async fn install_by_id(
        &self,
        id: &ModelId,
        revision: u32,
        parameters: &BTreeMap<String, ValueReference>,
        comment: &str,
        user: &str,
    ) -> Result<ContentPackInstallation> {
        let pack = self.load_pack(id, revision).await?.ok_or_else(|| {
            let message = format!("content pack {} revision {} not found", id, revision);
            Error::invalid_content_pack(message)
        })?;
        self.install_content_pack(&pack, parameters, comment, user).await
    }

    /// Run every pre-install check without touching the platform
    pub fn plan(
        &self,
        pack: &ContentPack,
        parameters: &BTreeMap<String, ValueReference>,
    ) -> Result<InstallPlan> {
        let v1 = match pack {
            ContentPack::V1(v1) => v1,
            other => return Err(Error::unsupported_version(other.version())),
        };

        let (parameters, graph) = self.prepare(v1, parameters)?;
        let order = graph.ordered_descriptors();
        let dependencies = order
            .iter()
            .map(|descriptor| (descriptor.clone(), graph.dependencies_of(descriptor)))
            .collect();

        Ok(InstallPlan {
            content_pack_id: v1.id.clone(),
            revision: v1.rev,
            parameters,
            order,
            dependencies,
        })
    }

    fn prepare(
        &self,
        pack: &ContentPackV1,
        parameters: &BTreeMap<String, ValueReference>,
    ) -> Result<(Parameters, EntityGraph)> {
        pack.validate()?;
        self.checkers.check(&pack.requires)?;
        let parameters = validate_parameters(parameters, &pack.parameters)?;
        let graph = EntityGraph::build(&pack.entities)?;
        for entity in graph.install_order() {
            self.catalogs.require(&entity.model_type)?;
        }
        Ok((parameters, graph))
    }

    async fn install_v1(
        &self,
        pack: &ContentPackV1,
        parameters: &BTreeMap<String, ValueReference>,
        comment: &str,
        user: &str,
        cancel: &CancellationFlag,
    ) -> Result<ContentPackInstallation> {
        let (parameters, graph) = self.prepare(pack, parameters)?;

        info!(
            "Installing content pack {} rev {} ({} entities)",
            pack.id,
            pack.rev,
            graph.len()
        );

        let mut context = InstallationContext::new(parameters, comment, user);

        for entity in graph.install_order() {
            if let Err(e) = self.install_entity(entity, &mut context, cancel).await {
                warn!("Installation of {} failed: {}", pack.id, e);
                self.unwind(&context).await;
                return Err(e);
            }
        }

        let created = context.created_newest_first().count();
        let (parameters, entities) = context.clone().into_parts();
        let installation = ContentPackInstallation::new(
            pack.id.clone(),
            pack.rev,
            parameters,
            entities,
            comment,
            user,
        );

        if let Err(e) = self.installations.save(&installation).await {
            warn!("Failed to save installation record for {}: {}", pack.id, e);
            self.unwind(&context).await;
            return Err(Error::store("failed to save installation record", e));
        }

        info!(
            "Installed content pack {} rev {} as {} ({} created, {} reused)",
            pack.id,
            pack.rev,
            installation.id,
            created,
            installation.entities.len() - created
        );
        Ok(installation)
    }

    async fn install_entity(
        &self,
        entity: &Entity,
        context: &mut InstallationContext,
        cancel: &CancellationFlag,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let catalog = self.catalogs.require(&entity.model_type)?;
        let descriptor = entity.descriptor();

        let existing = catalog
            .find_existing(entity, context)
            .await
            .map_err(|e| Error::entity_creation_failed(descriptor.clone(), e))?;

        let native = match existing {
            Some(mut native) => {
                native.found_on_system = true;
                debug!("Reusing existing {} for {}", native, descriptor);
                native
            }
            None => {
                let native = catalog
                    .create(entity, context)
                    .await
                    .map_err(|e| Error::entity_creation_failed(descriptor.clone(), e))?;
                debug!("Created {} for {}", native, descriptor);
                native
            }
        };

        context.add_entity(native);
        Ok(())
    }

    /// Best-effort removal of everything this attempt created
    async fn unwind(&self, context: &InstallationContext) {
        for native in context.created_newest_first() {
            let Some(catalog) = self.catalogs.for_type(&native.model_type) else {
                warn!("Cannot remove {}: no catalog for {}", native, native.model_type);
                continue;
            };
            match catalog.delete(native).await {
                Ok(()) => debug!("Removed {} during unwind", native),
                Err(e) => warn!("Failed to remove {} during unwind: {}", native, e),
            }
        }
    }

    /// Remove the live objects an installation created, then its record
    ///
    /// Never fails: every problem is reported as a notification and the
    /// remaining objects are still attempted.
    pub async fn uninstall_content_pack(
        &self,
        installation: &ContentPackInstallation,
    ) -> UninstallReport {
        let mut report = UninstallReport::new(installation.id.clone());

        info!(
            "Uninstalling {} (content pack {} rev {})",
            installation.id, installation.content_pack_id, installation.content_pack_revision
        );

        let shared = self.shared_objects(installation, &mut report).await;

        for native in self.removal_order(installation, &mut report).await {
            if native.found_on_system {
                debug!("Leaving reused {} in place", native);
                report.skipped.push(native);
                continue;
            }
            if shared.contains(&(native.model_type.clone(), native.id.clone())) {
                debug!("Leaving {} in place: used by another installation", native);
                report.skipped.push(native);
                continue;
            }

            let descriptor = native.entity_descriptor();
            let Some(catalog) = self.catalogs.for_type(&native.model_type) else {
                report.notify(
                    Some(descriptor),
                    UninstallPhase::Remove,
                    format!("no catalog registered for {}", native.model_type),
                );
                continue;
            };

            if catalog.supports_stop() {
                if let Err(e) = catalog.stop(&native).await {
                    warn!("Failed to stop {}: {}", native, e);
                    report.notify(Some(descriptor.clone()), UninstallPhase::Stop, e.to_string());
                }
            }

            match catalog.delete(&native).await {
                Ok(()) => {
                    debug!("Removed {}", native);
                    report.removed.push(native);
                }
                Err(e) => {
                    warn!("Failed to remove {}: {}", native, e);
                    report.notify(Some(descriptor), UninstallPhase::Remove, e.to_string());
                }
            }
        }

        match self.installations.delete_by_id(&installation.id).await {
            Ok(true) => report.record_deleted = true,
            Ok(false) => report.notify(
                None,
                UninstallPhase::Record,
                format!("installation record {} not found", installation.id),
            ),
            Err(e) => report.notify(None, UninstallPhase::Record, e.to_string()),
        }

        info!(
            "Uninstalled {}: {} removed, {} kept, {} problems",
            installation.id,
            report.removed.len(),
            report.skipped.len(),
            report.notifications.len()
        );
        report
    }

    /// Live objects that other installations also record
    ///
    /// If the records cannot be listed, a notification is raised and nothing
    /// is treated as shared.
    async fn shared_objects(
        &self,
        installation: &ContentPackInstallation,
        report: &mut UninstallReport,
    ) -> HashSet<(ModelType, ModelId)> {
        let others = match self.installations.list().await {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to list installations: {}", e);
                report.notify(
                    None,
                    UninstallPhase::Plan,
                    format!("cannot check for shared objects: {}", e),
                );
                return HashSet::new();
            }
        };

        others
            .iter()
            .filter(|other| other.id != installation.id)
            .flat_map(|other| other.entities.iter())
            .map(|native| (native.model_type.clone(), native.id.clone()))
            .collect()
    }

    /// Recorded objects in reverse dependency order
    ///
    /// Falls back to reverse creation order when the pack is unavailable.
    async fn removal_order(
        &self,
        installation: &ContentPackInstallation,
        report: &mut UninstallReport,
    ) -> Vec<NativeEntityDescriptor> {
        let fallback = || installation.entities.iter().rev().cloned().collect::<Vec<_>>();

        let pack = match self
            .load_pack(&installation.content_pack_id, installation.content_pack_revision)
            .await
        {
            Ok(Some(ContentPack::V1(pack))) => pack,
            Ok(Some(other)) => {
                let message = Error::unsupported_version(other.version()).to_string();
                report.notify(None, UninstallPhase::Plan, message);
                return fallback();
            }
            Ok(None) => {
                report.notify(
                    None,
                    UninstallPhase::Plan,
                    format!(
                        "content pack {} rev {} not found, removing in reverse creation order",
                        installation.content_pack_id, installation.content_pack_revision
                    ),
                );
                return fallback();
            }
            Err(e) => {
                report.notify(None, UninstallPhase::Plan, e.to_string());
                return fallback();
            }
        };

        let graph = match EntityGraph::build(&pack.entities) {
            Ok(graph) => graph,
            Err(e) => {
                report.notify(None, UninstallPhase::Plan, e.to_string());
                return fallback();
            }
        };

        let mut remaining: BTreeMap<EntityDescriptor, NativeEntityDescriptor> = installation
            .entities
            .iter()
            .map(|native| (native.entity_descriptor(), native.clone()))
            .collect();

        let mut order: Vec<NativeEntityDescriptor> = graph
            .uninstall_order()
            .into_iter()
            .filter_map(|entity| remaining.remove(&entity.descriptor()))
            .collect();

        // Recorded objects the pack no longer declares go last, newest first
        order.extend(
            installation
                .entities
                .iter()
                .rev()
                .filter(|native| remaining.contains_key(&native.entity_descriptor()))
                .cloned(),
        );
        order
    }

    async fn load_pack(&self, id: &ModelId, revision: u32) -> Result<Option<ContentPack>> {
        self.packs
            .load(id, revision)
            .await
            .map_err(|e| Error::store(format!("failed to load content pack {}", id), e))
    }

    /// Browsing view of every live object across all catalogs
    pub async fn list_entity_excerpts(&self) -> Result<Vec<EntityExcerpt>> {
        let mut excerpts = BTreeSet::new();
        for catalog in self.catalogs.iter() {
            let listed = catalog
                .list_entity_excerpts()
                .await
                .map_err(|e| Error::catalog("failed to list entities", e))?;
            excerpts.extend(listed);
        }
        Ok(excerpts.into_iter().collect())
    }

    /// Export live objects and everything they depend on
    ///
    /// Descriptors that no longer exist are skipped. The result is sorted by
    /// descriptor and contains each entity once.
    pub async fn collect_entities(
        &self,
        descriptors: &BTreeSet<EntityDescriptor>,
    ) -> Result<Vec<Entity>> {
        let mut collected: BTreeMap<EntityDescriptor, Entity> = BTreeMap::new();
        let mut seen: BTreeSet<EntityDescriptor> = descriptors.clone();
        let mut queue: VecDeque<EntityDescriptor> = descriptors.iter().cloned().collect();

        while let Some(descriptor) = queue.pop_front() {
            let catalog = self.catalogs.require(&descriptor.model_type)?;

            let Some(entity) = catalog
                .collect_entity(&descriptor)
                .await
                .map_err(|e| Error::catalog(format!("failed to collect {}", descriptor), e))?
            else {
                debug!("Skipping {}: not found", descriptor);
                continue;
            };

            let dependencies = catalog
                .resolve(&descriptor)
                .await
                .map_err(|e| Error::catalog(format!("failed to resolve {}", descriptor), e))?;
            for dependency in dependencies {
                if seen.insert(dependency.clone()) {
                    queue.push_back(dependency);
                }
            }

            collected.insert(descriptor, entity);
        }

        Ok(collected.into_values().collect())
    }
}
