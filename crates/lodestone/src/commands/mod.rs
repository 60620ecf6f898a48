//! CLI command implementations

pub mod excerpts;
pub mod install;
pub mod installations;
pub mod plan;
pub mod uninstall;

use anyhow::{anyhow, bail, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use lodestone_catalogs::{catalog_registry, checker_registry, InMemoryPlatform};
use lodestone_core::types::{ContentPack, ModelId, ValueReference};
use lodestone_core::LodestoneConfig;
use lodestone_engine::store::{FileContentPackStore, FileInstallationStore};
use lodestone_engine::{ContentPackService, ContentPackStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::cli::PackArgs;

/// Service and platform state for one CLI run
pub struct Workspace {
    pub service: ContentPackService,
    platform: Arc<InMemoryPlatform>,
    platform_path: Utf8PathBuf,
}

impl Workspace {
    pub fn open(config_path: Option<&Utf8Path>) -> Result<Self> {
        let config = LodestoneConfig::load(config_path)?;
        debug!("Using data directory {}", config.data_dir);

        let platform_path = config.platform_state_path();
        let platform = Arc::new(InMemoryPlatform::load_from(&platform_path)?);

        let service = ContentPackService::new(
            catalog_registry(platform.clone()),
            checker_registry(&config)?,
            Arc::new(FileContentPackStore::new(config.content_packs_dir())),
            Arc::new(FileInstallationStore::new(config.installations_path())),
        );

        Ok(Self {
            service,
            platform,
            platform_path,
        })
    }

    /// Write platform state back so later runs see this run's changes
    pub fn persist(&self) -> Result<()> {
        self.platform.save_to(&self.platform_path)
    }

    /// Load a pack from a file or the pack store
    ///
    /// Packs read from a file are also added to the store, so a later
    /// uninstall can recompute their dependency order.
    pub async fn resolve_pack(&self, args: &PackArgs) -> Result<ContentPack> {
        let path = Utf8Path::new(&args.pack);
        let store = self.service.content_packs();

        if path.is_file() {
            let pack = ContentPack::load(path)?;
            store
                .save(&pack)
                .await
                .context("Failed to store content pack")?;
            return Ok(pack);
        }

        let id = ModelId::from(args.pack.as_str());
        match args.revision {
            Some(revision) => store
                .load(&id, revision)
                .await?
                .ok_or_else(|| anyhow!("Content pack {} revision {} not found", id, revision)),
            None => latest_revision(store.as_ref(), &id).await?.ok_or_else(|| {
                anyhow!("Content pack '{}' is neither a file nor a stored pack", args.pack)
            }),
        }
    }
}

async fn latest_revision(
    store: &dyn ContentPackStore,
    id: &ModelId,
) -> Result<Option<ContentPack>> {
    Ok(store
        .list()
        .await?
        .into_iter()
        .filter(|p| p.id() == id)
        .max_by_key(ContentPack::revision))
}

/// Parse `NAME=VALUE` bindings against the pack's declared types
///
/// Undeclared names are kept as strings; validation drops them later.
pub fn parse_params(
    raw: &[String],
    pack: &ContentPack,
) -> Result<BTreeMap<String, ValueReference>> {
    let declared = match pack {
        ContentPack::V1(v1) => &v1.parameters,
        other => bail!("Unsupported content pack version: {}", other.version()),
    };

    let mut bindings = BTreeMap::new();
    for entry in raw {
        let (name, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid parameter '{}', expected NAME=VALUE", entry))?;
        let name = name.trim();
        if name.is_empty() {
            bail!("Invalid parameter '{}', name is empty", entry);
        }

        let value = match declared.iter().find(|p| p.name() == name) {
            Some(parameter) => ValueReference::parse(parameter.value_type(), value)
                .with_context(|| format!("Invalid value for parameter {}", name))?,
            None => ValueReference::of(value),
        };
        bindings.insert(name.to_string(), value);
    }
    Ok(bindings)
}
