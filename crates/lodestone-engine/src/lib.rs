//! Content pack installation engine for Lodestone
//!
//! This crate handles:
//! - Constraint checking against the running platform
//! - Parameter validation and substitution
//! - Entity dependency graph resolution
//! - The pluggable entity catalog registry
//! - Installation and uninstallation orchestration
//! - Content pack and installation record stores

pub mod cancellation;
pub mod catalog;
pub mod constraints;
pub mod context;
pub mod graph;
pub mod parameters;
pub mod report;
pub mod service;
pub mod store;
pub mod substitution;

pub use cancellation::CancellationFlag;
pub use catalog::{CatalogRegistry, EntityCatalog};
pub use constraints::{ConstraintChecker, ConstraintCheckerRegistry};
pub use context::InstallationContext;
pub use graph::EntityGraph;
pub use parameters::validate_parameters;
pub use report::{UninstallNotification, UninstallPhase, UninstallReport};
pub use service::{ContentPackService, InstallPlan};
pub use store::{ContentPackStore, InstallationStore};
