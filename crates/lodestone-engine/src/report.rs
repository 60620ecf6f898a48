//! Outcome of a best-effort uninstall

use lodestone_core::types::{EntityDescriptor, NativeEntityDescriptor};

/// Step of the uninstall where a non-fatal failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UninstallPhase {
    /// Recomputing the dependency order
    Plan,
    /// Quiescing a live object
    Stop,
    /// Removing a live object
    Remove,
    /// Deleting the installation record
    Record,
}

impl std::fmt::Display for UninstallPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UninstallPhase::Plan => write!(f, "Plan"),
            UninstallPhase::Stop => write!(f, "Stop"),
            UninstallPhase::Remove => write!(f, "Remove"),
            UninstallPhase::Record => write!(f, "Record"),
        }
    }
}

/// A user-visible, non-blocking failure raised during uninstall
#[derive(Debug, Clone)]
pub struct UninstallNotification {
    /// Entity the failure concerns, if any
    pub entity: Option<EntityDescriptor>,
    pub phase: UninstallPhase,
    pub message: String,
}

/// What an uninstall did
#[derive(Debug, Clone, Default)]
pub struct UninstallReport {
    pub installation_id: String,
    /// Live objects removed, in removal order
    pub removed: Vec<NativeEntityDescriptor>,
    /// Reused or still-shared objects left in place
    pub skipped: Vec<NativeEntityDescriptor>,
    pub notifications: Vec<UninstallNotification>,
    /// Whether the installation record was deleted
    pub record_deleted: bool,
}

impl UninstallReport {
    pub fn new(installation_id: impl Into<String>) -> Self {
        Self {
            installation_id: installation_id.into(),
            ..Default::default()
        }
    }

    pub(crate) fn notify(
        &mut self,
        entity: Option<EntityDescriptor>,
        phase: UninstallPhase,
        message: impl Into<String>,
    ) {
        self.notifications.push(UninstallNotification {
            entity,
            phase,
            message: message.into(),
        });
    }

    /// Whether every step succeeded
    pub fn is_clean(&self) -> bool {
        self.notifications.is_empty()
    }

    /// Notifications about a specific entity
    pub fn failures_for(&self, descriptor: &EntityDescriptor) -> Vec<&UninstallNotification> {
        self.notifications
            .iter()
            .filter(|n| n.entity.as_ref() == Some(descriptor))
            .collect()
    }
}
