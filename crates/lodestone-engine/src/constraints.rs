//! Constraint checking across all registered checkers

use lodestone_core::types::Constraint;
use lodestone_core::{Error, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Confirms the subset of required constraints it knows how to check
///
/// Checkers are side-effect free. Claiming a constraint another checker
/// also claims is harmless.
#[cfg_attr(test, mockall::automock)]
pub trait ConstraintChecker: Send + Sync {
    /// Return the required constraints this checker can confirm
    fn check_constraints(&self, required: &BTreeSet<Constraint>) -> BTreeSet<Constraint>;
}

/// Ordered set of constraint checkers, built once at startup
#[derive(Clone, Default)]
pub struct ConstraintCheckerRegistry {
    checkers: Vec<Arc<dyn ConstraintChecker>>,
}

impl ConstraintCheckerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_checker(mut self, checker: Arc<dyn ConstraintChecker>) -> Self {
        self.checkers.push(checker);
        self
    }

    pub fn register(&mut self, checker: Arc<dyn ConstraintChecker>) {
        self.checkers.push(checker);
    }

    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }

    /// Union of everything the checkers confirm, restricted to `required`
    pub fn fulfilled(&self, required: &BTreeSet<Constraint>) -> BTreeSet<Constraint> {
        self.checkers
            .iter()
            .flat_map(|checker| checker.check_constraints(required))
            .filter(|constraint| required.contains(constraint))
            .collect()
    }

    /// Succeed only if every required constraint is confirmed
    pub fn check(&self, required: &BTreeSet<Constraint>) -> Result<()> {
        let fulfilled = self.fulfilled(required);
        if fulfilled == *required {
            debug!("All {} required constraints fulfilled", required.len());
            return Ok(());
        }

        let missing: Vec<Constraint> = required.difference(&fulfilled).cloned().collect();
        Err(Error::UnfulfilledConstraints { missing })
    }
}
