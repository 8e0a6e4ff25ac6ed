//! Insertion-ordered dependency set
//!
//! One sequence serves both the ordered view handed to actions and the
//! lookup by name, so the two cannot drift apart.

use std::sync::Arc;

use super::traits::{short_name, Target};

/// Direct dependencies of a target, keyed by display name
#[derive(Default, Clone)]
pub struct DependencySet {
    entries: Vec<Arc<dyn Target>>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dependency
    ///
    /// A target whose name is already present replaces the earlier entry at
    /// its original position.
    pub fn insert(&mut self, target: Arc<dyn Target>) {
        let name = target.name();
        match self.entries.iter().position(|t| t.name() == name) {
            Some(idx) => {
                tracing::warn!(
                    "Dependency `{}` registered twice, replacing the earlier one",
                    short_name(&name)
                );
                self.entries[idx] = target;
            }
            None => self.entries.push(target),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Target>> {
        self.entries.iter().find(|t| t.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Target>> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Arc<dyn Target>] {
        &self.entries
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
