//! Targets with no backing resources

use std::time::{SystemTime, UNIX_EPOCH};

use super::traits::{Rule, Target, Wiring};

/// A named target that never exists on disk
///
/// Always stale, so anything depending on it rebuilds. Useful as an
/// aggregate root or for steps with no output file.
#[derive(Debug)]
pub struct PhonyTarget {
    name: String,
    rule: Rule,
}

impl PhonyTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule: Rule::new(),
        }
    }
}

impl Target for PhonyTarget {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn modified_time(&self) -> SystemTime {
        UNIX_EPOCH
    }

    fn stale_since(&self, _reference: SystemTime) -> bool {
        true
    }

    fn rule(&self) -> &Rule {
        &self.rule
    }
}

impl Wiring for PhonyTarget {
    fn rule_mut(&mut self) -> &mut Rule {
        &mut self.rule
    }
}
