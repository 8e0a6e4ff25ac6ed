//! Common traits and types for build targets
//!
//! Defines the interface that every target kind (file, glob, phony) implements,
//! and the [`Rule`] each of them embeds: the dependency set plus the action.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use serde::Serialize;

use super::deps::DependencySet;
use super::engine::BuildSession;
use crate::error::BuildResult;

/// Names longer than this are shortened in user-visible messages
pub const MAX_DISPLAY_NAME: usize = 50;

/// Caller-supplied build step, invoked with the target's direct dependencies
pub type Action = Box<dyn Fn(&[Arc<dyn Target>]) -> anyhow::Result<()> + Send + Sync>;

/// What a build did for one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The target was modified and its action ran (or it had none)
    Rebuilt,
    /// Nothing changed; the action was skipped
    UpToDate,
}

impl Outcome {
    pub fn is_rebuilt(&self) -> bool {
        matches!(self, Outcome::Rebuilt)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Rebuilt => write!(f, "rebuilt"),
            Outcome::UpToDate => write!(f, "up to date"),
        }
    }
}

/// Dependencies and action shared by every target kind
#[derive(Default)]
pub struct Rule {
    deps: DependencySet,
    action: Option<Action>,
}

impl Rule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct dependencies in registration order
    pub fn dependencies(&self) -> &DependencySet {
        &self.deps
    }

    pub fn add_dependencies<I>(&mut self, targets: I)
    where
        I: IntoIterator<Item = Arc<dyn Target>>,
    {
        for target in targets {
            self.deps.insert(target);
        }
    }

    pub fn set_action(&mut self, action: Action) {
        self.action = Some(action);
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("deps", &self.deps.names())
            .field("action", &self.action.is_some())
            .finish()
    }
}

/// A buildable unit in the dependency graph
///
/// Implementors only describe their backing resources; the traversal and the
/// rebuild decision live in [`BuildSession`], so a new target kind needs no
/// engine change.
pub trait Target: Send + Sync {
    /// Display name, also the key in a parent's dependency set
    fn name(&self) -> String;

    /// Newest modification time of the backing resources
    ///
    /// Returns `UNIX_EPOCH` when nothing resolves, which biases dependents
    /// toward rebuilding.
    fn modified_time(&self) -> SystemTime;

    /// Whether any backing resource changed strictly after `reference`
    ///
    /// Must return `true` when the resources cannot be inspected or resolve
    /// to nothing.
    fn stale_since(&self, reference: SystemTime) -> bool;

    /// Dependencies and action of this target
    fn rule(&self) -> &Rule;

    /// Build this target and its full dependency closure
    fn build(&self) -> BuildResult<Outcome> {
        BuildSession::new().build(self)
    }

    /// Build exactly one direct dependency, looked up by its display name
    ///
    /// # Errors
    /// * `BuildError::TargetNotFound` - If no direct dependency has that name
    fn build_target(&self, name: &str) -> BuildResult<Outcome> {
        BuildSession::new().build_named(self, name)
    }
}

/// Fluent wiring shared by the concrete target kinds
pub trait Wiring: Target + Sized + 'static {
    fn rule_mut(&mut self) -> &mut Rule;

    /// Register dependencies, in order
    fn depends<I>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Target>>,
    {
        self.rule_mut().add_dependencies(targets);
        self
    }

    /// Set the build action
    fn make<F>(mut self, action: F) -> Self
    where
        F: Fn(&[Arc<dyn Target>]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.rule_mut().set_action(Box::new(action));
        self
    }

    /// Type-erase for use as somebody's dependency
    fn shared(self) -> Arc<dyn Target> {
        Arc::new(self)
    }
}

/// Shorten a target name for display
///
/// # Examples
///
/// ```
/// use buildr::target::short_name;
///
/// assert_eq!(short_name("a.out"), "a.out");
/// assert_eq!(short_name(&"x".repeat(60)).len(), 50);
/// ```
pub fn short_name(name: &str) -> String {
    if name.chars().count() <= MAX_DISPLAY_NAME {
        return name.to_string();
    }
    let mut short: String = name.chars().take(MAX_DISPLAY_NAME - 3).collect();
    short.push_str("...");
    short
}
