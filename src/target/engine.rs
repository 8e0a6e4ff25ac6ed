//! Incremental build traversal
//!
//! A [`BuildSession`] covers one root build invocation:
//!
//! 1. Every direct dependency is built first, depth-first, in registration
//!    order. The first failure aborts the traversal.
//! 2. Each dependency is then compared against the target's own newest
//!    modification time. Any newer dependency marks the target modified; a
//!    target with no dependencies is always modified.
//! 3. A modified target runs its action with its direct dependencies.
//!
//! The session also guards against dependency cycles and builds a target
//! shared by several parents only once.

use std::collections::HashMap;

use super::traits::{short_name, Outcome, Target};
use crate::error::{BuildError, BuildResult};

/// Identity of a target object for the duration of a session
type NodeKey = usize;

fn node_key<T: Target + ?Sized>(target: &T) -> NodeKey {
    target as *const T as *const () as usize
}

/// State of one build invocation
#[derive(Debug, Default)]
pub struct BuildSession {
    /// Targets currently being built, outermost first
    stack: Vec<(NodeKey, String)>,
    /// Outcome of every target already built in this session
    finished: HashMap<NodeKey, Outcome>,
    /// Names of targets whose action ran, in build order
    rebuilt: Vec<String>,
}

impl BuildSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the targets rebuilt so far, in the order they finished
    pub fn rebuilt(&self) -> &[String] {
        &self.rebuilt
    }

    /// Build `target` and its dependency closure
    ///
    /// # Errors
    /// * `BuildError::ActionFailed` - If any action in the closure fails
    /// * `BuildError::DependencyCycle` - If the closure contains a cycle
    pub fn build<T: Target + ?Sized>(&mut self, target: &T) -> BuildResult<Outcome> {
        let key = node_key(target);
        if let Some(outcome) = self.finished.get(&key) {
            tracing::debug!("`{}` already built in this session", short_name(&target.name()));
            return Ok(*outcome);
        }

        if let Some(pos) = self.stack.iter().position(|(k, _)| *k == key) {
            let mut chain: Vec<String> = self.stack[pos..]
                .iter()
                .map(|(_, name)| short_name(name))
                .collect();
            chain.push(short_name(&target.name()));
            tracing::error!("Dependency cycle: {}", chain.join(" -> "));
            return Err(BuildError::DependencyCycle { chain });
        }

        self.stack.push((key, target.name()));
        let result = self.evaluate(target);
        self.stack.pop();

        let outcome = result?;
        self.finished.insert(key, outcome);
        Ok(outcome)
    }

    /// Build the direct dependency of `target` whose name is `name`
    ///
    /// # Errors
    /// * `BuildError::TargetNotFound` - If `target` has no such dependency
    pub fn build_named<T: Target + ?Sized>(
        &mut self,
        target: &T,
        name: &str,
    ) -> BuildResult<Outcome> {
        let deps = target.rule().dependencies();
        match deps.get(name) {
            Some(dep) => self.build(dep.as_ref()),
            None => {
                tracing::error!("Cannot find target `{}`...", short_name(name));
                Err(BuildError::TargetNotFound {
                    name: short_name(name),
                    available: deps.names(),
                })
            }
        }
    }

    fn evaluate<T: Target + ?Sized>(&mut self, target: &T) -> BuildResult<Outcome> {
        let name = target.name();
        let rule = target.rule();
        let deps = rule.dependencies();
        let reference = target.modified_time();

        let mut modified = deps.is_empty();
        if modified {
            tracing::debug!("`{}` has no dependencies, rebuilding", short_name(&name));
        }

        for dep in deps.iter() {
            self.build(dep.as_ref())?;
            if dep.stale_since(reference) {
                tracing::debug!(
                    "`{}` is newer than `{}`",
                    short_name(&dep.name()),
                    short_name(&name)
                );
                modified = true;
            }
        }

        if !modified {
            tracing::debug!("`{}` is up to date", short_name(&name));
            return Ok(Outcome::UpToDate);
        }

        match rule.action() {
            Some(action) => {
                tracing::info!("Make target `{}`...", short_name(&name));
                action(deps.as_slice()).map_err(|e| {
                    tracing::error!("Target `{}` failed: {:#}", short_name(&name), e);
                    BuildError::action_failed(&name, &e)
                })?;
                tracing::info!("Done `{}`", short_name(&name));
            }
            None => tracing::debug!("`{}` has no action", short_name(&name)),
        }

        self.rebuilt.push(name);
        Ok(Outcome::Rebuilt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{FileTarget, GlobTarget, PhonyTarget, Rule, Wiring};
    use filetime::{set_file_mtime, FileTime};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, OnceLock};
    use std::time::SystemTime;
    use tempfile::TempDir;

    type Log = Arc<Mutex<Vec<String>>>;

    fn write_at(path: &Path, secs: i64) {
        std::fs::write(path, "x").unwrap();
        set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
    }

    /// Action that records the target's label and bumps its output's mtime
    fn recording(
        log: &Log,
        label: &str,
        output: Option<PathBuf>,
        secs: i64,
    ) -> impl Fn(&[Arc<dyn Target>]) -> anyhow::Result<()> + Send + Sync + 'static {
        let log = log.clone();
        let label = label.to_string();
        move |_deps: &[Arc<dyn Target>]| {
            log.lock().unwrap().push(label.clone());
            if let Some(ref out) = output {
                write_at(out, secs);
            }
            Ok(())
        }
    }

    fn logged(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn test_zero_dependencies_always_rebuilds() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        write_at(&out, 5_000);

        let target = FileTarget::file(&out).make(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(target.build().unwrap(), Outcome::Rebuilt);
        assert_eq!(target.build().unwrap(), Outcome::Rebuilt);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_up_to_date_skips_action() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("main.c");
        let obj = dir.path().join("main.o");
        write_at(&src, 1_000);
        write_at(&obj, 2_000);
        let log: Log = Arc::default();

        let target = FileTarget::file(&obj)
            .depends([FileTarget::file(&src).shared()])
            .make(recording(&log, "obj", None, 0));

        assert_eq!(target.build().unwrap(), Outcome::UpToDate);
        assert!(logged(&log).is_empty());
    }

    #[test]
    fn test_newer_dependency_rebuilds() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("main.c");
        let obj = dir.path().join("main.o");
        write_at(&src, 3_000);
        write_at(&obj, 2_000);
        let log: Log = Arc::default();

        let target = FileTarget::file(&obj)
            .depends([FileTarget::file(&src).shared()])
            .make(recording(&log, "obj", Some(obj.clone()), 4_000));

        assert_eq!(target.build().unwrap(), Outcome::Rebuilt);
        assert_eq!(logged(&log), vec!["obj"]);

        // Output is now newer than its input
        assert_eq!(target.build().unwrap(), Outcome::UpToDate);
        assert_eq!(logged(&log), vec!["obj"]);
    }

    #[test]
    fn test_missing_output_rebuilds() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("main.c");
        write_at(&src, 1_000);
        let log: Log = Arc::default();

        let target = FileTarget::file(dir.path().join("never-built.o"))
            .depends([FileTarget::file(&src).shared()])
            .make(recording(&log, "obj", None, 0));

        assert_eq!(target.build().unwrap(), Outcome::Rebuilt);
        assert_eq!(logged(&log), vec!["obj"]);
    }

    #[test]
    fn test_action_receives_direct_dependencies_in_order() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::default();
        let s = seen.clone();

        let target = PhonyTarget::new("root")
            .depends([
                PhonyTarget::new("z").shared(),
                PhonyTarget::new("a").shared(),
                PhonyTarget::new("m").depends([PhonyTarget::new("deep").shared()]).shared(),
            ])
            .make(move |deps| {
                *s.lock().unwrap() = deps.iter().map(|d| d.name()).collect();
                Ok(())
            });

        target.build().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_dependency_failure_short_circuits() {
        let log: Log = Arc::default();

        let failing = PhonyTarget::new("broken")
            .make(|_| anyhow::bail!("compiler crashed"))
            .shared();
        let after = PhonyTarget::new("after")
            .make(recording(&log, "after", None, 0))
            .shared();

        let root = PhonyTarget::new("root")
            .depends([failing, after])
            .make(recording(&log, "root", None, 0));

        let err = root.build().unwrap_err();
        match err {
            BuildError::ActionFailed { target, reason } => {
                assert_eq!(target, "broken");
                assert!(reason.contains("compiler crashed"));
            }
            other => panic!("Expected ActionFailed, got {:?}", other),
        }
        // Neither the later sibling nor the parent ran
        assert!(logged(&log).is_empty());
    }

    #[test]
    fn test_failing_action_fails_build() {
        let target = PhonyTarget::new("lint").make(|_| Err(anyhow::anyhow!("3 warnings")));
        assert!(matches!(
            target.build(),
            Err(BuildError::ActionFailed { .. })
        ));
    }

    #[test]
    fn test_empty_glob_forces_dependents() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("bundle.js");
        write_at(&out, 9_000);
        let log: Log = Arc::default();

        let sources = GlobTarget::new(dir.path().join("*.ts").to_string_lossy().into_owned());
        let target = FileTarget::file(&out)
            .depends([sources.shared()])
            .make(recording(&log, "bundle", None, 0));

        target.build().unwrap();
        target.build().unwrap();
        assert_eq!(logged(&log), vec!["bundle", "bundle"]);
    }

    #[test]
    fn test_target_without_action_counts_as_rebuilt() {
        let mut session = BuildSession::new();
        let target = PhonyTarget::new("noop");
        assert_eq!(session.build(&target).unwrap(), Outcome::Rebuilt);
        assert_eq!(session.rebuilt(), &["noop".to_string()]);
    }

    #[test]
    fn test_build_named_found() {
        let log: Log = Arc::default();
        let root = PhonyTarget::new("all").depends([
            PhonyTarget::new("docs").make(recording(&log, "docs", None, 0)).shared(),
            PhonyTarget::new("test").make(recording(&log, "test", None, 0)).shared(),
        ]);

        assert_eq!(root.build_target("test").unwrap(), Outcome::Rebuilt);
        assert_eq!(logged(&log), vec!["test"]);
    }

    #[test]
    fn test_build_named_missing() {
        let log: Log = Arc::default();
        let root = PhonyTarget::new("all")
            .depends([PhonyTarget::new("docs").make(recording(&log, "docs", None, 0)).shared()])
            .make(recording(&log, "all", None, 0));

        match root.build_target("deploy").unwrap_err() {
            BuildError::TargetNotFound { name, available } => {
                assert_eq!(name, "deploy");
                assert_eq!(available, vec!["docs"]);
            }
            other => panic!("Expected TargetNotFound, got {:?}", other),
        }
        assert!(logged(&log).is_empty());
    }

    #[test]
    fn test_build_named_only_looks_at_direct_dependencies() {
        let root = PhonyTarget::new("all")
            .depends([PhonyTarget::new("mid").depends([PhonyTarget::new("leaf").shared()]).shared()]);
        assert!(matches!(
            root.build_target("leaf"),
            Err(BuildError::TargetNotFound { .. })
        ));
    }

    #[test]
    fn test_diamond_builds_shared_dependency_once() {
        let log: Log = Arc::default();
        let base = PhonyTarget::new("base")
            .make(recording(&log, "base", None, 0))
            .shared();
        let left = PhonyTarget::new("left").depends([base.clone()]).shared();
        let right = PhonyTarget::new("right").depends([base]).shared();
        let top = PhonyTarget::new("top").depends([left, right]);

        let mut session = BuildSession::new();
        session.build(&top).unwrap();
        assert_eq!(logged(&log), vec!["base"]);
        assert_eq!(session.rebuilt(), &["base", "left", "right", "top"]);
    }

    /// Target whose dependencies are attached after construction
    struct LateBound {
        name: &'static str,
        rule: OnceLock<Rule>,
    }

    impl Target for LateBound {
        fn name(&self) -> String {
            self.name.to_string()
        }
        fn modified_time(&self) -> SystemTime {
            std::time::UNIX_EPOCH
        }
        fn stale_since(&self, _reference: SystemTime) -> bool {
            true
        }
        fn rule(&self) -> &Rule {
            self.rule.get_or_init(Rule::new)
        }
    }

    #[test]
    fn test_cycle_is_reported() {
        let a = Arc::new(LateBound { name: "a", rule: OnceLock::new() });
        let b = Arc::new(LateBound { name: "b", rule: OnceLock::new() });

        let mut rule_a = Rule::new();
        rule_a.add_dependencies([b.clone() as Arc<dyn Target>]);
        let _ = a.rule.set(rule_a);
        let mut rule_b = Rule::new();
        rule_b.add_dependencies([a.clone() as Arc<dyn Target>]);
        let _ = b.rule.set(rule_b);

        match a.build().unwrap_err() {
            BuildError::DependencyCycle { chain } => assert_eq!(chain, vec!["a", "b", "a"]),
            other => panic!("Expected DependencyCycle, got {:?}", other),
        }
    }
}
