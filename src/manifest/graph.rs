//! Wiring a manifest into a target graph

use std::collections::BTreeMap;
use std::sync::Arc;

use super::model::{Manifest, TargetKind, TargetSpec};
use crate::config::{interpolate_command, Placeholders};
use crate::error::{BuildError, BuildResult};
use crate::executor::Shell;
use crate::target::{FileTarget, GlobTarget, Outcome, PhonyTarget, Target, Wiring};

/// Name of the aggregate root
pub const ROOT_NAME: &str = "all";

/// A wired manifest
pub struct Graph {
    targets: BTreeMap<String, Arc<dyn Target>>,
    root: Arc<dyn Target>,
    default: Option<String>,
}

impl Graph {
    /// Wire every manifest entry, sharing nodes between dependents
    ///
    /// Commands run through `shell`.
    ///
    /// # Errors
    /// * `BuildError::Manifest` - If the manifest is invalid
    /// * `BuildError::DependencyCycle` - If entries depend on each other in a loop
    /// * `BuildError::Manifest` - If two entries wire to the same display name
    pub fn wire(manifest: &Manifest, shell: &Shell) -> BuildResult<Self> {
        manifest.validate()?;

        let mut wiring = Wirer {
            manifest,
            shell,
            wired: BTreeMap::new(),
            visiting: Vec::new(),
        };
        for key in manifest.targets.keys() {
            wiring.wire(key)?;
        }

        let targets = wiring.wired;
        check_unique_names(&targets)?;
        let root = PhonyTarget::new(ROOT_NAME)
            .depends(targets.values().cloned())
            .shared();

        tracing::debug!("Wired {} targets", targets.len());
        Ok(Self {
            targets,
            root,
            default: manifest.default.clone(),
        })
    }

    /// Target wired for a manifest key
    pub fn get(&self, key: &str) -> Option<&Arc<dyn Target>> {
        self.targets.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    /// Phony root depending on every entry
    pub fn root(&self) -> &Arc<dyn Target> {
        &self.root
    }

    pub fn default_target(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Build one entry, by manifest key or else by display name
    ///
    /// # Errors
    /// * `BuildError::TargetNotFound` - If neither lookup matches
    pub fn build(&self, name: &str) -> BuildResult<Outcome> {
        match self.get(name) {
            Some(target) => target.build(),
            None => self.root.build_target(name),
        }
    }

    /// Build the default entry, or every entry when none is set
    pub fn build_default(&self) -> BuildResult<Outcome> {
        match &self.default {
            Some(key) => self.build(key),
            None => self.root.build(),
        }
    }
}

/// Root dependencies are keyed by display name, so names must not collide
fn check_unique_names(targets: &BTreeMap<String, Arc<dyn Target>>) -> BuildResult<()> {
    let mut owners: BTreeMap<String, &str> = BTreeMap::new();
    for (key, target) in targets {
        let name = target.name();
        if let Some(other) = owners.insert(name.clone(), key) {
            return Err(BuildError::Manifest(format!(
                "targets `{}` and `{}` share the name `{}`",
                other, key, name
            )));
        }
    }
    Ok(())
}

struct Wirer<'a> {
    manifest: &'a Manifest,
    shell: &'a Shell,
    wired: BTreeMap<String, Arc<dyn Target>>,
    visiting: Vec<String>,
}

impl Wirer<'_> {
    fn wire(&mut self, key: &str) -> BuildResult<Arc<dyn Target>> {
        if let Some(target) = self.wired.get(key) {
            return Ok(Arc::clone(target));
        }

        if let Some(start) = self.visiting.iter().position(|k| k == key) {
            let mut chain = self.visiting[start..].to_vec();
            chain.push(key.to_string());
            return Err(BuildError::DependencyCycle { chain });
        }

        let manifest = self.manifest;
        let spec = manifest
            .targets
            .get(key)
            .ok_or_else(|| BuildError::Manifest(format!("unknown target `{}`", key)))?;

        self.visiting.push(key.to_string());
        let deps = spec
            .depends
            .iter()
            .map(|dep| self.wire(dep))
            .collect::<BuildResult<Vec<_>>>();
        self.visiting.pop();

        let target = self.assemble(key, spec, deps?)?;
        self.wired.insert(key.to_string(), Arc::clone(&target));
        Ok(target)
    }

    fn assemble(
        &self,
        key: &str,
        spec: &TargetSpec,
        deps: Vec<Arc<dyn Target>>,
    ) -> BuildResult<Arc<dyn Target>> {
        let target = match spec.kind(key)? {
            TargetKind::File => finish(FileTarget::files(&spec.files), spec, self.shell, deps),
            TargetKind::Glob => finish(
                GlobTarget::new(spec.glob.clone().unwrap_or_default()),
                spec,
                self.shell,
                deps,
            ),
            TargetKind::Phony => finish(PhonyTarget::new(key), spec, self.shell, deps),
        };
        Ok(target)
    }
}

fn finish<T: Wiring>(
    target: T,
    spec: &TargetSpec,
    shell: &Shell,
    deps: Vec<Arc<dyn Target>>,
) -> Arc<dyn Target> {
    let target = target.depends(deps);

    let Some(template) = spec.command.clone() else {
        return target.shared();
    };

    let name = target.name();
    let files = spec.resources().join(" ");
    let shell = shell.clone();

    target
        .make(move |deps| {
            let placeholders = Placeholders {
                target: name.clone(),
                files: files.clone(),
                deps: deps.iter().map(|d| d.name()).collect::<Vec<_>>().join(" "),
            };
            let command = interpolate_command(&template, &placeholders);
            tracing::debug!("Running: {}", command);

            let result = shell.run(&command).inspect_err(|e| {
                if let BuildError::CommandFailed { stderr, .. } = e {
                    if !stderr.is_empty() {
                        eprint!("{}", stderr);
                    }
                }
            })?;
            if !result.stdout.is_empty() {
                print!("{}", result.stdout);
            }
            if !result.stderr.is_empty() {
                eprint!("{}", result.stderr);
            }
            Ok(())
        })
        .shared()
}
