//! Per-build resolution state.
//!
//! One `ResolutionSession` is created for each descriptor build, threaded
//! through the direct and transitive passes, and consumed when the build
//! finishes. Nothing here outlives the build.

use crate::error::{BuildError, Result};
use loadout_api::{
    Coordinate, DependencyItem, ExcludeRule, ModelError, Origin, ResolvedDependency, ResolvedSet,
};
use std::collections::HashMap;

pub(crate) struct ResolutionSession<'a> {
    global_excludes: &'a [ExcludeRule],
    accepted: ResolvedSet,
    /// Registry-coordinate index of direct items, for transitive-vs-direct
    /// version clash detection. Local references carry no group/artifact
    /// and are not indexed.
    direct_by_group_artifact: HashMap<(String, String), Coordinate>,
    /// Same index over the transitive accumulator.
    transitive_by_group_artifact: HashMap<(String, String), Coordinate>,
    module_targets: HashMap<String, Coordinate>,
    library_targets: HashMap<String, Coordinate>,
}

impl<'a> ResolutionSession<'a> {
    pub(crate) fn new(global_excludes: &'a [ExcludeRule]) -> Self {
        Self {
            global_excludes,
            accepted: ResolvedSet::new(),
            direct_by_group_artifact: HashMap::new(),
            transitive_by_group_artifact: HashMap::new(),
            module_targets: HashMap::new(),
            library_targets: HashMap::new(),
        }
    }

    pub(crate) fn is_direct(&self, coordinate: &Coordinate) -> bool {
        self.accepted
            .get(coordinate)
            .is_some_and(|d| d.origin.is_direct())
    }

    /// The direct item occupying the same (group, artifact) at a different
    /// version, if any.
    pub(crate) fn direct_version_clash(&self, coordinate: &Coordinate) -> Option<&Coordinate> {
        if coordinate.is_local() {
            return None;
        }
        self.direct_by_group_artifact
            .get(&(coordinate.group.clone(), coordinate.artifact.clone()))
            .filter(|existing| existing.version != coordinate.version)
    }

    /// The transitive accumulator entry sharing (group, artifact), if any.
    pub(crate) fn transitive_sibling(&self, coordinate: &Coordinate) -> Option<&Coordinate> {
        if coordinate.is_local() {
            return None;
        }
        self.transitive_by_group_artifact
            .get(&(coordinate.group.clone(), coordinate.artifact.clone()))
    }

    /// A coordinate is dropped when a global rule or one of the originating
    /// item's rules matches it. Callers handle the explicit-inclusion
    /// override before asking.
    pub(crate) fn is_excluded(&self, coordinate: &Coordinate, item_excludes: &[ExcludeRule]) -> bool {
        self.global_excludes
            .iter()
            .chain(item_excludes)
            .any(|rule| rule.matches(coordinate))
    }

    /// Declaration-order uniqueness checks: one coordinate per build, one
    /// target per kind.
    pub(crate) fn check_direct_uniqueness(
        &self,
        item: &DependencyItem,
        target: &str,
    ) -> Result<()> {
        let coordinate = item.coordinate();
        if self.accepted.contains(coordinate) {
            return Err(BuildError::InvalidConfiguration(
                ModelError::InvalidConfiguration(format!(
                    "dependency {coordinate} is declared more than once"
                )),
            ));
        }
        let targets = match item.kind() {
            loadout_api::DependencyKind::Module => &self.module_targets,
            loadout_api::DependencyKind::Library => &self.library_targets,
        };
        if let Some(existing) = targets.get(target) {
            return Err(BuildError::DuplicateTarget {
                target: target.to_string(),
                first: existing.to_string(),
                second: coordinate.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn accept(&mut self, dependency: ResolvedDependency) {
        if !dependency.coordinate.is_local() {
            let key = (
                dependency.coordinate.group.clone(),
                dependency.coordinate.artifact.clone(),
            );
            match dependency.origin {
                Origin::Direct => {
                    self.direct_by_group_artifact
                        .insert(key, dependency.coordinate.clone());
                }
                Origin::Transitive { .. } => {
                    self.transitive_by_group_artifact
                        .insert(key, dependency.coordinate.clone());
                }
            }
        }
        match dependency.kind {
            loadout_api::DependencyKind::Module => {
                self.module_targets
                    .insert(dependency.target.clone(), dependency.coordinate.clone());
            }
            loadout_api::DependencyKind::Library => {
                self.library_targets
                    .insert(dependency.target.clone(), dependency.coordinate.clone());
            }
        }
        self.accepted.insert(dependency);
    }

    /// Folds another discovery of an already-accumulated coordinate into
    /// the existing entry.
    pub(crate) fn merge_tags(
        &mut self,
        coordinate: &Coordinate,
        environment_types: &std::collections::BTreeSet<String>,
        classifiers: &std::collections::BTreeSet<String>,
    ) {
        if let Some(entry) = self.accepted.get_mut(coordinate) {
            entry
                .environment_types
                .extend(environment_types.iter().cloned());
            entry.classifiers.extend(classifiers.iter().cloned());
        }
    }

    pub(crate) fn resolved(&self, coordinate: &Coordinate) -> Option<&ResolvedDependency> {
        self.accepted.get(coordinate)
    }

    pub(crate) fn finish(self) -> ResolvedSet {
        self.accepted
    }
}
