use crate::models::coordinate::Coordinate;
use crate::models::item::{ContentKind, DependencyKind};
use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// How a resolved dependency entered the component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Direct,
    Transitive { via: Coordinate },
}

impl Origin {
    pub fn is_direct(&self) -> bool {
        matches!(self, Origin::Direct)
    }
}

/// One dependency after resolution, with the concrete files backing it.
///
/// Produced by the resolution pass and owned by it for the duration of one
/// descriptor build; never mutated after the build completes.
#[derive(Debug, Clone)]
pub struct ResolvedDependency {
    pub coordinate: Coordinate,
    pub kind: DependencyKind,
    pub content_kind: ContentKind,
    /// Install path (module) or shared-lib file name (library).
    pub target: String,
    pub origin: Origin,
    /// Archive-type files, in resolver order.
    pub jars: IndexSet<PathBuf>,
    /// Packaged-bundle-type files.
    pub container_archives: BTreeSet<PathBuf>,
    pub classifiers: BTreeSet<String>,
    pub environment_types: BTreeSet<String>,
}

/// The accepted dependencies of one build, in acceptance order: declared
/// items first (declaration order), then transitive discoveries (discovery
/// order). Iteration order is the determinism contract of the engine.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSet {
    entries: IndexMap<Coordinate, ResolvedDependency>,
}

impl ResolvedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dependency: ResolvedDependency) {
        self.entries
            .insert(dependency.coordinate.clone(), dependency);
    }

    pub fn get(&self, coordinate: &Coordinate) -> Option<&ResolvedDependency> {
        self.entries.get(coordinate)
    }

    pub fn get_mut(&mut self, coordinate: &Coordinate) -> Option<&mut ResolvedDependency> {
        self.entries.get_mut(coordinate)
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.entries.contains_key(coordinate)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedDependency> {
        self.entries.values()
    }

    pub fn modules(&self) -> impl Iterator<Item = &ResolvedDependency> {
        self.iter().filter(|d| d.kind == DependencyKind::Module)
    }

    pub fn libraries(&self) -> impl Iterator<Item = &ResolvedDependency> {
        self.iter().filter(|d| d.kind == DependencyKind::Library)
    }
}

impl<'a> IntoIterator for &'a ResolvedSet {
    type Item = &'a ResolvedDependency;
    type IntoIter = indexmap::map::Values<'a, Coordinate, ResolvedDependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
