//! The resolution engine: merges declared dependency items with their
//! transitively discovered dependencies, enforcing exclusion rules and
//! surfacing duplicate targets and version conflicts.
//!
//! Both passes are sequential and run in declaration order -- the
//! conflict, exclusion and duplicate decisions all depend on deterministic
//! ordering, so no parallelism participates here.

use crate::error::{BuildError, Result};
use crate::resolve::session::ResolutionSession;
use loadout_api::{
    ArtifactResolver, ContentKind, Coordinate, DependencyItem, DependencyKind, ExcludeRule,
    Origin, ResolvedArtifact, ResolvedDependency, ResolvedSet, TransitiveEdge,
};
use std::collections::BTreeSet;
use tracing::debug;

pub struct ResolutionEngine<'a> {
    resolver: &'a dyn ArtifactResolver,
}

/// Edges of one direct item, kept for the transitive pass together with
/// the context the pass needs to apply.
struct PendingEdges {
    via: Coordinate,
    excludes: Vec<ExcludeRule>,
    environment_types: BTreeSet<String>,
    classifiers: BTreeSet<String>,
    edges: Vec<TransitiveEdge>,
}

impl<'a> ResolutionEngine<'a> {
    pub fn new(resolver: &'a dyn ArtifactResolver) -> Self {
        Self { resolver }
    }

    /// Resolves the declared items and their transitive closure into one
    /// ordered set. Deterministic given identical inputs and identical
    /// resolver answers.
    pub fn resolve(
        &self,
        items: &[DependencyItem],
        global_excludes: &[ExcludeRule],
    ) -> Result<ResolvedSet> {
        let mut session = ResolutionSession::new(global_excludes);
        let mut pending: Vec<PendingEdges> = Vec::new();

        for item in items {
            item.coordinate().validate()?;
            let target = direct_target(item);
            session.check_direct_uniqueness(item, &target)?;

            let artifact = self
                .resolver
                .resolve(item.coordinate(), item.resolve_transitive())
                .map_err(BuildError::from)?;
            debug!(
                coordinate = %item.coordinate(),
                kind = %item.kind(),
                target = %target,
                "accepted direct dependency"
            );

            session.accept(direct_dependency(item, target, &artifact));
            if item.resolve_transitive() {
                pending.push(PendingEdges {
                    via: item.coordinate().clone(),
                    excludes: item.excludes().to_vec(),
                    environment_types: item.environment_types().clone(),
                    classifiers: item.classifiers().clone(),
                    edges: artifact.transitive,
                });
            }
        }

        for batch in pending {
            for edge in &batch.edges {
                self.absorb_edge(&mut session, &batch, edge)?;
            }
        }

        Ok(session.finish())
    }

    fn absorb_edge(
        &self,
        session: &mut ResolutionSession<'_>,
        batch: &PendingEdges,
        edge: &TransitiveEdge,
    ) -> Result<()> {
        let coordinate = &edge.coordinate;

        // Explicit inclusion always wins: a coordinate declared as a direct
        // item is already in the set and excludes cannot drop it.
        if session.is_direct(coordinate) {
            debug!(%coordinate, via = %batch.via, "transitive edge shadowed by direct item");
            return Ok(());
        }

        // A dropped coordinate is neither inserted nor reported, so the
        // exclusion check runs before any conflict detection.
        if session.is_excluded(coordinate, &batch.excludes) {
            debug!(%coordinate, via = %batch.via, "transitive dependency excluded");
            return Ok(());
        }

        if let Some(direct) = session.direct_version_clash(coordinate) {
            return Err(BuildError::VersionConflict {
                group: coordinate.group.clone(),
                artifact: coordinate.artifact.clone(),
                existing: direct.version.clone(),
                incoming: coordinate.version.clone(),
                origin: edge.origin.clone(),
            });
        }

        if let Some(sibling) = session.transitive_sibling(coordinate) {
            if sibling.version != coordinate.version {
                return Err(BuildError::VersionConflict {
                    group: coordinate.group.clone(),
                    artifact: coordinate.artifact.clone(),
                    existing: sibling.version.clone(),
                    incoming: coordinate.version.clone(),
                    origin: edge.origin.clone(),
                });
            }
            debug!(%coordinate, via = %batch.via, "merging tags into accumulated dependency");
            let sibling = sibling.clone();
            session.merge_tags(&sibling, &batch.environment_types, &batch.classifiers);
            return Ok(());
        }

        // Same exact coordinate discovered again through another item of a
        // local-reference chain; merge rather than re-resolve.
        if session.resolved(coordinate).is_some() {
            session.merge_tags(coordinate, &batch.environment_types, &batch.classifiers);
            return Ok(());
        }

        let artifact = self
            .resolver
            .resolve(coordinate, false)
            .map_err(BuildError::from)?;
        let target = transitive_target(coordinate, edge.kind);
        debug!(
            %coordinate,
            via = %batch.via,
            kind = %edge.kind,
            target = %target,
            "accepted transitive dependency"
        );
        session.accept(transitive_dependency(batch, edge, target, &artifact));
        Ok(())
    }
}

/// Declared target with the blank default applied: modules install under
/// the artifact name, libraries as `group_artifact_version.jar`.
fn direct_target(item: &DependencyItem) -> String {
    let declared = item.declared_target();
    if !declared.is_empty() {
        return declared.to_string();
    }
    let coordinate = item.coordinate();
    match item.kind() {
        DependencyKind::Module => module_target(coordinate),
        DependencyKind::Library => library_target(coordinate),
    }
}

fn transitive_target(coordinate: &Coordinate, kind: DependencyKind) -> String {
    match kind {
        DependencyKind::Module => module_target(coordinate),
        DependencyKind::Library => library_target(coordinate),
    }
}

fn module_target(coordinate: &Coordinate) -> String {
    match &coordinate.local_ref {
        Some(reference) if coordinate.artifact.is_empty() => reference.clone(),
        _ => coordinate.artifact.clone(),
    }
}

fn library_target(coordinate: &Coordinate) -> String {
    match &coordinate.local_ref {
        Some(reference) if coordinate.artifact.is_empty() => format!("{reference}.jar"),
        _ => format!(
            "{}_{}_{}.jar",
            coordinate.group, coordinate.artifact, coordinate.version
        ),
    }
}

fn direct_dependency(
    item: &DependencyItem,
    target: String,
    artifact: &ResolvedArtifact,
) -> ResolvedDependency {
    let mut classifiers = item.classifiers().clone();
    classifiers.extend(artifact.classifiers().map(str::to_string));
    ResolvedDependency {
        coordinate: item.coordinate().clone(),
        kind: item.kind(),
        content_kind: item.content_kind(),
        target,
        origin: Origin::Direct,
        jars: artifact.jars().map(|f| f.path.clone()).collect(),
        container_archives: artifact
            .container_archives()
            .map(|f| f.path.clone())
            .collect(),
        classifiers,
        environment_types: item.environment_types().clone(),
    }
}

fn transitive_dependency(
    batch: &PendingEdges,
    edge: &TransitiveEdge,
    target: String,
    artifact: &ResolvedArtifact,
) -> ResolvedDependency {
    let mut classifiers = batch.classifiers.clone();
    classifiers.extend(artifact.classifiers().map(str::to_string));
    ResolvedDependency {
        coordinate: edge.coordinate.clone(),
        kind: edge.kind,
        content_kind: ContentKind::default(),
        target,
        origin: Origin::Transitive {
            via: batch.via.clone(),
        },
        jars: artifact.jars().map(|f| f.path.clone()).collect(),
        container_archives: artifact
            .container_archives()
            .map(|f| f.path.clone())
            .collect(),
        classifiers,
        environment_types: batch.environment_types.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadout_api::{ArtifactFile, ArtifactFileType, LibraryItem, ModuleItem, ResolveError};
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Answers resolution queries from a fixed table, like the external
    /// collaborator would.
    #[derive(Default)]
    struct TableResolver {
        artifacts: HashMap<String, ResolvedArtifact>,
    }

    impl TableResolver {
        fn with(mut self, coordinate: &str, artifact: ResolvedArtifact) -> Self {
            self.artifacts.insert(coordinate.to_string(), artifact);
            self
        }
    }

    impl ArtifactResolver for TableResolver {
        fn resolve(
            &self,
            coordinate: &Coordinate,
            _transitive: bool,
        ) -> std::result::Result<ResolvedArtifact, ResolveError> {
            self.artifacts
                .get(&coordinate.to_string())
                .cloned()
                .ok_or_else(|| ResolveError::new(coordinate, "not in table"))
        }
    }

    fn coordinate(text: &str) -> Coordinate {
        Coordinate::parse(text).unwrap()
    }

    fn jar(path: &str) -> ArtifactFile {
        ArtifactFile {
            path: PathBuf::from(path),
            file_type: ArtifactFileType::Archive,
            classifier: None,
        }
    }

    fn edge(text: &str, kind: DependencyKind, origin: &str) -> TransitiveEdge {
        TransitiveEdge {
            coordinate: coordinate(text),
            kind,
            origin: origin.to_string(),
        }
    }

    fn artifact(jars: &[&str], edges: Vec<TransitiveEdge>) -> ResolvedArtifact {
        ResolvedArtifact {
            files: jars.iter().map(|j| jar(j)).collect(),
            transitive: edges,
        }
    }

    fn module(text: &str) -> DependencyItem {
        DependencyItem::Module(ModuleItem::new(coordinate(text)))
    }

    fn library(text: &str) -> DependencyItem {
        DependencyItem::Library(LibraryItem::new(coordinate(text)))
    }

    #[test]
    fn test_direct_items_resolve_in_order() {
        let resolver = TableResolver::default()
            .with("g:app:1", artifact(&["app.jar"], vec![]))
            .with("g:util:1", artifact(&["util.jar"], vec![]));
        let engine = ResolutionEngine::new(&resolver);

        let resolved = engine
            .resolve(&[module("g:app:1"), library("g:util:1")], &[])
            .unwrap();

        let order: Vec<String> = resolved.iter().map(|d| d.target.clone()).collect();
        assert_eq!(order, vec!["app", "g_util_1.jar"]);
    }

    #[test]
    fn test_resolver_failure_names_coordinate() {
        let resolver = TableResolver::default();
        let engine = ResolutionEngine::new(&resolver);

        let err = engine.resolve(&[module("g:app:1")], &[]).unwrap_err();
        match err {
            BuildError::DependencyResolution { coordinate, .. } => {
                assert_eq!(coordinate, "g:app:1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_module_target_rejected() {
        let resolver = TableResolver::default()
            .with("g:app:1", artifact(&["app.jar"], vec![]))
            .with("h:other:2", artifact(&["other.jar"], vec![]));
        let engine = ResolutionEngine::new(&resolver);

        let items = [
            DependencyItem::Module(ModuleItem::new(coordinate("g:app:1")).with_target_path("app")),
            DependencyItem::Module(
                ModuleItem::new(coordinate("h:other:2")).with_target_path("app"),
            ),
        ];
        let err = engine.resolve(&items, &[]).unwrap_err();
        match err {
            BuildError::DuplicateTarget {
                target,
                first,
                second,
            } => {
                assert_eq!(target, "app");
                assert_eq!(first, "g:app:1");
                assert_eq!(second, "h:other:2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_same_target_different_kind_is_allowed() {
        let resolver = TableResolver::default()
            .with("g:app:1", artifact(&["app.jar"], vec![]))
            .with("h:other:2", artifact(&["other.jar"], vec![]));
        let engine = ResolutionEngine::new(&resolver);

        let items = [
            DependencyItem::Module(ModuleItem::new(coordinate("g:app:1")).with_target_path("x")),
            DependencyItem::Library(
                LibraryItem::new(coordinate("h:other:2")).with_target_name("x"),
            ),
        ];
        assert!(engine.resolve(&items, &[]).is_ok());
    }

    #[test]
    fn test_duplicate_coordinate_rejected() {
        let resolver =
            TableResolver::default().with("g:app:1", artifact(&["app.jar"], vec![]));
        let engine = ResolutionEngine::new(&resolver);

        let items = [
            DependencyItem::Module(ModuleItem::new(coordinate("g:app:1")).with_target_path("a")),
            DependencyItem::Module(ModuleItem::new(coordinate("g:app:1")).with_target_path("b")),
        ];
        assert!(matches!(
            engine.resolve(&items, &[]),
            Err(BuildError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_transitive_closure_is_accumulated() {
        let resolver = TableResolver::default()
            .with(
                "g:app:1",
                artifact(
                    &["app.jar"],
                    vec![edge(
                        "org.dep:common:3",
                        DependencyKind::Library,
                        "declared in g:app:1",
                    )],
                ),
            )
            .with("org.dep:common:3", artifact(&["common.jar"], vec![]));
        let engine = ResolutionEngine::new(&resolver);

        let resolved = engine.resolve(&[module("g:app:1")], &[]).unwrap();
        assert_eq!(resolved.len(), 2);
        let common = resolved.get(&coordinate("org.dep:common:3")).unwrap();
        assert_eq!(common.target, "org.dep_common_3.jar");
        assert!(!common.origin.is_direct());
    }

    #[test]
    fn test_version_conflict_between_transitive_edges() {
        let resolver = TableResolver::default()
            .with(
                "g:a:1",
                artifact(
                    &["a.jar"],
                    vec![edge("dep:x:1.0", DependencyKind::Library, "declared in g:a:1")],
                ),
            )
            .with(
                "g:b:1",
                artifact(
                    &["b.jar"],
                    vec![edge("dep:x:2.0", DependencyKind::Library, "declared in g:b:1")],
                ),
            )
            .with("dep:x:1.0", artifact(&["x-1.jar"], vec![]));
        let engine = ResolutionEngine::new(&resolver);

        let err = engine
            .resolve(&[module("g:a:1"), module("g:b:1")], &[])
            .unwrap_err();
        match err {
            BuildError::VersionConflict {
                group,
                artifact,
                existing,
                incoming,
                origin,
            } => {
                assert_eq!((group.as_str(), artifact.as_str()), ("dep", "x"));
                assert_eq!((existing.as_str(), incoming.as_str()), ("1.0", "2.0"));
                assert_eq!(origin, "declared in g:b:1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_identical_transitive_coordinates_merge_environment_types() {
        let resolver = TableResolver::default()
            .with(
                "g:a:1",
                artifact(
                    &["a.jar"],
                    vec![edge("dep:x:1.0", DependencyKind::Library, "via g:a:1")],
                ),
            )
            .with(
                "g:b:1",
                artifact(
                    &["b.jar"],
                    vec![edge("dep:x:1.0", DependencyKind::Library, "via g:b:1")],
                ),
            )
            .with("dep:x:1.0", artifact(&["x.jar"], vec![]));
        let engine = ResolutionEngine::new(&resolver);

        let mut first = ModuleItem::new(coordinate("g:a:1"));
        first.environment_types.insert("production".to_string());
        let mut second = ModuleItem::new(coordinate("g:b:1"));
        second.environment_types.insert("test".to_string());

        let resolved = engine
            .resolve(
                &[
                    DependencyItem::Module(first),
                    DependencyItem::Module(second),
                ],
                &[],
            )
            .unwrap();

        let merged = resolved.get(&coordinate("dep:x:1.0")).unwrap();
        let tags: Vec<&str> = merged
            .environment_types
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(tags, vec!["production", "test"]);
    }

    #[test]
    fn test_transitive_conflicting_with_direct_version() {
        let resolver = TableResolver::default()
            .with("dep:x:1.0", artifact(&["x-1.jar"], vec![]))
            .with(
                "g:a:1",
                artifact(
                    &["a.jar"],
                    vec![edge("dep:x:2.0", DependencyKind::Library, "via g:a:1")],
                ),
            );
        let engine = ResolutionEngine::new(&resolver);

        let err = engine
            .resolve(&[library("dep:x:1.0"), module("g:a:1")], &[])
            .unwrap_err();
        assert!(matches!(err, BuildError::VersionConflict { .. }));
    }

    #[test]
    fn test_global_exclude_drops_transitive_dependency() {
        let resolver = TableResolver::default().with(
            "g:a:1",
            artifact(
                &["a.jar"],
                vec![edge("org.slf4j:slf4j-api:2.0", DependencyKind::Library, "via g:a:1")],
            ),
        );
        let engine = ResolutionEngine::new(&resolver);

        let excludes = [ExcludeRule::new("org.slf4j", "*", "").unwrap()];
        let resolved = engine.resolve(&[module("g:a:1")], &excludes).unwrap();
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn test_explicit_declaration_overrides_exclude() {
        let resolver = TableResolver::default()
            .with("org.slf4j:slf4j-api:2.0", artifact(&["slf4j.jar"], vec![]))
            .with(
                "g:a:1",
                artifact(
                    &["a.jar"],
                    vec![edge("org.slf4j:slf4j-api:2.0", DependencyKind::Library, "via g:a:1")],
                ),
            );
        let engine = ResolutionEngine::new(&resolver);

        let excludes = [ExcludeRule::new("org.slf4j", "*", "").unwrap()];
        let resolved = engine
            .resolve(
                &[library("org.slf4j:slf4j-api:2.0"), module("g:a:1")],
                &excludes,
            )
            .unwrap();

        assert_eq!(resolved.len(), 2);
        let kept = resolved
            .get(&coordinate("org.slf4j:slf4j-api:2.0"))
            .unwrap();
        assert!(kept.origin.is_direct());
    }

    #[test]
    fn test_per_item_exclude_drops_only_that_items_edges() {
        let resolver = TableResolver::default()
            .with(
                "g:a:1",
                artifact(
                    &["a.jar"],
                    vec![edge("noise:n:1", DependencyKind::Library, "via g:a:1")],
                ),
            )
            .with(
                "g:b:1",
                artifact(
                    &["b.jar"],
                    vec![edge("noise:n:1", DependencyKind::Library, "via g:b:1")],
                ),
            )
            .with("noise:n:1", artifact(&["n.jar"], vec![]));
        let engine = ResolutionEngine::new(&resolver);

        let mut first = ModuleItem::new(coordinate("g:a:1"));
        first.excludes.push(ExcludeRule::new("noise", "", "").unwrap());

        let resolved = engine
            .resolve(
                &[DependencyItem::Module(first), module("g:b:1")],
                &[],
            )
            .unwrap();

        // Dropped for g:a:1's edge, still discovered through g:b:1.
        assert!(resolved.contains(&coordinate("noise:n:1")));
        assert_eq!(resolved.len(), 3);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let resolver = TableResolver::default()
            .with(
                "g:a:1",
                artifact(
                    &["a.jar"],
                    vec![
                        edge("dep:x:1", DependencyKind::Library, "via g:a:1"),
                        edge("dep:y:1", DependencyKind::Module, "via g:a:1"),
                    ],
                ),
            )
            .with("dep:x:1", artifact(&["x.jar"], vec![]))
            .with("dep:y:1", artifact(&["y.jar"], vec![]));
        let engine = ResolutionEngine::new(&resolver);
        let items = [module("g:a:1")];

        let first: Vec<String> = engine
            .resolve(&items, &[])
            .unwrap()
            .iter()
            .map(|d| format!("{}->{}", d.coordinate, d.target))
            .collect();
        let second: Vec<String> = engine
            .resolve(&items, &[])
            .unwrap()
            .iter()
            .map(|d| format!("{}->{}", d.coordinate, d.target))
            .collect();
        assert_eq!(first, second);
    }
}
