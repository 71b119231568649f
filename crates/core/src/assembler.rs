//! Orchestration of one descriptor build.
//!
//! The assembler walks a fixed phase order: resolve the dependency set,
//! check every install path against one shared path tree, scan the
//! resolved jars for class collisions, then hand the populated descriptor
//! to the serialization collaborator. Any phase error ends the build; no
//! partial descriptor is ever emitted.

use crate::classpath::{ClasspathScanner, JarRef, write_report};
use crate::error::{BuildError, Result};
use crate::pathtree::{InsertOutcome, PathTree};
use crate::resolve::ResolutionEngine;
use loadout_api::{
    ArtifactResolver, ComponentDescriptor, ComponentSpec, DependencyKind, DescriptorSerializer,
    ModelError, Origin, Pattern, ResolvedSet,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Init,
    Resolving,
    PathChecking,
    ClassChecking,
    Assembled,
    Failed,
}

impl std::fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BuildPhase::Init => "init",
            BuildPhase::Resolving => "resolving",
            BuildPhase::PathChecking => "path-checking",
            BuildPhase::ClassChecking => "class-checking",
            BuildPhase::Assembled => "assembled",
            BuildPhase::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub check_class_collisions: bool,
    pub scan_timeout: Duration,
    /// Where the collision report lands; defaults to
    /// `<destination>/<name>-class-collisions.txt`.
    pub class_report_path: Option<PathBuf>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            check_class_collisions: true,
            scan_timeout: crate::classpath::scanner::DEFAULT_SCAN_TIMEOUT,
            class_report_path: None,
        }
    }
}

pub struct DescriptorAssembler<'a> {
    resolver: &'a dyn ArtifactResolver,
    serializer: &'a dyn DescriptorSerializer,
    options: BuildOptions,
    phase: BuildPhase,
}

impl<'a> DescriptorAssembler<'a> {
    pub fn new(
        resolver: &'a dyn ArtifactResolver,
        serializer: &'a dyn DescriptorSerializer,
    ) -> Self {
        Self {
            resolver,
            serializer,
            options: BuildOptions::default(),
            phase: BuildPhase::Init,
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    /// Builds the descriptor into `destination` and returns its path.
    pub fn build(&mut self, spec: &ComponentSpec, destination: &Path) -> Result<PathBuf> {
        match self.run(spec, destination) {
            Ok(path) => Ok(path),
            Err(err) => {
                self.transition(BuildPhase::Failed);
                Err(err)
            }
        }
    }

    fn run(&mut self, spec: &ComponentSpec, destination: &Path) -> Result<PathBuf> {
        spec.validate()?;

        self.transition(BuildPhase::Resolving);
        let engine = ResolutionEngine::new(self.resolver);
        let resolved = engine.resolve(&spec.dependencies, &spec.global_excludes)?;
        info!(dependencies = resolved.len(), "dependency set resolved");

        self.transition(BuildPhase::PathChecking);
        self.check_paths(spec, &resolved)?;

        if self.options.check_class_collisions {
            let jars = jar_refs(&resolved);
            if !jars.is_empty() {
                self.transition(BuildPhase::ClassChecking);
                self.check_classes(spec, jars, destination)?;
            }
        }

        let (modules, libraries) = ComponentDescriptor::dependency_records(&resolved);
        let descriptor = ComponentDescriptor {
            name: spec.name.clone(),
            version: spec.version.clone(),
            lib_dir: spec.lib_dir.clone(),
            modules,
            libraries,
            files: spec.files.clone(),
            bundles: spec.bundles.clone(),
            directories: spec.directories.clone(),
            links: spec.links.clone(),
            properties: spec.properties.clone(),
        };

        self.transition(BuildPhase::Assembled);
        let path = destination.join(spec.descriptor_file_name());
        self.serializer.write(&descriptor, &path)?;
        info!(path = %path.display(), "descriptor written");
        Ok(path)
    }

    /// Every deployable item claims its install location against one shared
    /// tree; all violations are accumulated before the build fails.
    fn check_paths(&self, spec: &ComponentSpec, resolved: &ResolvedSet) -> Result<()> {
        let mut tree = PathTree::new();
        let mut violations: Vec<String> = Vec::new();
        let none = BTreeSet::new();
        let mut record = |outcome: InsertOutcome| {
            if let Some(message) = outcome.message {
                violations.push(message);
            }
        };

        record(tree.insert(&none, &none, &spec.descriptor_file_name()));
        for dependency in resolved.iter() {
            let path = match dependency.kind {
                DependencyKind::Module => dependency.target.clone(),
                DependencyKind::Library => format!("{}/{}", spec.lib_dir, dependency.target),
            };
            record(tree.insert(
                &dependency.environment_types,
                &dependency.classifiers,
                &path,
            ));
        }
        for file in &spec.files {
            record(tree.insert(&file.environment_types, &file.classifiers, &file.target_path));
        }
        for bundle in &spec.bundles {
            record(tree.insert(
                &bundle.environment_types,
                &bundle.classifiers,
                &bundle.target_path,
            ));
        }
        for directory in &spec.directories {
            record(tree.insert(
                &directory.environment_types,
                &directory.classifiers,
                &directory.target_path,
            ));
        }
        for link in &spec.links {
            record(tree.insert(&link.environment_types, &link.classifiers, &link.link_path));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            warn!(count = violations.len(), "install path collisions found");
            Err(BuildError::PathCollision {
                report: violations.join("\n"),
            })
        }
    }

    fn check_classes(
        &self,
        spec: &ComponentSpec,
        jars: Vec<JarRef>,
        destination: &Path,
    ) -> Result<()> {
        let patterns = spec
            .excluded_class_patterns
            .iter()
            .map(|pattern| Pattern::compile(pattern))
            .collect::<std::result::Result<Vec<_>, ModelError>>()?;

        let scanner = ClasspathScanner::with_timeout(self.options.scan_timeout);
        let index = scanner.scan(jars, &patterns)?;
        if !index.has_collisions() {
            return Ok(());
        }

        let report = self
            .options
            .class_report_path
            .clone()
            .unwrap_or_else(|| destination.join(format!("{}-class-collisions.txt", spec.name)));
        write_report(&index, &report)?;
        warn!(
            count = index.collision_count(),
            report = %report.display(),
            "classpath collisions found"
        );
        Err(BuildError::ClassCollision {
            count: index.collision_count(),
            report,
        })
    }

    fn transition(&mut self, phase: BuildPhase) {
        info!(from = %self.phase, to = %phase, "build phase");
        self.phase = phase;
    }
}

fn jar_refs(resolved: &ResolvedSet) -> Vec<JarRef> {
    resolved
        .iter()
        .flat_map(|dependency| {
            let parent = match &dependency.origin {
                Origin::Direct => None,
                Origin::Transitive { via } => Some(via.clone()),
            };
            dependency.jars.iter().map(move |path| JarRef {
                coordinate: dependency.coordinate.clone(),
                parent: parent.clone(),
                path: path.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::NullDescriptorSerializer;
    use loadout_api::{
        ArtifactFile, ArtifactFileType, Coordinate, DependencyItem, FileEntry, ModuleItem,
        ResolveError, ResolvedArtifact,
    };
    use std::collections::HashMap;

    #[derive(Default)]
    struct TableResolver {
        artifacts: HashMap<String, ResolvedArtifact>,
    }

    impl TableResolver {
        fn with_jar(mut self, coordinate: &str, jar: &str) -> Self {
            self.artifacts.insert(
                coordinate.to_string(),
                ResolvedArtifact {
                    files: vec![ArtifactFile {
                        path: PathBuf::from(jar),
                        file_type: ArtifactFileType::Archive,
                        classifier: None,
                    }],
                    transitive: Vec::new(),
                },
            );
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

    fn spec_with_files(files: Vec<FileEntry>) -> ComponentSpec {
        serde_json::from_value(serde_json::json!({
            "name": "demo",
            "version": "1.0",
        }))
        .map(|mut spec: ComponentSpec| {
            spec.files = files;
            spec
        })
        .unwrap()
    }

    fn file_entry(target: &str) -> FileEntry {
        FileEntry {
            source: format!("src/{target}"),
            target_path: target.to_string(),
            environment_types: BTreeSet::new(),
            classifiers: BTreeSet::new(),
        }
    }

    #[test]
    fn test_path_collisions_are_aggregated() {
        let resolver = TableResolver::default();
        let serializer = NullDescriptorSerializer;
        let mut assembler = DescriptorAssembler::new(&resolver, &serializer);

        let spec = spec_with_files(vec![
            file_entry("conf/app.properties"),
            file_entry("conf/app.properties"),
            file_entry("conf/app.properties/extra"),
        ]);
        let dir = tempfile::tempdir().unwrap();

        let err = assembler.build(&spec, dir.path()).unwrap_err();
        match err {
            BuildError::PathCollision { report } => {
                // Both the identical claim and the nested claim must be listed.
                assert_eq!(report.lines().count(), 2);
                assert!(report.contains("already claimed"));
                assert!(report.contains("not self-contained"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(assembler.phase(), BuildPhase::Failed);
    }

    #[test]
    fn test_module_target_and_library_path_share_the_tree() {
        let resolver = TableResolver::default().with_jar("g:engine:1", "engine.jar");
        let serializer = NullDescriptorSerializer;
        let mut assembler = DescriptorAssembler::new(&resolver, &serializer);

        let mut spec = spec_with_files(vec![file_entry("engine/core.txt")]);
        spec.dependencies.push(DependencyItem::Module(
            ModuleItem::new(Coordinate::parse("g:engine:1").unwrap()).with_target_path("engine"),
        ));
        let dir = tempfile::tempdir().unwrap();

        let err = assembler.build(&spec, dir.path()).unwrap_err();
        assert!(matches!(err, BuildError::PathCollision { .. }));
    }

    #[test]
    fn test_successful_build_ends_assembled() {
        let resolver = TableResolver::default();
        let serializer = NullDescriptorSerializer;
        let mut assembler = DescriptorAssembler::new(&resolver, &serializer);

        let spec = spec_with_files(vec![file_entry("conf/app.properties")]);
        let dir = tempfile::tempdir().unwrap();

        let path = assembler.build(&spec, dir.path()).unwrap();
        assert!(path.ends_with("demo.component.json"));
        assert_eq!(assembler.phase(), BuildPhase::Assembled);
    }

    #[test]
    fn test_resolution_failure_reaches_failed_phase() {
        let resolver = TableResolver::default();
        let serializer = NullDescriptorSerializer;
        let mut assembler = DescriptorAssembler::new(&resolver, &serializer);

        let mut spec = spec_with_files(vec![]);
        spec.dependencies.push(DependencyItem::Module(ModuleItem::new(
            Coordinate::parse("g:missing:1").unwrap(),
        )));
        let dir = tempfile::tempdir().unwrap();

        let err = assembler.build(&spec, dir.path()).unwrap_err();
        assert!(matches!(err, BuildError::DependencyResolution { .. }));
        assert_eq!(assembler.phase(), BuildPhase::Failed);
    }
}
