use crate::models::component::{BundleEntry, DirectoryEntry, FileEntry, LinkEntry};
use crate::models::item::{ContentKind, DependencyKind};
use crate::models::resolved::{Origin, ResolvedDependency, ResolvedSet};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The assembled descriptor, handed to the serializer collaborator once
/// every validation passed. Only the data the collision/conflict checks
/// drove is modeled; the persistence format beyond this is the
/// serializer's concern.
#[derive(Serialize, Debug, Clone)]
pub struct ComponentDescriptor {
    pub name: String,
    pub version: String,
    pub lib_dir: String,
    pub modules: Vec<DependencyRecord>,
    pub libraries: Vec<DependencyRecord>,
    pub files: Vec<FileEntry>,
    pub bundles: Vec<BundleEntry>,
    pub directories: Vec<DirectoryEntry>,
    pub links: Vec<LinkEntry>,
    pub properties: BTreeMap<String, String>,
}

/// One resolved dependency as it appears in the descriptor.
#[derive(Serialize, Debug, Clone)]
pub struct DependencyRecord {
    pub coordinate: String,
    pub target: String,
    pub content_kind: ContentKind,
    pub direct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
    pub jars: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub container_archives: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub environment_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classifiers: Vec<String>,
}

impl DependencyRecord {
    pub fn from_resolved(dependency: &ResolvedDependency) -> Self {
        let via = match &dependency.origin {
            Origin::Direct => None,
            Origin::Transitive { via } => Some(via.to_string()),
        };
        Self {
            coordinate: dependency.coordinate.to_string(),
            target: dependency.target.clone(),
            content_kind: dependency.content_kind,
            direct: dependency.origin.is_direct(),
            via,
            jars: dependency.jars.iter().cloned().collect(),
            container_archives: dependency.container_archives.iter().cloned().collect(),
            environment_types: dependency.environment_types.iter().cloned().collect(),
            classifiers: dependency.classifiers.iter().cloned().collect(),
        }
    }
}

impl ComponentDescriptor {
    /// Splits a resolved set into the descriptor's module and library
    /// sections, preserving acceptance order within each.
    pub fn dependency_records(
        resolved: &ResolvedSet,
    ) -> (Vec<DependencyRecord>, Vec<DependencyRecord>) {
        let mut modules = Vec::new();
        let mut libraries = Vec::new();
        for dependency in resolved.iter() {
            let record = DependencyRecord::from_resolved(dependency);
            match dependency.kind {
                DependencyKind::Module => modules.push(record),
                DependencyKind::Library => libraries.push(record),
            }
        }
        (modules, libraries)
    }
}
