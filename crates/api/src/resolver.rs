//! Contract of the external artifact-resolution collaborator.
//!
//! The engine treats coordinate resolution as a black box: given a
//! coordinate it receives concrete files and, when asked, the transitive
//! dependency edges reachable from it. Whatever caching or retrying the
//! collaborator does internally is its own concern.

use crate::models::coordinate::Coordinate;
use crate::models::item::DependencyKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Role of one file within a resolved artifact.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactFileType {
    /// A classpath archive (jar).
    #[default]
    Archive,
    /// A packaged bundle that installs as a container, not on the classpath.
    PackagedBundle,
    Sources,
    Javadoc,
    Other,
}

impl ArtifactFileType {
    /// Sources and javadoc carry no deployable content; their classifiers
    /// do not describe the artifact itself.
    pub fn is_documentation(self) -> bool {
        matches!(self, ArtifactFileType::Sources | ArtifactFileType::Javadoc)
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactFile {
    pub path: PathBuf,
    pub file_type: ArtifactFileType,
    pub classifier: Option<String>,
}

/// One transitive dependency edge. Whether the far end is module-shaped or
/// library-shaped is a property reported by the resolver, never inferred.
#[derive(Debug, Clone)]
pub struct TransitiveEdge {
    pub coordinate: Coordinate,
    pub kind: DependencyKind,
    /// Human-readable label of where the edge came from, used verbatim in
    /// conflict diagnostics.
    pub origin: String,
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedArtifact {
    pub files: Vec<ArtifactFile>,
    pub transitive: Vec<TransitiveEdge>,
}

impl ResolvedArtifact {
    /// Archive-type files, in resolver order.
    pub fn jars(&self) -> impl Iterator<Item = &ArtifactFile> {
        self.files
            .iter()
            .filter(|f| f.file_type == ArtifactFileType::Archive)
    }

    pub fn container_archives(&self) -> impl Iterator<Item = &ArtifactFile> {
        self.files
            .iter()
            .filter(|f| f.file_type == ArtifactFileType::PackagedBundle)
    }

    /// Classifier tags of the non-documentation files.
    pub fn classifiers(&self) -> impl Iterator<Item = &str> {
        self.files
            .iter()
            .filter(|f| !f.file_type.is_documentation())
            .filter_map(|f| f.classifier.as_deref())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{coordinate}: {reason}")]
pub struct ResolveError {
    pub coordinate: String,
    pub reason: String,
}

impl ResolveError {
    pub fn new(coordinate: &Coordinate, reason: impl Into<String>) -> Self {
        Self {
            coordinate: coordinate.to_string(),
            reason: reason.into(),
        }
    }
}

pub trait ArtifactResolver: Send + Sync {
    /// Resolves a coordinate to its concrete files. With `transitive` set,
    /// the result also carries every dependency edge reachable from the
    /// coordinate, already flattened.
    fn resolve(
        &self,
        coordinate: &Coordinate,
        transitive: bool,
    ) -> Result<ResolvedArtifact, ResolveError>;
}
