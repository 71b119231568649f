//! A declarative [`ArtifactResolver`] backed by a JSON artifact manifest.
//!
//! The manifest pins every resolver answer up front, which keeps builds
//! reproducible and gives the integration tests a collaborator that
//! behaves exactly like the real resolution service would:
//!
//! ```json
//! {
//!   "artifacts": {
//!     "org.example:engine:1.0": {
//!       "files": [{ "path": "repo/engine-1.0.jar" }],
//!       "dependencies": [{ "coordinate": "org.dep:common:3", "kind": "library" }]
//!     }
//!   },
//!   "locals": { "shared-model": "org.example:model:1.0" }
//! }
//! ```

use indexmap::IndexMap;
use loadout_api::{
    ArtifactFile, ArtifactFileType, ArtifactResolver, Coordinate, DependencyKind, ResolveError,
    ResolvedArtifact, TransitiveEdge,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, Default)]
struct ManifestDoc {
    #[serde(default)]
    artifacts: IndexMap<String, ManifestArtifact>,
    /// Maps local-reference names to registry coordinates.
    #[serde(default)]
    locals: IndexMap<String, String>,
}

#[derive(Deserialize, Debug, Default)]
struct ManifestArtifact {
    #[serde(default)]
    files: Vec<ManifestFile>,
    #[serde(default)]
    dependencies: Vec<ManifestEdge>,
}

#[derive(Deserialize, Debug)]
struct ManifestFile {
    path: PathBuf,
    #[serde(default, rename = "type")]
    file_type: ArtifactFileType,
    #[serde(default)]
    classifier: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ManifestEdge {
    coordinate: String,
    #[serde(default = "default_edge_kind")]
    kind: DependencyKind,
    #[serde(default)]
    origin: Option<String>,
}

fn default_edge_kind() -> DependencyKind {
    DependencyKind::Library
}

pub struct ManifestResolver {
    doc: ManifestDoc,
    /// Relative file paths in the manifest resolve against this directory.
    base_dir: PathBuf,
}

impl ManifestResolver {
    pub fn from_path(path: &Path) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Self::from_json(&text, base_dir)
    }

    pub fn from_json(text: &str, base_dir: PathBuf) -> crate::Result<Self> {
        let doc: ManifestDoc = serde_json::from_str(text)?;
        Ok(Self { doc, base_dir })
    }

    fn lookup_key(&self, coordinate: &Coordinate) -> Result<String, ResolveError> {
        match &coordinate.local_ref {
            Some(reference) => self
                .doc
                .locals
                .get(reference)
                .cloned()
                .ok_or_else(|| ResolveError::new(coordinate, "unknown local reference")),
            None => Ok(coordinate.module_string()),
        }
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl ArtifactResolver for ManifestResolver {
    fn resolve(
        &self,
        coordinate: &Coordinate,
        transitive: bool,
    ) -> Result<ResolvedArtifact, ResolveError> {
        let key = self.lookup_key(coordinate)?;
        let entry = self
            .doc
            .artifacts
            .get(&key)
            .ok_or_else(|| ResolveError::new(coordinate, "not present in the artifact manifest"))?;

        let files = entry
            .files
            .iter()
            .map(|file| ArtifactFile {
                path: self.absolute(&file.path),
                file_type: file.file_type,
                classifier: file.classifier.clone(),
            })
            .collect();

        let mut edges = Vec::new();
        if transitive {
            // The contract hands back the flattened closure, so every
            // reachable coordinate is walked here, depth-first.
            let mut queue: Vec<(String, &ManifestArtifact)> = vec![(key.clone(), entry)];
            let mut seen = vec![key];
            while let Some((parent_key, parent)) = queue.pop() {
                for dependency in &parent.dependencies {
                    let child = Coordinate::parse(&dependency.coordinate).map_err(|err| {
                        ResolveError::new(coordinate, format!("bad manifest edge: {err}"))
                    })?;
                    edges.push(TransitiveEdge {
                        coordinate: child,
                        kind: dependency.kind,
                        origin: dependency
                            .origin
                            .clone()
                            .unwrap_or_else(|| format!("declared in {parent_key}")),
                    });
                    if seen.contains(&dependency.coordinate) {
                        continue;
                    }
                    seen.push(dependency.coordinate.clone());
                    if let Some(next) = self.doc.artifacts.get(&dependency.coordinate) {
                        queue.push((dependency.coordinate.clone(), next));
                    }
                }
            }
        }

        Ok(ResolvedArtifact {
            files,
            transitive: edges,
        })
    }
}
