use crate::error::{ModelError, ModelResult};
use crate::models::exclude::ExcludeRule;
use crate::models::item::DependencyItem;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Declarative input of one descriptor build: everything the component
/// deploys, plus the rules constraining its dependency closure.
#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
pub struct ComponentSpec {
    pub name: String,
    pub version: String,
    /// Shared directory library files install into.
    #[serde(default = "default_lib_dir")]
    pub lib_dir: String,
    /// File name of the descriptor inside the component root. Blank means
    /// `<name>.component.json`.
    #[serde(default)]
    pub descriptor_path: String,
    #[serde(default)]
    pub dependencies: Vec<DependencyItem>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub bundles: Vec<BundleEntry>,
    #[serde(default)]
    pub directories: Vec<DirectoryEntry>,
    #[serde(default)]
    pub links: Vec<LinkEntry>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Excludes applied to every transitively discovered coordinate.
    #[serde(default)]
    pub global_excludes: Vec<ExcludeRule>,
    /// Class-entry patterns ignored by the classpath collision scan.
    #[serde(default)]
    pub excluded_class_patterns: Vec<String>,
}

fn default_lib_dir() -> String {
    "lib".to_string()
}

/// A single file copied into the component.
#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
pub struct FileEntry {
    pub source: String,
    pub target_path: String,
    #[serde(default)]
    pub environment_types: BTreeSet<String>,
    #[serde(default)]
    pub classifiers: BTreeSet<String>,
}

/// An archive bundled into the component, optionally unpacked at install
/// time.
#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
pub struct BundleEntry {
    pub source: String,
    pub target_path: String,
    #[serde(default)]
    pub unpack: bool,
    #[serde(default)]
    pub environment_types: BTreeSet<String>,
    #[serde(default)]
    pub classifiers: BTreeSet<String>,
}

/// An empty directory created at install time.
#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
pub struct DirectoryEntry {
    pub target_path: String,
    #[serde(default)]
    pub environment_types: BTreeSet<String>,
    #[serde(default)]
    pub classifiers: BTreeSet<String>,
}

/// A symbolic link created at install time.
#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
pub struct LinkEntry {
    /// Where the link itself lives.
    pub link_path: String,
    /// What the link points at.
    pub target: String,
    #[serde(default)]
    pub environment_types: BTreeSet<String>,
    #[serde(default)]
    pub classifiers: BTreeSet<String>,
}

impl ComponentSpec {
    /// Descriptor file name, with the blank default applied.
    pub fn descriptor_file_name(&self) -> String {
        if self.descriptor_path.is_empty() {
            format!("{}.component.json", self.name)
        } else {
            self.descriptor_path.clone()
        }
    }

    /// Shallow validation of the declarative surface. Coordinate and
    /// pattern validity is checked where those values are constructed;
    /// this catches the blank-string cases serde lets through.
    pub fn validate(&self) -> ModelResult<()> {
        if self.name.trim().is_empty() {
            return Err(ModelError::InvalidConfiguration(
                "component name must not be blank".to_string(),
            ));
        }
        for item in &self.dependencies {
            item.coordinate().validate()?;
        }
        for file in &self.files {
            if file.target_path.trim().is_empty() {
                return Err(ModelError::InvalidConfiguration(format!(
                    "file entry '{}' has a blank target path",
                    file.source
                )));
            }
        }
        for bundle in &self.bundles {
            if bundle.target_path.trim().is_empty() {
                return Err(ModelError::InvalidConfiguration(format!(
                    "bundle entry '{}' has a blank target path",
                    bundle.source
                )));
            }
        }
        for directory in &self.directories {
            if directory.target_path.trim().is_empty() {
                return Err(ModelError::InvalidConfiguration(
                    "directory entry has a blank target path".to_string(),
                ));
            }
        }
        for link in &self.links {
            if link.link_path.trim().is_empty() || link.target.trim().is_empty() {
                return Err(ModelError::InvalidConfiguration(
                    "link entry must name both the link path and its target".to_string(),
                ));
            }
        }
        Ok(())
    }
}
