use crate::models::coordinate::Coordinate;
use crate::models::exclude::ExcludeRule;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Whether an item deploys as a module (an install directory of its own)
/// or as a library (a file dropped into the shared lib directory).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Module,
    Library,
}

impl std::fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DependencyKind::Module => write!(f, "module"),
            DependencyKind::Library => write!(f, "library"),
        }
    }
}

/// How the resolved content is packaged inside the component.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Jar,
    Dir,
    Bundled,
}

/// A dependency explicitly declared by the caller.
#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DependencyItem {
    Module(ModuleItem),
    Library(LibraryItem),
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
pub struct ModuleItem {
    pub coordinate: Coordinate,
    /// Install directory the module occupies, relative to the component
    /// root. Blank means "derive from the artifact name".
    #[serde(default)]
    pub target_path: String,
    #[serde(default = "default_true")]
    pub resolve_transitive: bool,
    #[serde(default)]
    pub content_kind: ContentKind,
    #[serde(default)]
    pub environment_types: BTreeSet<String>,
    #[serde(default)]
    pub classifiers: BTreeSet<String>,
    #[serde(default)]
    pub excludes: Vec<ExcludeRule>,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
pub struct LibraryItem {
    pub coordinate: Coordinate,
    /// File name the library occupies inside the shared lib directory.
    /// Blank means "derive from the coordinate".
    #[serde(default)]
    pub target_name: String,
    #[serde(default = "default_true")]
    pub resolve_transitive: bool,
    #[serde(default)]
    pub content_kind: ContentKind,
    #[serde(default)]
    pub environment_types: BTreeSet<String>,
    #[serde(default)]
    pub classifiers: BTreeSet<String>,
    #[serde(default)]
    pub excludes: Vec<ExcludeRule>,
}

fn default_true() -> bool {
    true
}

impl DependencyItem {
    pub fn kind(&self) -> DependencyKind {
        match self {
            DependencyItem::Module(_) => DependencyKind::Module,
            DependencyItem::Library(_) => DependencyKind::Library,
        }
    }

    pub fn coordinate(&self) -> &Coordinate {
        match self {
            DependencyItem::Module(item) => &item.coordinate,
            DependencyItem::Library(item) => &item.coordinate,
        }
    }

    /// Declared target, before blank-target derivation.
    pub fn declared_target(&self) -> &str {
        match self {
            DependencyItem::Module(item) => &item.target_path,
            DependencyItem::Library(item) => &item.target_name,
        }
    }

    pub fn resolve_transitive(&self) -> bool {
        match self {
            DependencyItem::Module(item) => item.resolve_transitive,
            DependencyItem::Library(item) => item.resolve_transitive,
        }
    }

    pub fn content_kind(&self) -> ContentKind {
        match self {
            DependencyItem::Module(item) => item.content_kind,
            DependencyItem::Library(item) => item.content_kind,
        }
    }

    pub fn environment_types(&self) -> &BTreeSet<String> {
        match self {
            DependencyItem::Module(item) => &item.environment_types,
            DependencyItem::Library(item) => &item.environment_types,
        }
    }

    pub fn classifiers(&self) -> &BTreeSet<String> {
        match self {
            DependencyItem::Module(item) => &item.classifiers,
            DependencyItem::Library(item) => &item.classifiers,
        }
    }

    pub fn excludes(&self) -> &[ExcludeRule] {
        match self {
            DependencyItem::Module(item) => &item.excludes,
            DependencyItem::Library(item) => &item.excludes,
        }
    }
}

impl ModuleItem {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            target_path: String::new(),
            resolve_transitive: true,
            content_kind: ContentKind::default(),
            environment_types: BTreeSet::new(),
            classifiers: BTreeSet::new(),
            excludes: Vec::new(),
        }
    }

    pub fn with_target_path(mut self, target_path: impl Into<String>) -> Self {
        self.target_path = target_path.into();
        self
    }
}

impl LibraryItem {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            target_name: String::new(),
            resolve_transitive: true,
            content_kind: ContentKind::default(),
            environment_types: BTreeSet::new(),
            classifiers: BTreeSet::new(),
            excludes: Vec::new(),
        }
    }

    pub fn with_target_name(mut self, target_name: impl Into<String>) -> Self {
        self.target_name = target_name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_serde_representation() {
        let item = DependencyItem::Module(
            ModuleItem::new(Coordinate::new("g", "a", "1").unwrap()).with_target_path("engine"),
        );
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "module");
        assert_eq!(json["target_path"], "engine");

        let back: DependencyItem = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), DependencyKind::Module);
        assert_eq!(back.declared_target(), "engine");
    }
}
