//! Reference implementations of the descriptor serialization collaborator.

use loadout_api::{ComponentDescriptor, DescriptorSerializer};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Persists the descriptor as pretty-printed JSON.
pub struct JsonDescriptorSerializer;

impl DescriptorSerializer for JsonDescriptorSerializer {
    fn write(&self, descriptor: &ComponentDescriptor, destination: &Path) -> std::io::Result<()> {
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(destination)?;
        serde_json::to_writer_pretty(BufWriter::new(file), descriptor)?;
        Ok(())
    }
}

/// Runs the full validation pipeline without persisting anything.
pub struct NullDescriptorSerializer;

impl DescriptorSerializer for NullDescriptorSerializer {
    fn write(&self, _descriptor: &ComponentDescriptor, _destination: &Path) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn descriptor() -> ComponentDescriptor {
        ComponentDescriptor {
            name: "demo".to_string(),
            version: "1.0".to_string(),
            lib_dir: "lib".to_string(),
            modules: Vec::new(),
            libraries: Vec::new(),
            files: Vec::new(),
            bundles: Vec::new(),
            directories: Vec::new(),
            links: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn test_json_serializer_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("nested/out/demo.component.json");
        JsonDescriptorSerializer
            .write(&descriptor(), &destination)
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&destination).unwrap()).unwrap();
        assert_eq!(written["name"], "demo");
        assert_eq!(written["version"], "1.0");
    }
}
