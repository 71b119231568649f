use crate::models::descriptor::ComponentDescriptor;
use std::path::Path;

/// Persists an assembled descriptor. The on-disk format is the
/// collaborator's concern; the assembler only hands over the populated
/// descriptor once every validation passed.
pub trait DescriptorSerializer: Send + Sync {
    fn write(&self, descriptor: &ComponentDescriptor, destination: &Path) -> std::io::Result<()>;
}
