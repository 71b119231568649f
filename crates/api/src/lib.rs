pub mod error;
pub mod models;
pub mod resolver;
pub mod serializer;

// Re-export commonly used types
pub use error::{ModelError, ModelResult};
pub use models::*;
pub use resolver::{
    ArtifactFile, ArtifactFileType, ArtifactResolver, ResolveError, ResolvedArtifact,
    TransitiveEdge,
};
pub use serializer::DescriptorSerializer;
