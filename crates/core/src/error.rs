use loadout_api::{ModelError, ResolveError};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Every failure mode of one descriptor build. All variants are terminal:
/// nothing is retried and the engine never picks a winner on conflict.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    InvalidConfiguration(#[from] ModelError),
    #[error("duplicate target '{target}': claimed by both {first} and {second}")]
    DuplicateTarget {
        target: String,
        first: String,
        second: String,
    },
    #[error(
        "version conflict for {group}:{artifact}: {existing} vs {incoming} ({origin})"
    )]
    VersionConflict {
        group: String,
        artifact: String,
        existing: String,
        incoming: String,
        origin: String,
    },
    #[error("dependency resolution failed for {coordinate}: {reason}")]
    DependencyResolution { coordinate: String, reason: String },
    #[error("install path collisions:\n{report}")]
    PathCollision { report: String },
    #[error("{count} classes are defined in more than one archive, see {}", .report.display())]
    ClassCollision { count: usize, report: PathBuf },
    #[error("classpath scan did not finish within {timeout:?}")]
    ScanTimeout { timeout: Duration },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ResolveError> for BuildError {
    fn from(err: ResolveError) -> Self {
        BuildError::DependencyResolution {
            coordinate: err.coordinate,
            reason: err.reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
