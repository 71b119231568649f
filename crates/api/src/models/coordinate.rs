use crate::error::{ModelError, ModelResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identity of a dependency: either a registry coordinate
/// (`group:artifact:version`) or a reference to a local project.
///
/// When `local_ref` is set, the group/artifact/version fields are resolved
/// indirectly by the artifact resolver; until then they may be blank.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, JsonSchema)]
pub struct Coordinate {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub artifact: String,
    #[serde(default)]
    pub version: String,
    /// Name of a local/project reference, mutually independent of the
    /// registry fields. Two coordinates are equal only if all four fields
    /// match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_ref: Option<String>,
}

impl Coordinate {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> ModelResult<Self> {
        let coordinate = Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
            local_ref: None,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    pub fn local(reference: impl Into<String>) -> ModelResult<Self> {
        let coordinate = Self {
            group: String::new(),
            artifact: String::new(),
            version: String::new(),
            local_ref: Some(reference.into()),
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Parses a `group:artifact:version` string.
    pub fn parse(text: &str) -> ModelResult<Self> {
        let mut parts = text.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(group), Some(artifact), Some(version), None) => {
                Self::new(group, artifact, version)
            }
            _ => Err(ModelError::InvalidConfiguration(format!(
                "coordinate '{text}' is not of the form group:artifact:version"
            ))),
        }
    }

    /// A coordinate with every field blank identifies nothing.
    pub fn validate(&self) -> ModelResult<()> {
        let blank_ref = self.local_ref.as_deref().unwrap_or("").is_empty();
        if self.group.is_empty() && self.artifact.is_empty() && self.version.is_empty() && blank_ref
        {
            return Err(ModelError::InvalidConfiguration(
                "dependency coordinate has no group, artifact, version or local reference"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_local(&self) -> bool {
        self.local_ref.is_some()
    }

    pub fn module_string(&self) -> String {
        format!("{}:{}:{}", self.group, self.artifact, self.version)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.local_ref {
            Some(reference) => write!(f, "local:{reference}"),
            None => write!(f, "{}", self.module_string()),
        }
    }
}
