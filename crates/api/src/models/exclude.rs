use crate::error::{ModelError, ModelResult};
use crate::models::coordinate::Coordinate;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A glob pattern compiled to an anchored regex matcher.
///
/// Blank input matches everything, a literal `.` stays literal, and `*`
/// stands for any run of characters. Everything else is matched verbatim.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn compile(source: impl Into<String>) -> ModelResult<Self> {
        let source = source.into();
        let mut translated = String::with_capacity(source.len() + 8);
        for ch in source.chars() {
            match ch {
                '*' => translated.push_str(".*"),
                other => translated.push_str(&regex::escape(&other.to_string())),
            }
        }
        let regex = Regex::new(&format!("^{translated}$")).map_err(|err| {
            ModelError::InvalidConfiguration(format!("invalid pattern '{source}': {err}"))
        })?;
        Ok(Self { source, regex })
    }

    pub fn matches(&self, candidate: &str) -> bool {
        // Blank pattern is the wildcard: anything passes.
        self.source.is_empty() || self.regex.is_match(candidate)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn match_all() -> Self {
        Self::compile("").expect("blank pattern always compiles")
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl std::hash::Hash for Pattern {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

impl Serialize for Pattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::compile(source).map_err(serde::de::Error::custom)
    }
}

impl schemars::JsonSchema for Pattern {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("Pattern")
    }

    fn json_schema(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        String::json_schema(generator)
    }
}

/// Excludes a coordinate when **all three** patterns match it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, schemars::JsonSchema)]
pub struct ExcludeRule {
    #[serde(default = "Pattern::match_all")]
    pub group: Pattern,
    #[serde(default = "Pattern::match_all")]
    pub artifact: Pattern,
    #[serde(default = "Pattern::match_all")]
    pub version: Pattern,
}

impl ExcludeRule {
    pub fn new(group: &str, artifact: &str, version: &str) -> ModelResult<Self> {
        Ok(Self {
            group: Pattern::compile(group)?,
            artifact: Pattern::compile(artifact)?,
            version: Pattern::compile(version)?,
        })
    }

    pub fn matches(&self, coordinate: &Coordinate) -> bool {
        self.group.matches(&coordinate.group)
            && self.artifact.matches(&coordinate.artifact)
            && self.version.matches(&coordinate.version)
    }
}

impl std::fmt::Display for ExcludeRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.group.source(),
            self.artifact.source(),
            self.version.source()
        )
    }
}
