#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type ModelResult<T> = std::result::Result<T, ModelError>;
