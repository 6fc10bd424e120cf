//! Error handling for the skill matcher

use thiserror::Error;

/// Failures of an embedding provider.
///
/// The matcher never retries or recovers from these; they reach the caller
/// unchanged.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding provider unavailable: {0}")]
    Unavailable(String),

    #[error("Embedding provider rate limited: {0}")]
    RateLimited(String),

    #[error("Embedding provider returned status {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Malformed embedding result: {0}")]
    Malformed(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding model not initialized: {0}")]
    NotInitialized(String),

    #[error("Embedding model loading error: {0}")]
    ModelLoading(String),
}

#[derive(Error, Debug)]
pub enum SkillMatcherError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, SkillMatcherError>;

/// model2vec-rs reports load failures through anyhow
impl From<anyhow::Error> for EmbeddingError {
    fn from(err: anyhow::Error) -> Self {
        EmbeddingError::ModelLoading(format!("{:#}", err))
    }
}
