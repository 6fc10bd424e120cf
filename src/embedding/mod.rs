//! Embedding providers behind a single `Embedder` capability

pub mod cache;
pub mod factory;
pub mod local;
pub mod model_manager;
pub mod remote;

use crate::error::EmbeddingError;
use async_trait::async_trait;
use std::sync::Arc;

pub use cache::CachedEmbedder;
pub use factory::build_embedder;
pub use local::Model2VecEmbedder;
pub use remote::RemoteEmbedder;

/// Turns skill labels into fixed-length vectors.
///
/// Implementations return exactly one vector per label, in input order, and
/// every vector they produce has the same length.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, labels: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Name of the model backing this embedder
    fn model_name(&self) -> &str;

    /// Acquire expensive resources (model weights, clients). Idempotent.
    async fn initialize(&self) -> Result<(), EmbeddingError> {
        Ok(())
    }

    /// Release whatever `initialize` acquired.
    async fn close(&self) {}
}

#[async_trait]
impl<E: Embedder + ?Sized> Embedder for Box<E> {
    async fn embed(&self, labels: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).embed(labels).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    async fn initialize(&self) -> Result<(), EmbeddingError> {
        (**self).initialize().await
    }

    async fn close(&self) {
        (**self).close().await
    }
}

#[async_trait]
impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    async fn embed(&self, labels: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).embed(labels).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    async fn initialize(&self) -> Result<(), EmbeddingError> {
        (**self).initialize().await
    }

    async fn close(&self) {
        (**self).close().await
    }
}

/// Check a provider's output against the number of labels it was given.
///
/// Returns the shared dimensionality. An empty input with an empty output is
/// valid and yields `0`.
pub fn validate_embeddings(expected_count: usize, vectors: &[Vec<f32>]) -> Result<usize, EmbeddingError> {
    if vectors.len() != expected_count {
        return Err(EmbeddingError::Malformed(format!(
            "expected {} embeddings, got {}",
            expected_count,
            vectors.len()
        )));
    }

    let Some(first) = vectors.first() else {
        return Ok(0);
    };

    let dim = first.len();
    if dim == 0 {
        return Err(EmbeddingError::Malformed("embedding vectors are empty".to_string()));
    }

    for (i, vector) in vectors.iter().enumerate() {
        if vector.len() != dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dim,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(EmbeddingError::Malformed(format!(
                "embedding {} contains non-finite values",
                i
            )));
        }
    }

    Ok(dim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_embeddings() {
        let vectors = vec![vec![0.1, 0.2], vec![0.3, 0.4]];
        assert_eq!(validate_embeddings(2, &vectors).unwrap(), 2);
        assert_eq!(validate_embeddings(0, &[]).unwrap(), 0);
    }

    #[test]
    fn test_validate_embeddings_rejects_bad_output() {
        assert!(matches!(
            validate_embeddings(3, &[vec![1.0], vec![1.0]]),
            Err(EmbeddingError::Malformed(_))
        ));
        assert!(matches!(
            validate_embeddings(1, &[vec![]]),
            Err(EmbeddingError::Malformed(_))
        ));
        assert!(matches!(
            validate_embeddings(2, &[vec![1.0, 0.0], vec![1.0]]),
            Err(EmbeddingError::DimensionMismatch { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            validate_embeddings(1, &[vec![f32::NAN, 1.0]]),
            Err(EmbeddingError::Malformed(_))
        ));
    }
}
