//! Local embeddings using Model2Vec static models

use crate::embedding::{validate_embeddings, Embedder};
use crate::error::EmbeddingError;
use async_trait::async_trait;
use log::{debug, info};
use model2vec_rs::model::StaticModel;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Embedder backed by a Model2Vec model loaded into memory.
///
/// The model is loaded by `initialize()` and dropped by `close()`. Between the
/// two it is shared read-only by every concurrent `embed` call.
pub struct Model2VecEmbedder {
    source: PathBuf,
    normalize: Option<bool>,
    model_name: String,
    model: RwLock<Option<Arc<StaticModel>>>,
}

impl Model2VecEmbedder {
    /// `source` is either a local model directory or a Hugging Face repo id.
    pub fn new(source: impl Into<PathBuf>, model_name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            normalize: None,
            model_name: model_name.into(),
            model: RwLock::new(None),
        }
    }

    /// Override the model's own normalization setting from `config.json`
    pub fn with_normalize(mut self, normalize: Option<bool>) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn source(&self) -> &PathBuf {
        &self.source
    }

    pub async fn is_initialized(&self) -> bool {
        self.model.read().await.is_some()
    }

    async fn loaded_model(&self) -> Result<Arc<StaticModel>, EmbeddingError> {
        self.model
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or_else(|| EmbeddingError::NotInitialized(self.model_name.clone()))
    }
}

#[async_trait]
impl Embedder for Model2VecEmbedder {
    async fn embed(&self, labels: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let model = self.loaded_model().await?;
        if labels.is_empty() {
            return Ok(Vec::new());
        }

        let start_time = Instant::now();
        let texts = labels.to_vec();
        let embeddings = tokio::task::spawn_blocking(move || model.encode(&texts))
            .await
            .map_err(|e| EmbeddingError::Unavailable(format!("Embedding task failed: {}", e)))?;

        validate_embeddings(labels.len(), &embeddings)?;
        debug!(
            "Encoded {} labels with {} in {:.2?}",
            labels.len(),
            self.model_name,
            start_time.elapsed()
        );

        Ok(embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn initialize(&self) -> Result<(), EmbeddingError> {
        let mut slot = self.model.write().await;
        if slot.is_some() {
            return Ok(());
        }

        let start_time = Instant::now();
        info!("Loading Model2Vec embedding model from: {}", self.source.display());

        let source = self.source.clone();
        let normalize = self.normalize;
        let model = tokio::task::spawn_blocking(move || {
            StaticModel::from_pretrained(&source, None, normalize, None)
        })
        .await
        .map_err(|e| EmbeddingError::ModelLoading(format!("Model loading task failed: {}", e)))??;

        info!("Model {} loaded in {:.2?}", self.model_name, start_time.elapsed());
        *slot = Some(Arc::new(model));
        Ok(())
    }

    async fn close(&self) {
        if self.model.write().await.take().is_some() {
            info!("Released embedding model {}", self.model_name);
        }
    }
}
