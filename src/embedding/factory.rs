//! Provider selection from configuration

use crate::config::{Config, EmbeddingProvider, LocalEmbeddingConfig};
use crate::embedding::cache::CachedEmbedder;
use crate::embedding::local::Model2VecEmbedder;
use crate::embedding::model_manager::EmbeddingModelManager;
use crate::embedding::remote::RemoteEmbedder;
use crate::embedding::Embedder;
use crate::error::Result;
use log::debug;
use std::path::{Path, PathBuf};

/// Build the embedder named by `embedding.provider`.
///
/// The returned embedder is not initialized; callers own its lifecycle.
pub async fn build_embedder(config: &Config) -> Result<Box<dyn Embedder>> {
    let embedder: Box<dyn Embedder> = match config.embedding.provider {
        EmbeddingProvider::Local => {
            let local = &config.embedding.local;
            let source = resolve_local_model_source(local).await?;
            debug!("Using local embedding model {} at {}", local.model, source.display());
            Box::new(Model2VecEmbedder::new(source, local.model.clone()).with_normalize(local.normalize))
        }
        EmbeddingProvider::Remote => {
            let remote = RemoteEmbedder::from_config(&config.embedding.remote)?;
            debug!(
                "Using remote embedding API {:?} at {}",
                remote.api_format(),
                config.embedding.remote.base_url
            );
            Box::new(remote)
        }
    };

    if config.embedding.enable_cache {
        Ok(Box::new(CachedEmbedder::new(embedder)))
    } else {
        Ok(embedder)
    }
}

/// Map the configured model to something `Model2VecEmbedder` can load.
///
/// Registry ids (and their repo ids or names) are downloaded into the models
/// directory on first use. Existing paths are used as-is. Anything else is
/// passed through as a Hugging Face repo id.
pub async fn resolve_local_model_source(local: &LocalEmbeddingConfig) -> Result<PathBuf> {
    let as_path = Path::new(&local.model);
    if as_path.is_dir() {
        return Ok(as_path.to_path_buf());
    }

    let mut manager = EmbeddingModelManager::new(local.models_dir.clone()).await?;
    match manager.resolve_model_id(&local.model) {
        Some(model_id) => manager.ensure_model_available(&model_id).await,
        None => Ok(PathBuf::from(&local.model)),
    }
}
