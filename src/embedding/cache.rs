//! Memoizing wrapper around any embedder

use crate::embedding::{validate_embeddings, Embedder};
use crate::error::EmbeddingError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Caches vectors by exact label text.
///
/// Only labels missing from the cache reach the inner embedder, each at most
/// once per call. Nothing is cached from a failed call.
pub struct CachedEmbedder<E> {
    inner: E,
    cache: Mutex<HashMap<String, Vec<f32>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub cache_size: usize,
    pub hits: usize,
    pub misses: usize,
    pub model_name: String,
}

impl<E: Embedder> CachedEmbedder<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            cache_size: self.lock_cache().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            model_name: self.inner.model_name().to_string(),
        }
    }

    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<f32>>> {
        // Entries are inserted whole, so a poisoned map is still consistent
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl<E: Embedder> Embedder for CachedEmbedder<E> {
    async fn embed(&self, labels: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let uncached: Vec<String> = {
            let cache = self.lock_cache();
            let mut seen = HashSet::new();
            labels
                .iter()
                .filter(|label| !cache.contains_key(*label))
                .filter(|label| seen.insert(label.as_str()))
                .cloned()
                .collect()
        };

        if !uncached.is_empty() {
            let fresh = self.inner.embed(&uncached).await?;
            validate_embeddings(uncached.len(), &fresh)?;

            let mut cache = self.lock_cache();
            if let (Some(existing), Some(new)) = (cache.values().next(), fresh.first()) {
                if existing.len() != new.len() {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected: existing.len(),
                        actual: new.len(),
                    });
                }
            }
            for (label, vector) in uncached.iter().zip(fresh) {
                cache.insert(label.clone(), vector);
            }
        }

        let cache = self.lock_cache();
        let vectors = labels
            .iter()
            .map(|label| {
                cache.get(label).cloned().ok_or_else(|| {
                    EmbeddingError::Malformed(format!("embedding for '{}' was evicted mid-call", label))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.misses.fetch_add(uncached.len(), Ordering::Relaxed);
        self.hits.fetch_add(labels.len() - uncached.len(), Ordering::Relaxed);
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn initialize(&self) -> Result<(), EmbeddingError> {
        self.inner.initialize().await
    }

    async fn close(&self) {
        self.clear_cache();
        self.inner.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Embeds a label as [len, first byte] and counts labels it was asked for
    struct CountingEmbedder {
        requested: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, labels: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.requested.fetch_add(labels.len(), Ordering::SeqCst);
            Ok(labels
                .iter()
                .map(|l| vec![l.len() as f32, l.bytes().next().unwrap_or(0) as f32])
                .collect())
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _labels: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Err(EmbeddingError::Unavailable("offline".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_cache_hits_and_order() {
        let embedder = CachedEmbedder::new(CountingEmbedder {
            requested: AtomicUsize::new(0),
        });

        let first = embedder.embed(&labels(&["react", "git", "react"])).await.unwrap();
        assert_eq!(first[0], first[2]);
        assert_eq!(first[1], vec![3.0, b'g' as f32]);
        assert_eq!(embedder.inner().requested.load(Ordering::SeqCst), 2);

        let second = embedder.embed(&labels(&["git", "css"])).await.unwrap();
        assert_eq!(second[0], first[1]);
        assert_eq!(embedder.inner().requested.load(Ordering::SeqCst), 3);

        let stats = embedder.cache_stats();
        assert_eq!(stats.cache_size, 3);
        assert_eq!(stats.misses, 3);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.model_name, "counting");
    }

    #[tokio::test]
    async fn test_labels_are_cached_verbatim() {
        let embedder = CachedEmbedder::new(CountingEmbedder {
            requested: AtomicUsize::new(0),
        });

        embedder.embed(&labels(&["React"])).await.unwrap();
        embedder.embed(&labels(&["react"])).await.unwrap();
        assert_eq!(embedder.cache_stats().cache_size, 2);
    }

    #[tokio::test]
    async fn test_failure_propagates_and_caches_nothing() {
        let embedder = CachedEmbedder::new(FailingEmbedder);
        let result = embedder.embed(&labels(&["react"])).await;
        assert!(matches!(result, Err(EmbeddingError::Unavailable(_))));
        assert_eq!(embedder.cache_stats().cache_size, 0);
    }

    #[tokio::test]
    async fn test_close_clears_cache() {
        let embedder = CachedEmbedder::new(CountingEmbedder {
            requested: AtomicUsize::new(0),
        });
        embedder.embed(&labels(&["react"])).await.unwrap();
        embedder.close().await;
        assert_eq!(embedder.cache_stats().cache_size, 0);
    }
}
