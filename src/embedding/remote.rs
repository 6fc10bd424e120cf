//! Remote embedding APIs (OpenAI-compatible and Cohere)

use crate::config::{RemoteApiFormat, RemoteEmbeddingConfig};
use crate::embedding::{validate_embeddings, Embedder};
use crate::error::{EmbeddingError, Result, SkillMatcherError};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const COHERE_DEFAULT_INPUT_TYPE: &str = "search_document";

/// Embedder calling a hosted embedding API over HTTP.
///
/// Each call is independent. Requests larger than `max_batch_size` are sent as
/// sequential batches; the first failing batch fails the whole call.
pub struct RemoteEmbedder {
    http_client: reqwest::Client,
    api_format: RemoteApiFormat,
    base_url: String,
    model: String,
    api_key: String,
    dimensions: Option<usize>,
    input_type: Option<String>,
    max_batch_size: usize,
}

#[derive(Debug, Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Serialize)]
struct CohereEmbedRequest<'a> {
    model: &'a str,
    texts: &'a [String],
    input_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct CohereEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl RemoteEmbedder {
    pub fn builder() -> RemoteEmbedderBuilder {
        RemoteEmbedderBuilder::new()
    }

    /// Build from configuration, reading the API key from the configured
    /// environment variable.
    pub fn from_config(config: &RemoteEmbeddingConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            SkillMatcherError::Configuration(format!(
                "Environment variable {} is not set",
                config.api_key_env
            ))
        })?;

        let mut builder = Self::builder()
            .api_format(config.api_format)
            .base_url(&config.base_url)
            .model(&config.model)
            .api_key(api_key)
            .timeout_secs(config.timeout_secs)
            .max_batch_size(config.max_batch_size);
        if let Some(dims) = config.dimensions {
            builder = builder.dimensions(dims);
        }
        if let Some(input_type) = &config.input_type {
            builder = builder.input_type(input_type);
        }
        builder.build()
    }

    pub fn api_format(&self) -> RemoteApiFormat {
        self.api_format
    }

    async fn embed_batch(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        let embeddings = match self.api_format {
            RemoteApiFormat::OpenAi => {
                let request = OpenAiEmbeddingRequest {
                    model: &self.model,
                    input: texts,
                    dimensions: self.dimensions,
                };
                let body = self.post("v1/embeddings", &request).await?;
                let response: OpenAiEmbeddingResponse = serde_json::from_str(&body)
                    .map_err(|e| EmbeddingError::Malformed(format!("Invalid embedding response: {}", e)))?;
                Self::order_by_index(response.data, texts.len())?
            }
            RemoteApiFormat::Cohere => {
                let request = CohereEmbedRequest {
                    model: &self.model,
                    texts,
                    input_type: self.input_type.as_deref().unwrap_or(COHERE_DEFAULT_INPUT_TYPE),
                };
                let body = self.post("v1/embed", &request).await?;
                let response: CohereEmbedResponse = serde_json::from_str(&body)
                    .map_err(|e| EmbeddingError::Malformed(format!("Invalid embedding response: {}", e)))?;
                response.embeddings
            }
        };

        validate_embeddings(texts.len(), &embeddings)?;
        Ok(embeddings)
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, request: &T) -> std::result::Result<String, EmbeddingError> {
        let endpoint = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let response = self
            .http_client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| EmbeddingError::Unavailable(format!("Embedding request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EmbeddingError::Unavailable(format!("Failed to read response: {}", e)))?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(EmbeddingError::RateLimited(body));
        }
        if !status.is_success() {
            return Err(EmbeddingError::Provider {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(body)
    }

    fn order_by_index(
        mut data: Vec<OpenAiEmbedding>,
        expected: usize,
    ) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        data.sort_by_key(|e| e.index);
        for (position, item) in data.iter().enumerate() {
            if item.index != position {
                return Err(EmbeddingError::Malformed(format!(
                    "embedding indices are not contiguous: found {} at position {} of {}",
                    item.index, position, expected
                )));
            }
        }
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn embed(&self, labels: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        if labels.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(labels.len());
        for chunk in labels.chunks(self.max_batch_size) {
            all_embeddings.extend(self.embed_batch(chunk).await?);
        }

        // Batches must agree with each other, not only internally
        validate_embeddings(labels.len(), &all_embeddings)?;
        debug!("Embedded {} labels remotely with {}", labels.len(), self.model);
        Ok(all_embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

pub struct RemoteEmbedderBuilder {
    api_format: RemoteApiFormat,
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    dimensions: Option<usize>,
    input_type: Option<String>,
    max_batch_size: usize,
    timeout_secs: u64,
}

impl RemoteEmbedderBuilder {
    pub fn new() -> Self {
        Self {
            api_format: RemoteApiFormat::OpenAi,
            model: None,
            api_key: None,
            base_url: None,
            dimensions: None,
            input_type: None,
            max_batch_size: 96,
            timeout_secs: 30,
        }
    }

    pub fn api_format(mut self, api_format: RemoteApiFormat) -> Self {
        self.api_format = api_format;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn input_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = Some(input_type.into());
        self
    }

    pub fn max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn build(self) -> Result<RemoteEmbedder> {
        let (default_url, default_model) = match self.api_format {
            RemoteApiFormat::OpenAi => ("https://api.openai.com", "text-embedding-3-small"),
            RemoteApiFormat::Cohere => ("https://api.cohere.com", "embed-english-v3.0"),
        };

        let api_key = self
            .api_key
            .ok_or_else(|| SkillMatcherError::Configuration("API key required".to_string()))?;
        if self.max_batch_size == 0 {
            return Err(SkillMatcherError::Configuration(
                "max_batch_size must be greater than zero".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| SkillMatcherError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(RemoteEmbedder {
            http_client,
            api_format: self.api_format,
            base_url: self.base_url.unwrap_or_else(|| default_url.to_string()),
            model: self.model.unwrap_or_else(|| default_model.to_string()),
            api_key,
            dimensions: self.dimensions,
            input_type: self.input_type,
            max_batch_size: self.max_batch_size,
        })
    }
}

impl Default for RemoteEmbedderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
