//! Embedding collaborators
//!
//! The engine treats embedding generation as an external concern behind the
//! `Embedder` trait. Two providers ship by default: a deterministic local
//! token-hash embedder (no network, stable across runs, used for tests and
//! standalone deployments) and a remote OpenAI-compatible HTTP embedder.

use std::collections::hash_map::DefaultHasher;
use std::env;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EmbeddingConfig;
use crate::error::{RecallError, Result};
use crate::index::tokenize;

/// Generates one embedding per text. Implementations must be deterministic
/// for identical input within a process lifetime.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Output vector dimension
    fn dimension(&self) -> usize;
}

/// Build the configured embedding provider
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.provider.as_str() {
        "hash" => Ok(Box::new(HashEmbedder::new(config.dimension))),
        "remote" => Ok(Box::new(RemoteEmbedder::new(config)?)),
        other => Err(RecallError::Config(format!(
            "unknown embedding provider: {other:?} (expected \"hash\" or \"remote\")"
        ))),
    }
}

/// Deterministic token-hash embedder.
///
/// Each token hashes to a pseudo-random unit-scale vector; the text embedding
/// is the L2-normalized token sum, so texts sharing tokens land close in
/// cosine space.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn token_vector(&self, token: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        let seed = hasher.finish();

        (0..self.dimension)
            .map(|i| {
                let x = seed
                    .wrapping_mul(i as u64 + 1)
                    .wrapping_add(0x9e3779b97f4a7c15);
                let normalized = (x as f32) / (u64::MAX as f32);
                (normalized * 2.0) - 1.0
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let tokens = tokenize(text);
        let mut sum = vec![0.0_f32; self.dimension];

        if tokens.is_empty() {
            return Ok(sum);
        }

        for token in &tokens {
            for (slot, value) in sum.iter_mut().zip(self.token_vector(token)) {
                *slot += value;
            }
        }

        let norm = sum.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut sum {
                *value /= norm;
            }
        }
        Ok(sum)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// OpenAI-compatible embeddings request
#[derive(Debug, Serialize)]
struct EmbeddingsRequest {
    model: String,
    input: String,
}

/// OpenAI-compatible embeddings response
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Remote embedder over an OpenAI-compatible `/embeddings` endpoint.
///
/// The core never retries; failures surface as `Embedding` errors and any
/// retry policy belongs to the transport around the service.
#[derive(Debug)]
pub struct RemoteEmbedder {
    client: Client,
    api_url: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
}

impl RemoteEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_url = config.api_url.clone().ok_or_else(|| {
            RecallError::Config("embedding.api_url is required for the remote provider".to_string())
        })?;

        let api_key = match config.api_key_env.as_deref() {
            Some(var) => Some(env::var(var).map_err(|_| {
                RecallError::Config(format!("API key env var '{var}' not set"))
            })?),
            None => None,
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RecallError::Embedding(format!("Failed to create HTTP client: {e}")))?;

        info!(
            "RemoteEmbedder initialized with model: {}, api_url: {}",
            config.model, api_url
        );

        Ok(Self {
            client,
            api_url,
            model: config.model.clone(),
            api_key,
            dimension: config.dimension,
        })
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingsRequest {
            model: self.model.clone(),
            input: text.to_string(),
        };

        let url = format!("{}/embeddings", self.api_url.trim_end_matches('/'));
        debug!("Requesting embedding from: {}", url);

        let mut builder = self.client.post(&url).json(&request);
        if let Some(ref api_key) = self.api_key {
            builder = builder.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RecallError::Embedding(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RecallError::Embedding(format!(
                "API returned {status}: {error_text}"
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| RecallError::Embedding(format!("Invalid response body: {e}")))?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| RecallError::Embedding("Response contained no embedding".to_string()))?;

        if embedding.len() != self.dimension {
            return Err(RecallError::Embedding(format!(
                "Expected dimension {}, got {}",
                self.dimension,
                embedding.len()
            )));
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::vector::cosine_similarity;

    #[tokio::test]
    async fn test_hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::new(384);
        let a = embedder.embed("hello world").await.unwrap();
        let b = embedder.embed("hello world").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_hash_embedder_dimension() {
        let embedder = HashEmbedder::new(128);
        let embedding = embedder.embed("test").await.unwrap();
        assert_eq!(embedding.len(), 128);
        assert_eq!(embedder.dimension(), 128);
    }

    #[tokio::test]
    async fn test_hash_embedder_is_unit_length() {
        let embedder = HashEmbedder::new(384);
        let embedding = embedder.embed("some text here").await.unwrap();
        let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_hash_embedder_empty_text_is_zero_vector() {
        let embedder = HashEmbedder::new(16);
        let embedding = embedder.embed("").await.unwrap();
        assert!(embedding.iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn test_shared_tokens_raise_similarity() {
        let embedder = HashEmbedder::new(384);
        let base = embedder.embed("rust memory store").await.unwrap();
        let near = embedder.embed("rust memory system").await.unwrap();
        let far = embedder.embed("garden watering schedule").await.unwrap();

        let near_sim = cosine_similarity(&base, &near);
        let far_sim = cosine_similarity(&base, &far);
        assert!(
            near_sim > far_sim,
            "overlapping tokens should score higher: {near_sim} vs {far_sim}"
        );
    }

    #[test]
    fn test_build_embedder_rejects_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "quantum".to_string(),
            ..Default::default()
        };
        assert!(build_embedder(&config).is_err());
    }

    #[test]
    fn test_remote_embedder_requires_api_url() {
        let config = EmbeddingConfig {
            provider: "remote".to_string(),
            api_url: None,
            ..Default::default()
        };
        assert!(RemoteEmbedder::new(&config).is_err());
    }
}
