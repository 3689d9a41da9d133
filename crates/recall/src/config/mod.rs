use serde::Deserialize;

/// Main configuration structure for Recall
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// RPC server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Hybrid search tuning
    #[serde(default)]
    pub search: SearchConfig,
    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// RPC server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:7077")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Per-request timeout in seconds, enforced by the HTTP layer
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:7077".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Hybrid search configuration.
///
/// Fusion is a weighted sum of per-source scores normalized into [0, 1];
/// the defaults weight all three sources equally. The original service's
/// tuning is unknown, so these stay configurable rather than guessed.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Weight of the BM25 lexical source in fusion
    #[serde(default = "default_source_weight")]
    pub lexical_weight: f32,
    /// Weight of the vector similarity source in fusion
    #[serde(default = "default_source_weight")]
    pub vector_weight: f32,
    /// Weight of the fuzzy match source in fusion
    #[serde(default = "default_source_weight")]
    pub fuzzy_weight: f32,
    /// Per-source candidate multiplier before fusion (default: 3)
    #[serde(default = "default_oversample")]
    pub oversample: usize,
    /// BM25 term frequency saturation
    #[serde(default = "default_bm25_k1")]
    pub bm25_k1: f32,
    /// BM25 document length normalization
    #[serde(default = "default_bm25_b")]
    pub bm25_b: f32,
    /// Enable the per-tenant search result cache
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    /// Maximum cached result pages
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            lexical_weight: default_source_weight(),
            vector_weight: default_source_weight(),
            fuzzy_weight: default_source_weight(),
            oversample: default_oversample(),
            bm25_k1: default_bm25_k1(),
            bm25_b: default_bm25_b(),
            cache_enabled: default_cache_enabled(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_source_weight() -> f32 {
    1.0
}

fn default_oversample() -> usize {
    3
}

fn default_bm25_k1() -> f32 {
    1.2
}

fn default_bm25_b() -> f32 {
    0.75
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    1024
}

/// Embedding provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider: "hash" (deterministic, local) or "remote" (OpenAI-compatible)
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    /// Model name sent to the remote provider
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Base URL of the remote embeddings API
    #[serde(default)]
    pub api_url: Option<String>,
    /// Environment variable holding the API key, if the endpoint needs one
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Embedding dimension
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
    /// Remote request timeout in seconds
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            api_url: None,
            api_key_env: None,
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

fn default_embedding_provider() -> String {
    "hash".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimension() -> usize {
    384
}

fn default_embedding_timeout_secs() -> u64 {
    30
}
