//! Embedding provider adapters.
//!
//! HTTP implementations of [`appraisal_core::embedding::EmbeddingProvider`]:
//! - **[`GeminiEmbedder`]**: `models/{model}:embedContent` with a retrieval task type.
//! - **[`OpenAIEmbedder`]**: `POST /v1/embeddings`.
//! - **[`OllamaEmbedder`]**: a local Ollama instance's `/api/embed` endpoint.
//! - **[`DisabledEmbedder`]**: always fails, which sends audits down the prefix path.
//!
//! Every adapter normalizes its provider's response with
//! [`parse_embedding`] so the store only ever sees a flat `Vec<f32>`.
//!
//! # Provider Selection
//!
//! ```rust,no_run
//! # use appraisal_harness::config::EmbeddingConfig;
//! # use appraisal_harness::embedding::create_provider;
//! let mut config = EmbeddingConfig::default();
//! config.provider = "disabled".to_string();
//! let provider = create_provider(&config).unwrap();
//! assert_eq!(provider.model_name(), "disabled");
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use appraisal_core::embedding::{EmbedMode, EmbeddingProvider};

use crate::config::EmbeddingConfig;
use crate::http::{client, require_env, send_json_with_retry};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

// ============ Disabled Provider ============

/// Provider used when `embedding.provider = "disabled"`.
pub struct DisabledEmbedder {
    dims: usize,
}

#[async_trait]
impl EmbeddingProvider for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, _text: &str, _mode: EmbedMode) -> Result<Vec<f32>> {
        bail!("Embedding provider is disabled")
    }
}

// ============ Gemini Provider ============

/// Embedding provider using the Gemini API. Requires `GEMINI_API_KEY`.
pub struct GeminiEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dims: usize,
    max_retries: u32,
}

impl GeminiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = require_env("GEMINI_API_KEY")?;
        Ok(Self {
            client: client(config.timeout_secs)?,
            api_key,
            base_url: config
                .url
                .clone()
                .unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
            model: config.model.clone(),
            dims: config.dims,
            max_retries: config.max_retries,
        })
    }
}

fn gemini_task_type(mode: EmbedMode) -> &'static str {
    match mode {
        EmbedMode::Document => "RETRIEVAL_DOCUMENT",
        EmbedMode::Query => "RETRIEVAL_QUERY",
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, text: &str, mode: EmbedMode) -> Result<Vec<f32>> {
        let url = format!(
            "{}/models/{}:embedContent",
            self.base_url, self.model
        );
        let body = json!({
            "model": format!("models/{}", self.model),
            "content": { "parts": [{ "text": text }] },
            "taskType": gemini_task_type(mode),
        });
        let json = send_json_with_retry("Gemini", self.max_retries, || {
            self.client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
        })
        .await?;
        parse_embedding(&json)
    }
}

// ============ OpenAI Provider ============

/// Embedding provider using the OpenAI API. Requires `OPENAI_API_KEY`.
///
/// The OpenAI endpoint has no document/query distinction; `mode` is ignored.
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dims: usize,
    max_retries: u32,
}

impl OpenAIEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = require_env("OPENAI_API_KEY")?;
        Ok(Self {
            client: client(config.timeout_secs)?,
            api_key,
            base_url: config
                .url
                .clone()
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            model: config.model.clone(),
            dims: config.dims,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, text: &str, _mode: EmbedMode) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": text,
        });
        let json = send_json_with_retry("OpenAI", self.max_retries, || {
            self.client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&body)
        })
        .await?;
        parse_embedding(&json)
    }
}

// ============ Ollama Provider ============

/// Embedding provider using a local Ollama instance.
///
/// Requires Ollama to be running with the configured model pulled
/// (e.g. `ollama pull nomic-embed-text`).
pub struct OllamaEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    dims: usize,
    max_retries: u32,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            client: client(config.timeout_secs)?,
            url: config
                .url
                .clone()
                .unwrap_or_else(|| OLLAMA_BASE_URL.to_string()),
            model: config.model.clone(),
            dims: config.dims,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, text: &str, _mode: EmbedMode) -> Result<Vec<f32>> {
        let endpoint = format!("{}/api/embed", self.url);
        let body = json!({
            "model": self.model,
            "input": text,
        });
        let json = send_json_with_retry("Ollama", self.max_retries, || {
            self.client.post(&endpoint).json(&body)
        })
        .await?;
        parse_embedding(&json)
    }
}

// ============ Response normalization ============

/// Extract one embedding vector from any of the supported response shapes:
///
/// - `{"embedding": {"values": [...]}}` (Gemini)
/// - `{"embedding": [...]}`
/// - `{"data": [{"embedding": [...]}]}` (OpenAI)
/// - `{"embeddings": [[...]]}` (Ollama)
/// - a bare `[...]`
///
/// Anything else, including non-numeric elements or an empty vector, is
/// an error.
pub fn parse_embedding(json: &Value) -> Result<Vec<f32>> {
    let values = match json {
        Value::Array(_) => json,
        Value::Object(obj) => {
            if let Some(embedding) = obj.get("embedding") {
                embedding.get("values").unwrap_or(embedding)
            } else if let Some(first) = obj
                .get("data")
                .and_then(|d| d.as_array())
                .and_then(|d| d.first())
            {
                first
                    .get("embedding")
                    .ok_or_else(|| anyhow::anyhow!("Invalid embedding response: data[0] has no embedding"))?
            } else if let Some(first) = obj
                .get("embeddings")
                .and_then(|e| e.as_array())
                .and_then(|e| e.first())
            {
                first
            } else {
                bail!("Invalid embedding response: no embedding field");
            }
        }
        _ => bail!("Invalid embedding response: expected an object or array"),
    };

    let array = values
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("Invalid embedding response: embedding is not an array"))?;
    if array.is_empty() {
        bail!("Invalid embedding response: empty embedding");
    }
    array
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| anyhow::anyhow!("Invalid embedding response: non-numeric element"))
        })
        .collect()
}

/// Create the configured [`EmbeddingProvider`].
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"gemini"` | [`GeminiEmbedder`] |
/// | `"openai"` | [`OpenAIEmbedder`] |
/// | `"ollama"` | [`OllamaEmbedder`] |
/// | `"disabled"` | [`DisabledEmbedder`] |
///
/// # Errors
///
/// Unknown provider names, or a missing API key for a hosted provider.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiEmbedder::new(config)?)),
        "openai" => Ok(Arc::new(OpenAIEmbedder::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(config)?)),
        "disabled" => Ok(Arc::new(DisabledEmbedder {
            dims: config.dims.max(1),
        })),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gemini_shape() {
        let v = parse_embedding(&json!({"embedding": {"values": [0.5, -1.0, 2]}})).unwrap();
        assert_eq!(v, vec![0.5, -1.0, 2.0]);
    }

    #[test]
    fn test_parse_openai_and_ollama_shapes() {
        let openai = json!({"data": [{"index": 0, "embedding": [1.0, 2.0]}]});
        assert_eq!(parse_embedding(&openai).unwrap(), vec![1.0, 2.0]);
        let ollama = json!({"model": "nomic", "embeddings": [[3.0, 4.0]]});
        assert_eq!(parse_embedding(&ollama).unwrap(), vec![3.0, 4.0]);
        assert_eq!(parse_embedding(&json!([7.0])).unwrap(), vec![7.0]);
        assert_eq!(parse_embedding(&json!({"embedding": [1]})).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_embedding(&json!({"error": "quota"})).is_err());
        assert!(parse_embedding(&json!({"embedding": {"values": "x"}})).is_err());
        assert!(parse_embedding(&json!({"embedding": [1.0, "two"]})).is_err());
        assert!(parse_embedding(&json!({"embedding": []})).is_err());
        assert!(parse_embedding(&json!("vector")).is_err());
    }

    #[tokio::test]
    async fn test_disabled_always_fails() {
        let mut config = EmbeddingConfig::default();
        config.provider = "disabled".to_string();
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.dims(), 768);
        assert!(provider.embed("text", EmbedMode::Document).await.is_err());
    }

    #[test]
    fn test_unknown_provider() {
        let mut config = EmbeddingConfig::default();
        config.provider = "cohere".to_string();
        assert!(create_provider(&config).is_err());
    }

    #[test]
    fn test_task_types() {
        assert_eq!(gemini_task_type(EmbedMode::Document), "RETRIEVAL_DOCUMENT");
        assert_eq!(gemini_task_type(EmbedMode::Query), "RETRIEVAL_QUERY");
    }
}
