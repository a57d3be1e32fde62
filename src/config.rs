//! TOML configuration.
//!
//! Every table is optional; a missing key takes the default documented on
//! its `default_*` function. [`load_config`] validates the whole file up
//! front and fails on the first bad value, naming its key.
//!
//! ```toml
//! [chunking]
//! chunk_size = 1500
//! overlap = 200
//!
//! [embedding]
//! provider = "gemini"
//! model = "text-embedding-004"
//! dims = 768
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use appraisal_core::chunk::ChunkingParams;
use appraisal_core::context::RetrievalParams;
use appraisal_core::rubric::{Rubric, RubricItem, RubricSection};
use appraisal_core::store::RateLimit;
use appraisal_core::AuditSettings;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub grading: GradingConfig,
    #[serde(default)]
    pub rubric: RubricConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1500
}
fn default_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

fn default_top_k() -> usize {
    15
}
fn default_max_context_chars() -> usize {
    35_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    /// Base URL override. Each provider has its own default.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dims: default_dims(),
            url: None,
            max_retries: default_max_retries(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

fn default_embedding_provider() -> String {
    "gemini".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-004".to_string()
}
fn default_dims() -> usize {
    768
}
fn default_max_retries() -> u32 {
    3
}
fn default_embedding_timeout() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            url: None,
            temperature: None,
            max_retries: default_max_retries(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

fn default_generation_provider() -> String {
    "gemini".to_string()
}
fn default_generation_model() -> String {
    "gemini-2.5-pro".to_string()
}
fn default_generation_timeout() -> u64 {
    180
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    #[serde(default = "default_rate_batch_size")]
    pub batch_size: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            batch_delay_ms: default_batch_delay_ms(),
            batch_size: default_rate_batch_size(),
        }
    }
}

fn default_delay_ms() -> u64 {
    300
}
fn default_batch_delay_ms() -> u64 {
    1000
}
fn default_rate_batch_size() -> usize {
    10
}

/// Grade label thresholds on the 0–100 total.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct GradingConfig {
    #[serde(default = "default_excellent")]
    pub excellent: i64,
    #[serde(default = "default_good")]
    pub good: i64,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            excellent: default_excellent(),
            good: default_good(),
        }
    }
}

fn default_excellent() -> i64 {
    80
}
fn default_good() -> i64 {
    60
}

impl GradingConfig {
    pub fn grade(&self, total: i64) -> &'static str {
        if total >= self.excellent {
            "Excellent"
        } else if total >= self.good {
            "Good"
        } else {
            "Needs improvement"
        }
    }
}

/// Optional replacements for the built-in rubric sections.
///
/// `reviewer` and `response_language` apply to both sections unless a
/// section sets its own.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RubricConfig {
    #[serde(default)]
    pub reviewer: Option<String>,
    #[serde(default)]
    pub response_language: Option<String>,
    #[serde(default)]
    pub policy: Option<RubricSectionConfig>,
    #[serde(default)]
    pub implementation: Option<RubricSectionConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RubricSectionConfig {
    pub title: Option<String>,
    pub max_score: Option<i64>,
    pub query: Option<String>,
    pub items: Option<Vec<RubricItemConfig>>,
    pub reviewer: Option<String>,
    pub response_language: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RubricItemConfig {
    pub name: String,
    pub max_score: i64,
}

impl RubricSectionConfig {
    /// Overlay the configured fields onto `base`.
    fn apply(&self, mut base: RubricSection) -> RubricSection {
        if let Some(title) = &self.title {
            base.title = title.clone();
        }
        if let Some(max) = self.max_score {
            base.max_score = max;
        }
        if let Some(query) = &self.query {
            base.query = query.clone();
        }
        if let Some(items) = &self.items {
            base.items = items
                .iter()
                .map(|i| RubricItem {
                    name: i.name.clone(),
                    max_score: i.max_score,
                })
                .collect();
        }
        if let Some(reviewer) = &self.reviewer {
            base.reviewer = reviewer.clone();
        }
        if let Some(language) = &self.response_language {
            base.response_language = Some(language.clone());
        }
        base
    }
}

impl Config {
    pub fn rubric(&self) -> Rubric {
        let mut rubric = Rubric::default();
        for section in [&mut rubric.policy, &mut rubric.implementation] {
            if let Some(reviewer) = &self.rubric.reviewer {
                section.reviewer = reviewer.clone();
            }
            if let Some(language) = &self.rubric.response_language {
                section.response_language = Some(language.clone());
            }
        }
        if let Some(policy) = &self.rubric.policy {
            rubric.policy = policy.apply(rubric.policy);
        }
        if let Some(implementation) = &self.rubric.implementation {
            rubric.implementation = implementation.apply(rubric.implementation);
        }
        rubric
    }

    /// Pipeline settings for [`appraisal_core::Auditor`].
    pub fn audit_settings(&self) -> AuditSettings {
        AuditSettings {
            chunking: ChunkingParams {
                chunk_size: self.chunking.chunk_size,
                overlap: self.chunking.overlap,
            },
            retrieval: RetrievalParams {
                top_k: self.retrieval.top_k,
                max_context_chars: self.retrieval.max_context_chars,
            },
            rate_limit: RateLimit {
                delay: Duration::from_millis(self.rate_limit.delay_ms),
                batch_delay: Duration::from_millis(self.rate_limit.batch_delay_ms),
                batch_size: self.rate_limit.batch_size,
            },
            rubric: self.rubric(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to validated defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        return load_config(path);
    }
    tracing::debug!(path = %path.display(), "config file not found, using defaults");
    let config = Config::default();
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Chunking
    if config.chunking.chunk_size == 0 {
        bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.overlap >= config.chunking.chunk_size {
        bail!(
            "chunking.overlap ({}) must be smaller than chunking.chunk_size ({})",
            config.chunking.overlap,
            config.chunking.chunk_size
        );
    }

    // Retrieval
    if config.retrieval.top_k < 1 {
        bail!("retrieval.top_k must be >= 1");
    }
    if config.retrieval.max_context_chars < 1 {
        bail!("retrieval.max_context_chars must be >= 1");
    }

    // Embedding
    match config.embedding.provider.as_str() {
        "gemini" | "openai" | "ollama" | "disabled" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be gemini, openai, ollama, or disabled.",
            other
        ),
    }
    if config.embedding.is_enabled() && config.embedding.dims == 0 {
        bail!(
            "embedding.dims must be > 0 when provider is '{}'",
            config.embedding.provider
        );
    }

    // Generation
    match config.generation.provider.as_str() {
        "gemini" | "openai" | "ollama" => {}
        other => bail!(
            "Unknown generation provider: '{}'. Must be gemini, openai, or ollama.",
            other
        ),
    }
    if let Some(t) = config.generation.temperature {
        if !(0.0..=2.0).contains(&t) {
            bail!("generation.temperature must be in [0.0, 2.0]");
        }
    }

    // Rate limit
    if config.rate_limit.batch_size < 1 {
        bail!("rate_limit.batch_size must be >= 1");
    }

    // Grading
    let g = &config.grading;
    if !(0..=g.excellent).contains(&g.good) || g.excellent > 100 {
        bail!(
            "grading thresholds must satisfy 0 <= good ({}) <= excellent ({}) <= 100",
            g.good,
            g.excellent
        );
    }

    // Rubric
    config
        .rubric()
        .validate()
        .map_err(|e| anyhow::anyhow!("rubric: {}", e))?;

    Ok(())
}
