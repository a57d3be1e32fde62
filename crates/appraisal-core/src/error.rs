//! Error taxonomy for the audit pipeline.
//!
//! Only [`ConfigError`] and [`AuditError`] ever reach the caller of
//! [`Auditor::run`](crate::audit::Auditor::run). The rest are contained
//! by the component that raised them and turned into a degraded result:
//! a positional search, a prefix context, or a zero-scored evidence.

use thiserror::Error;

/// Invalid pipeline configuration. Fatal: the pipeline refuses to start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("chunk_size must be > 0")]
    ZeroChunkSize,

    #[error("chunk overlap ({overlap}) must be smaller than chunk_size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },

    #[error("retrieval.{0} must be >= 1")]
    ZeroRetrievalBound(&'static str),

    #[error("embedding dimension must be > 0")]
    ZeroDimension,

    #[error("rubric section '{section}' has no items")]
    EmptySection { section: String },

    #[error("rubric section '{section}': item maxima sum to {items_total}, expected {max_score}")]
    SectionTotalMismatch {
        section: String,
        items_total: i64,
        max_score: i64,
    },

    #[error("rubric section maxima sum to {0}, expected 100")]
    RubricTotal(i64),
}

/// Evidence would be constructed outside its valid range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvidenceError {
    #[error("score {score} is outside 0..={max_score}")]
    ScoreOutOfRange { score: i64, max_score: i64 },

    #[error("percentage {0} is outside 0..=100")]
    PercentageOutOfRange(f64),
}

/// Building the vector index failed; the audit continues on a text prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("document text produced no chunks")]
    NoChunks,

    #[error("embedding failed for all {0} chunks")]
    AllEmbeddingsFailed(usize),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A ranked search could not be served; the store answers positionally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    #[error("query embedding failed: {0}")]
    QueryEmbedding(String),

    #[error("query embedding has {got} dimensions, expected {expected}")]
    Dimension { got: usize, expected: usize },

    #[error("query embedding contains non-finite values")]
    NonFinite,
}

/// Scoring one rubric section failed. Captured into a failed evidence.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("generation failed: {0}")]
    Generation(String),

    #[error("response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("response is missing required key '{key}'")]
    MissingKey { key: String },

    #[error("response field '{key}' is malformed: {reason}")]
    Malformed { key: String, reason: String },

    #[error(transparent)]
    Validation(#[from] EvidenceError),
}

impl ScoringError {
    /// Stable diagnostic label for the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoringError::Generation(_) => "generation",
            ScoringError::Parse(_) => "parse",
            ScoringError::NotAnObject
            | ScoringError::MissingKey { .. }
            | ScoringError::Malformed { .. } => "schema",
            ScoringError::Validation(_) => "validation",
        }
    }
}

/// Hard failures of an audit run.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("document contains no text to audit")]
    EmptyDocument,

    #[error(transparent)]
    Config(#[from] ConfigError),
}
