//! # Appraisal Harness Core
//!
//! The retrieval-augmented scoring pipeline behind Appraisal Harness:
//! chunking, embedding contract, in-memory vector store, context assembly,
//! rubric prompts, response validation, and audit orchestration.
//!
//! This crate performs no network or filesystem I/O. Embedding and
//! generation backends are supplied by the application as trait objects
//! ([`embedding::EmbeddingProvider`], [`generation::Generator`]).
//!
//! ```text
//! text ──▶ chunk ──▶ VectorStore (embed × N) ──▶ context ──▶ prompt
//!                                                              │
//!               AuditReport ◀── aggregate ◀── AuditEvidence ◀──┘ (× 2 sections)
//! ```

pub mod audit;
pub mod chunk;
pub mod context;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod models;
pub mod observer;
pub mod prompt;
pub mod rubric;
pub mod scorer;
pub mod store;

pub use audit::{AuditSettings, Auditor};
pub use error::{AuditError, ConfigError, EvidenceError, IndexError, RetrievalError, ScoringError};
pub use models::{AuditEvidence, AuditReport, EvidenceFields, SectionKey, SectionResult, SubScore};
