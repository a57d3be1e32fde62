//! Audit progress observation.
//!
//! The orchestrator reports every stage transition, embedding progress,
//! and section outcome to an [`AuditObserver`] passed in by the caller.
//! There is no global sink: whoever runs the audit decides where events
//! go (stderr, JSON lines, nowhere).

use serde::Serialize;

use crate::error::{IndexError, ScoringError};
use crate::models::{AuditEvidence, AuditReport, SectionKey};

/// Stages of one audit run, in order. `Indexed` and `IndexFailed` are
/// the two branches of the only fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStage {
    Started,
    Extracted,
    Indexed,
    IndexFailed,
    ScoredPolicy,
    ScoredImplementation,
    Aggregated,
    Done,
}

impl AuditStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStage::Started => "started",
            AuditStage::Extracted => "extracted",
            AuditStage::Indexed => "indexed",
            AuditStage::IndexFailed => "index_failed",
            AuditStage::ScoredPolicy => "scored_policy",
            AuditStage::ScoredImplementation => "scored_implementation",
            AuditStage::Aggregated => "aggregated",
            AuditStage::Done => "done",
        }
    }
}

/// Receives audit events. Every method defaults to a no-op.
pub trait AuditObserver: Send + Sync {
    /// The run entered `stage`.
    fn stage(&self, _stage: AuditStage) {}

    /// `done` of `total` chunks have been through the embedding provider.
    fn embedding_progress(&self, _done: usize, _total: usize, _failed: usize) {}

    /// Indexing failed and the run continues on the prefix fallback.
    fn index_failed(&self, _error: &IndexError) {}

    /// A section finished. `error` is set when the evidence is a failed one.
    fn section_scored(
        &self,
        _key: SectionKey,
        _evidence: &AuditEvidence,
        _error: Option<&ScoringError>,
    ) {
    }

    /// The run produced its report.
    fn finished(&self, _report: &AuditReport) {}
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl AuditObserver for NoopObserver {}
