//! Audit progress reporting.
//!
//! Observers for [`appraisal_core::observer::AuditObserver`] that report
//! stage transitions, embedding progress, and section results while an
//! audit runs. Progress is emitted on **stderr** so stdout remains
//! parseable for scripts (`appraise audit report.pdf --format json > out.json`).

use std::io::Write;

use appraisal_core::error::{IndexError, ScoringError};
use appraisal_core::observer::{AuditObserver, AuditStage};
use appraisal_core::{AuditEvidence, AuditReport, SectionKey};

/// Human-friendly progress on stderr: "audit  embedding  120 / 1,234 chunks".
pub struct StderrProgress;

impl StderrProgress {
    fn emit(&self, line: String) {
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    }
}

impl AuditObserver for StderrProgress {
    fn stage(&self, stage: AuditStage) {
        let msg = match stage {
            AuditStage::Started => "starting",
            AuditStage::Extracted => "text ready",
            AuditStage::Indexed => "index built",
            AuditStage::IndexFailed => "index unavailable, scoring on document prefix",
            AuditStage::ScoredPolicy => "policy alignment scored",
            AuditStage::ScoredImplementation => "implementation readiness scored",
            AuditStage::Aggregated => "aggregated",
            AuditStage::Done => "done",
        };
        self.emit(format!("audit  {}\n", msg));
    }

    fn embedding_progress(&self, done: usize, total: usize, failed: usize) {
        // Every 10th chunk and the last one.
        if done % 10 != 0 && done != total {
            return;
        }
        let failed_note = if failed > 0 {
            format!("  ({} failed)", format_number(failed as u64))
        } else {
            String::new()
        };
        self.emit(format!(
            "audit  embedding  {} / {} chunks{}\n",
            format_number(done as u64),
            format_number(total as u64),
            failed_note
        ));
    }

    fn index_failed(&self, error: &IndexError) {
        self.emit(format!("audit  warning: {}\n", error));
    }

    fn section_scored(&self, key: SectionKey, evidence: &AuditEvidence, error: Option<&ScoringError>) {
        let line = match error {
            None => format!(
                "audit  {}  {} / {}\n",
                key,
                evidence.score(),
                evidence.max_score()
            ),
            Some(e) => format!("audit  {}  failed [{}]: {}\n", key, e.kind(), e),
        };
        self.emit(line);
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl JsonProgress {
    fn emit(&self, obj: serde_json::Value) {
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", line);
            let _ = err.flush();
        }
    }
}

impl AuditObserver for JsonProgress {
    fn stage(&self, stage: AuditStage) {
        self.emit(serde_json::json!({
            "event": "stage",
            "stage": stage.as_str(),
        }));
    }

    fn embedding_progress(&self, done: usize, total: usize, failed: usize) {
        self.emit(serde_json::json!({
            "event": "progress",
            "phase": "embedding",
            "n": done,
            "total": total,
            "failed": failed,
        }));
    }

    fn index_failed(&self, error: &IndexError) {
        self.emit(serde_json::json!({
            "event": "index_failed",
            "error": error.to_string(),
        }));
    }

    fn section_scored(&self, key: SectionKey, evidence: &AuditEvidence, error: Option<&ScoringError>) {
        self.emit(serde_json::json!({
            "event": "section",
            "section": key.as_str(),
            "score": evidence.score(),
            "max_score": evidence.max_score(),
            "error_kind": error.map(|e| e.kind()),
        }));
    }

    fn finished(&self, report: &AuditReport) {
        self.emit(serde_json::json!({
            "event": "finished",
            "total_score": report.total_score(),
            "rag_used": report.rag_used(),
            "elapsed_secs": report.elapsed().as_secs_f64(),
        }));
    }
}

/// No-op observer when progress is disabled.
pub struct NoProgress;

impl AuditObserver for NoProgress {}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parse a `--progress` value. `auto` resolves against the TTY.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "auto" => Ok(Self::default_for_tty()),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            "off" => Ok(ProgressMode::Off),
            other => Err(format!(
                "invalid progress mode '{}': expected auto, human, json, or off",
                other
            )),
        }
    }

    /// Build an observer for this mode.
    pub fn observer(&self) -> std::sync::Arc<dyn AuditObserver> {
        match self {
            ProgressMode::Off => std::sync::Arc::new(NoProgress),
            ProgressMode::Human => std::sync::Arc::new(StderrProgress),
            ProgressMode::Json => std::sync::Arc::new(JsonProgress),
        }
    }
}
