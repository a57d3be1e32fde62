//! Report rendering: human-readable text and JSON.
//!
//! Both renderings carry every field of [`AuditReport`]. The JSON form is
//! wrapped in an [`AuditRecord`] that also identifies the audited
//! document by path and SHA-256, so saved results can be matched back to
//! the exact file they came from.

use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use appraisal_core::{AuditEvidence, AuditReport};

use crate::config::GradingConfig;

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

const DISCLAIMER: &str = "This result is an AI-generated reference for reviewers. \
It is not an official appraisal decision.";

/// Identity of the audited document.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocumentInfo {
    pub path: String,
    pub sha256: String,
    pub chars: usize,
    pub pages_total: usize,
    pub pages_failed: usize,
}

impl DocumentInfo {
    pub fn new(path: &Path, raw: &[u8], chars: usize, pages_total: usize, pages_failed: usize) -> Self {
        Self {
            path: path.display().to_string(),
            sha256: sha256_hex(raw),
            chars,
            pages_total,
            pages_failed,
        }
    }
}

/// A saved audit: the report plus where and when it was produced.
#[derive(Debug, Serialize)]
pub struct AuditRecord<'a> {
    pub generated_at: DateTime<Utc>,
    pub embedding_model: &'a str,
    pub generation_model: &'a str,
    pub document: &'a DocumentInfo,
    pub report: &'a AuditReport,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Pretty JSON of the report alone.
pub fn render_json(report: &AuditReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Pretty JSON of a full record.
pub fn render_record_json(record: &AuditRecord<'_>) -> Result<String> {
    Ok(serde_json::to_string_pretty(record)?)
}

/// Human-readable report, timestamped now.
pub fn render_text(report: &AuditReport, grading: &GradingConfig) -> String {
    render_text_at(report, grading, Local::now())
}

pub fn render_text_at(
    report: &AuditReport,
    grading: &GradingConfig,
    generated_at: DateTime<Local>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Appraisal Report Audit");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "Elapsed:   {:.1}s", report.elapsed().as_secs_f64());
    match (report.rag_used(), report.index_stats()) {
        (true, Some(stats)) => {
            let _ = writeln!(
                out,
                "RAG used:  yes ({} chunks indexed, {} without embedding)",
                stats.chunk_count, stats.zero_vector_count
            );
        }
        (true, None) => {
            let _ = writeln!(out, "RAG used:  yes");
        }
        (false, _) => {
            let _ = writeln!(
                out,
                "RAG used:  no ({})",
                report.fallback_reason().unwrap_or("document prefix used")
            );
        }
    }
    out.push('\n');

    let total = report.total_score();
    let _ = writeln!(
        out,
        "TOTAL: {} / {} ({})",
        total,
        report.max_score(),
        grading.grade(total)
    );

    for (i, (_, section)) in report.sections().enumerate() {
        out.push('\n');
        let e = &section.evidence;
        let _ = writeln!(out, "{}", THIN_RULE);
        let _ = writeln!(
            out,
            "{}. {}: {} / {} ({:.1}%)",
            i + 1,
            section.title,
            e.score(),
            e.max_score(),
            e.percentage()
        );
        let _ = writeln!(out, "{}", THIN_RULE);
        render_evidence(&mut out, e);
    }

    out.push('\n');
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "{}", DISCLAIMER);
    out
}

fn render_evidence(out: &mut String, e: &AuditEvidence) {
    if !e.detailed_scores().is_empty() {
        let _ = writeln!(out, "Items:");
        for item in e.detailed_scores() {
            let _ = writeln!(out, "  - {}: {} / {}", item.name, item.score, item.max_score);
            if !item.justification.is_empty() {
                let _ = writeln!(out, "      {}", item.justification);
            }
        }
    }
    render_list(out, "Strengths", e.strengths());
    render_list(out, "Weaknesses", e.weaknesses());
    render_list(out, "Recommendations", e.recommendations());
    if !e.reasoning().is_empty() {
        let _ = writeln!(out, "Reasoning:");
        for line in e.reasoning().lines() {
            let _ = writeln!(out, "  {}", line);
        }
    }
}

fn render_list(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}:", heading);
    for item in items {
        let _ = writeln!(out, "  - {}", item);
    }
}
