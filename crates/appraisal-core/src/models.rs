//! Evidence and report types produced by an audit.
//!
//! [`AuditEvidence`] can only exist in a valid state: its constructor
//! (and its `Deserialize` impl, which goes through the same check)
//! rejects an out-of-range score or percentage with [`EvidenceError`].

use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::EvidenceError;
use crate::store::StoreStats;

/// The two rubric axes, in scoring order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    PolicyAlignment,
    ImplementationReadiness,
}

impl SectionKey {
    pub const ALL: [SectionKey; 2] = [SectionKey::PolicyAlignment, SectionKey::ImplementationReadiness];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKey::PolicyAlignment => "policy_alignment",
            SectionKey::ImplementationReadiness => "implementation_readiness",
        }
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score for one rubric sub-item, as reported by the model.
///
/// Serialized with the model-facing names (`item`, `reason`); the
/// descriptive names are accepted on input as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScore {
    #[serde(rename = "item", alias = "name")]
    pub name: String,
    #[serde(deserialize_with = "deserialize_whole_number")]
    pub score: i64,
    #[serde(default, deserialize_with = "deserialize_whole_number")]
    pub max_score: i64,
    #[serde(rename = "reason", alias = "justification", default)]
    pub justification: String,
}

/// Integer value of `n`, accepting floats with no fractional part
/// (`25.0`) and rejecting anything else (`25.5`).
pub fn whole_number(n: &serde_json::Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(f as i64),
        _ => None,
    }
}

fn deserialize_whole_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let n = serde_json::Number::deserialize(deserializer)?;
    whole_number(&n)
        .ok_or_else(|| serde::de::Error::custom(format!("expected an integer, got {}", n)))
}

/// Plain field bag for building or exporting an [`AuditEvidence`].
///
/// Converting into `AuditEvidence` validates; converting back never fails.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvidenceFields {
    pub score: i64,
    pub max_score: i64,
    pub percentage: f64,
    #[serde(default)]
    pub detailed_scores: Vec<SubScore>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Validated result of scoring one rubric section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EvidenceFields", into = "EvidenceFields")]
pub struct AuditEvidence {
    score: i64,
    max_score: i64,
    percentage: f64,
    detailed_scores: Vec<SubScore>,
    reasoning: String,
    strengths: Vec<String>,
    weaknesses: Vec<String>,
    recommendations: Vec<String>,
}

impl AuditEvidence {
    /// Build evidence, enforcing `0 <= score <= max_score` and
    /// `0 <= percentage <= 100`.
    pub fn new(fields: EvidenceFields) -> Result<Self, EvidenceError> {
        if fields.score < 0 || fields.score > fields.max_score {
            return Err(EvidenceError::ScoreOutOfRange {
                score: fields.score,
                max_score: fields.max_score,
            });
        }
        if !(0.0..=100.0).contains(&fields.percentage) {
            return Err(EvidenceError::PercentageOutOfRange(fields.percentage));
        }
        Ok(Self {
            score: fields.score,
            max_score: fields.max_score,
            percentage: fields.percentage,
            detailed_scores: fields.detailed_scores,
            reasoning: fields.reasoning,
            strengths: fields.strengths,
            weaknesses: fields.weaknesses,
            recommendations: fields.recommendations,
        })
    }

    /// Zero-score evidence recording why scoring could not complete.
    pub fn failed(max_score: i64, message: impl std::fmt::Display) -> Self {
        Self {
            score: 0,
            max_score: max_score.max(0),
            percentage: 0.0,
            detailed_scores: Vec::new(),
            reasoning: format!("Analysis failed: {}", message),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    pub fn score(&self) -> i64 {
        self.score
    }
    pub fn max_score(&self) -> i64 {
        self.max_score
    }
    pub fn percentage(&self) -> f64 {
        self.percentage
    }
    pub fn detailed_scores(&self) -> &[SubScore] {
        &self.detailed_scores
    }
    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }
    pub fn strengths(&self) -> &[String] {
        &self.strengths
    }
    pub fn weaknesses(&self) -> &[String] {
        &self.weaknesses
    }
    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    /// Export every field.
    pub fn to_fields(&self) -> EvidenceFields {
        self.clone().into()
    }
}

impl TryFrom<EvidenceFields> for AuditEvidence {
    type Error = EvidenceError;

    fn try_from(fields: EvidenceFields) -> Result<Self, Self::Error> {
        AuditEvidence::new(fields)
    }
}

impl From<AuditEvidence> for EvidenceFields {
    fn from(e: AuditEvidence) -> Self {
        EvidenceFields {
            score: e.score,
            max_score: e.max_score,
            percentage: e.percentage,
            detailed_scores: e.detailed_scores,
            reasoning: e.reasoning,
            strengths: e.strengths,
            weaknesses: e.weaknesses,
            recommendations: e.recommendations,
        }
    }
}

/// `score / max_score × 100`, rounded to one decimal place.
///
/// Rounding is half-up on the exact rational value (computed in integer
/// tenths, so `1/16 = 6.25%` becomes `6.3`, never `6.2` through float
/// error). A `max_score` of zero or less yields `0.0`.
pub fn percentage(score: i64, max_score: i64) -> f64 {
    if max_score <= 0 {
        return 0.0;
    }
    let (score, max) = (score as i128, max_score as i128);
    let tenths = (score * 2000 + max).div_euclid(2 * max);
    tenths as f64 / 10.0
}

/// One scored section inside an [`AuditReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionResult {
    pub title: String,
    pub evidence: AuditEvidence,
}

/// How the scoring context was obtained for a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextMode {
    /// Retrieval over a populated vector store.
    Retrieval(StoreStats),
    /// Indexing failed; sections saw a prefix of the document text.
    Prefix { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Sections {
    policy_alignment: SectionResult,
    implementation_readiness: SectionResult,
}

/// Final, immutable result of one audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    total_score: i64,
    max_score: i64,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    elapsed: Duration,
    rag_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index_stats: Option<StoreStats>,
    sections: Sections,
}

impl AuditReport {
    /// Aggregate the two section results. The total is always the sum of
    /// the section scores.
    pub fn new(
        policy: SectionResult,
        implementation: SectionResult,
        elapsed: Duration,
        mode: ContextMode,
    ) -> Self {
        let total_score = policy.evidence.score() + implementation.evidence.score();
        let max_score = policy.evidence.max_score() + implementation.evidence.max_score();
        let (rag_used, fallback_reason, index_stats) = match mode {
            ContextMode::Retrieval(stats) => (true, None, Some(stats)),
            ContextMode::Prefix { reason } => (false, Some(reason), None),
        };
        Self {
            total_score,
            max_score,
            elapsed,
            rag_used,
            fallback_reason,
            index_stats,
            sections: Sections {
                policy_alignment: policy,
                implementation_readiness: implementation,
            },
        }
    }

    pub fn total_score(&self) -> i64 {
        self.total_score
    }
    pub fn max_score(&self) -> i64 {
        self.max_score
    }
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
    /// Whether retrieval was used (false means the prefix fallback ran).
    pub fn rag_used(&self) -> bool {
        self.rag_used
    }
    pub fn fallback_reason(&self) -> Option<&str> {
        self.fallback_reason.as_deref()
    }
    pub fn index_stats(&self) -> Option<&StoreStats> {
        self.index_stats.as_ref()
    }

    pub fn section(&self, key: SectionKey) -> &SectionResult {
        match key {
            SectionKey::PolicyAlignment => &self.sections.policy_alignment,
            SectionKey::ImplementationReadiness => &self.sections.implementation_readiness,
        }
    }

    /// Sections in scoring order.
    pub fn sections(&self) -> impl Iterator<Item = (SectionKey, &SectionResult)> {
        SectionKey::ALL.into_iter().map(move |key| (key, self.section(key)))
    }
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64((d.as_secs_f64() * 10.0).round() / 10.0)
}
