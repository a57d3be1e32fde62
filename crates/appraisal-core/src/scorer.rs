//! Rubric section scoring: context → prompt → model → validated evidence.
//!
//! The model's answer is untrusted. It must parse as a JSON object, carry
//! every required key, have correctly typed fields, and produce a total
//! within the section's range. Nothing is clamped or repaired: a
//! non-compliant answer becomes a failed (zero-score) evidence whose
//! reasoning names the failure class.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::context::{section_context, RetrievalParams};
use crate::error::ScoringError;
use crate::generation::Generator;
use crate::models::{percentage, whole_number, AuditEvidence, EvidenceFields, SubScore};
use crate::prompt::render_prompt;
use crate::rubric::RubricSection;
use crate::store::VectorStore;

/// Keys every scoring response must contain.
pub const REQUIRED_KEYS: [&str; 2] = ["total_score", "detailed_scores"];

/// Parse `text` as a JSON object and check that `required` keys exist.
///
/// # Errors
///
/// - [`ScoringError::Parse`] if `text` is not valid JSON.
/// - [`ScoringError::NotAnObject`] if it is JSON but not an object.
/// - [`ScoringError::MissingKey`] naming the first absent key.
pub fn parse_response(text: &str, required: &[&str]) -> Result<Map<String, Value>, ScoringError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(obj) = value else {
        return Err(ScoringError::NotAnObject);
    };
    if let Some(missing) = required.iter().find(|k| !obj.contains_key(**k)) {
        return Err(ScoringError::MissingKey {
            key: missing.to_string(),
        });
    }
    Ok(obj)
}

/// Build validated evidence from a parsed response.
pub fn evidence_from_response(
    obj: &Map<String, Value>,
    max_score: i64,
) -> Result<AuditEvidence, ScoringError> {
    let score = integer_field(obj, "total_score")?;
    let detailed_scores: Vec<SubScore> = match obj.get("detailed_scores") {
        Some(v) => serde_json::from_value(v.clone()).map_err(|e| ScoringError::Malformed {
            key: "detailed_scores".to_string(),
            reason: e.to_string(),
        })?,
        None => Vec::new(),
    };

    let evidence = AuditEvidence::new(EvidenceFields {
        score,
        max_score,
        percentage: percentage(score, max_score),
        detailed_scores,
        reasoning: string_field(obj, "reasoning")?,
        strengths: string_list_field(obj, "strengths")?,
        weaknesses: string_list_field(obj, "weaknesses")?,
        recommendations: string_list_field(obj, "recommendations")?,
    })?;
    Ok(evidence)
}

/// Score one section, reporting failure instead of degrading.
pub async fn try_score_section(
    generator: &dyn Generator,
    section: &RubricSection,
    store: Option<&VectorStore>,
    full_text: &str,
    params: &RetrievalParams,
) -> Result<AuditEvidence, ScoringError> {
    let context = section_context(store, full_text, &section.query, params).await;
    let prompt = render_prompt(section, &context);
    debug!(
        section = %section.title,
        context_chars = context.chars().count(),
        rag = store.is_some(),
        "prompt rendered"
    );

    let response = generator
        .generate(&prompt)
        .await
        .map_err(|e| ScoringError::Generation(format!("{:#}", e)))?;

    let obj = parse_response(&response, &REQUIRED_KEYS)?;
    let evidence = evidence_from_response(&obj, section.max_score)?;

    if evidence.detailed_scores().len() != section.items.len() {
        warn!(
            section = %section.title,
            expected = section.items.len(),
            got = evidence.detailed_scores().len(),
            "sub-item count differs from rubric"
        );
    }
    info!(
        section = %section.title,
        score = evidence.score(),
        max = evidence.max_score(),
        "section scored"
    );
    Ok(evidence)
}

/// Score one section. Never fails: any error yields
/// [`AuditEvidence::failed`] with the error class in its reasoning.
pub async fn score_section(
    generator: &dyn Generator,
    section: &RubricSection,
    store: Option<&VectorStore>,
    full_text: &str,
    params: &RetrievalParams,
) -> AuditEvidence {
    match try_score_section(generator, section, store, full_text, params).await {
        Ok(evidence) => evidence,
        Err(e) => failed_evidence(section, &e),
    }
}

/// Failed evidence for `section`, logged with the failure class.
pub fn failed_evidence(section: &RubricSection, error: &ScoringError) -> AuditEvidence {
    warn!(section = %section.title, kind = error.kind(), error = %error, "section scoring failed");
    AuditEvidence::failed(section.max_score, format!("[{}] {}", error.kind(), error))
}

fn integer_field(obj: &Map<String, Value>, key: &str) -> Result<i64, ScoringError> {
    let malformed = |reason: &str| ScoringError::Malformed {
        key: key.to_string(),
        reason: reason.to_string(),
    };
    match obj.get(key) {
        Some(Value::Number(n)) => whole_number(n).ok_or_else(|| malformed("expected an integer")),
        Some(_) => Err(malformed("expected an integer")),
        None => Err(ScoringError::MissingKey {
            key: key.to_string(),
        }),
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Result<String, ScoringError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ScoringError::Malformed {
            key: key.to_string(),
            reason: "expected a string".to_string(),
        }),
    }
}

fn string_list_field(obj: &Map<String, Value>, key: &str) -> Result<Vec<String>, ScoringError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => Ok(s.clone()),
                _ => Err(ScoringError::Malformed {
                    key: key.to_string(),
                    reason: "expected an array of strings".to_string(),
                }),
            })
            .collect(),
        Some(_) => Err(ScoringError::Malformed {
            key: key.to_string(),
            reason: "expected an array of strings".to_string(),
        }),
    }
}
