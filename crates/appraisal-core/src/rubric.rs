//! The appraisal rubric: two weighted sections with sub-items.
//!
//! The default rubric follows the KOICA pre-feasibility review criteria:
//! policy alignment (30 points) and implementation readiness (70 points).
//! Each section carries the retrieval query used to pull its context
//! out of the vector store.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::SectionKey;

/// One scored sub-item of a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricItem {
    pub name: String,
    pub max_score: i64,
}

/// A named evaluation axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricSection {
    pub title: String,
    pub max_score: i64,
    /// Retrieval query used to select context for this section.
    pub query: String,
    pub items: Vec<RubricItem>,
    /// Evaluator persona that opens the prompt.
    #[serde(default = "default_reviewer")]
    pub reviewer: String,
    /// Language for the model's free-text fields. Unset means the
    /// language of the report itself.
    #[serde(default)]
    pub response_language: Option<String>,
}

/// Persona used by the built-in sections.
pub const DEFAULT_REVIEWER: &str =
    "You are an expert reviewer of KOICA development cooperation project appraisal reports.";

fn default_reviewer() -> String {
    DEFAULT_REVIEWER.to_string()
}

fn item(name: &str, max_score: i64) -> RubricItem {
    RubricItem {
        name: name.to_string(),
        max_score,
    }
}

impl RubricSection {
    /// Built-in policy alignment section (30 points).
    pub fn policy_alignment() -> Self {
        Self {
            title: "Policy Alignment".to_string(),
            max_score: 30,
            query: "domestic and international policy alignment, SDGs, partner country \
                    development policy, Korean government CPS, KOICA mid-term strategy, \
                    other donor support, ODA"
                .to_string(),
            items: vec![
                item("SDGs linkage", 10),
                item("Partner country policy alignment", 5),
                item("Korean CPS and national agenda linkage", 5),
                item("KOICA mid-term strategy alignment", 5),
                item("Other donor overlap analysis", 5),
            ],
            reviewer: default_reviewer(),
            response_language: None,
        }
    }

    /// Built-in implementation readiness section (70 points).
    pub fn implementation_readiness() -> Self {
        Self {
            title: "Implementation Readiness".to_string(),
            max_score: 70,
            query: "implementation conditions, partner country implementation structure, \
                    domestic implementation structure, project strategy, risk management, \
                    performance management, budget, schedule"
                .to_string(),
            items: vec![
                item("Partner country implementation structure", 20),
                item("Domestic implementation structure", 15),
                item("Project implementation strategy", 15),
                item("Risk management", 10),
                item("Performance management", 10),
            ],
            reviewer: default_reviewer(),
            response_language: None,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.items.is_empty() {
            return Err(ConfigError::EmptySection {
                section: self.title.clone(),
            });
        }
        let items_total: i64 = self.items.iter().map(|i| i.max_score).sum();
        if items_total != self.max_score || self.items.iter().any(|i| i.max_score < 0) {
            return Err(ConfigError::SectionTotalMismatch {
                section: self.title.clone(),
                items_total,
                max_score: self.max_score,
            });
        }
        Ok(())
    }
}

/// Both rubric sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubric {
    pub policy: RubricSection,
    pub implementation: RubricSection,
}

impl Default for Rubric {
    fn default() -> Self {
        Self {
            policy: RubricSection::policy_alignment(),
            implementation: RubricSection::implementation_readiness(),
        }
    }
}

/// Points available across the whole rubric.
pub const TOTAL_MAX_SCORE: i64 = 100;

impl Rubric {
    pub fn section(&self, key: SectionKey) -> &RubricSection {
        match key {
            SectionKey::PolicyAlignment => &self.policy,
            SectionKey::ImplementationReadiness => &self.implementation,
        }
    }

    /// Each section's items must add up to its maximum, and the two
    /// maxima must add up to [`TOTAL_MAX_SCORE`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy.validate()?;
        self.implementation.validate()?;
        let total = self.policy.max_score + self.implementation.max_score;
        if total != TOTAL_MAX_SCORE {
            return Err(ConfigError::RubricTotal(total));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rubric_is_valid() {
        let rubric = Rubric::default();
        rubric.validate().unwrap();
        assert_eq!(rubric.section(SectionKey::PolicyAlignment).max_score, 30);
        assert_eq!(rubric.section(SectionKey::ImplementationReadiness).max_score, 70);
    }

    #[test]
    fn test_items_must_sum_to_section_max() {
        let mut rubric = Rubric::default();
        rubric.policy.items[0].max_score = 9;
        assert!(matches!(
            rubric.validate(),
            Err(ConfigError::SectionTotalMismatch { items_total: 29, .. })
        ));
    }

    #[test]
    fn test_sections_must_sum_to_hundred() {
        let mut rubric = Rubric::default();
        rubric.policy.max_score = 40;
        rubric.policy.items[0].max_score = 20;
        assert_eq!(rubric.validate(), Err(ConfigError::RubricTotal(110)));
    }

    #[test]
    fn test_empty_section_rejected() {
        let mut rubric = Rubric::default();
        rubric.implementation.items.clear();
        assert!(matches!(
            rubric.validate(),
            Err(ConfigError::EmptySection { .. })
        ));
    }
}
