use std::time::Duration;

use appraisal_core::models::ContextMode;
use appraisal_core::models::percentage;
use appraisal_core::store::StoreStats;
use appraisal_core::{AuditEvidence, AuditReport, EvidenceFields, SectionResult, SubScore};
use appraisal_harness::config::GradingConfig;
use appraisal_harness::report::{
    render_json, render_record_json, render_text_at, AuditRecord, DocumentInfo,
};
use chrono::TimeZone;

fn evidence(score: i64, max_score: i64) -> AuditEvidence {
    AuditEvidence::new(EvidenceFields {
        score,
        max_score,
        percentage: percentage(score, max_score),
        detailed_scores: vec![SubScore {
            name: "SDGs linkage".to_string(),
            score: 8,
            max_score: 10,
            justification: "Targets 4.1 and 4.5 are cited.".to_string(),
        }],
        reasoning: "Aligned with national plans.\nDonor mapping is thin.".to_string(),
        strengths: vec!["Explicit SDG mapping".to_string()],
        weaknesses: vec!["No donor matrix".to_string()],
        recommendations: vec!["Add a donor coordination table".to_string()],
    })
    .unwrap()
}

fn report(mode: ContextMode) -> AuditReport {
    AuditReport::new(
        SectionResult {
            title: "Policy Alignment".to_string(),
            evidence: evidence(25, 30),
        },
        SectionResult {
            title: "Implementation Readiness".to_string(),
            evidence: AuditEvidence::failed(70, "[parse] response is not valid JSON"),
        },
        Duration::from_millis(12_340),
        mode,
    )
}

fn stats() -> StoreStats {
    StoreStats {
        chunk_count: 8,
        embedding_count: 8,
        dimension: 768,
        zero_vector_count: 1,
    }
}

#[test]
fn text_report_has_every_field() {
    let at = chrono::Local.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap();
    let text = render_text_at(&report(ContextMode::Retrieval(stats())), &GradingConfig::default(), at);

    assert!(text.contains("Generated: 2026-03-02 09:30:00"));
    assert!(text.contains("Elapsed:   12.3s"));
    assert!(text.contains("RAG used:  yes (8 chunks indexed, 1 without embedding)"));
    assert!(text.contains("TOTAL: 25 / 100 (Needs improvement)"));
    assert!(text.contains("1. Policy Alignment: 25 / 30 (83.3%)"));
    assert!(text.contains("  - SDGs linkage: 8 / 10"));
    assert!(text.contains("      Targets 4.1 and 4.5 are cited."));
    assert!(text.contains("Strengths:\n  - Explicit SDG mapping"));
    assert!(text.contains("Weaknesses:\n  - No donor matrix"));
    assert!(text.contains("Recommendations:\n  - Add a donor coordination table"));
    assert!(text.contains("  Donor mapping is thin."));
    assert!(text.contains("2. Implementation Readiness: 0 / 70 (0.0%)"));
    assert!(text.contains("Analysis failed: [parse]"));
    assert!(text.contains("not an official appraisal decision"));
}

#[test]
fn text_report_shows_fallback_reason() {
    let at = chrono::Local.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap();
    let text = render_text_at(
        &report(ContextMode::Prefix {
            reason: "embedding failed for all 8 chunks".to_string(),
        }),
        &GradingConfig::default(),
        at,
    );
    assert!(text.contains("RAG used:  no (embedding failed for all 8 chunks)"));
}

#[test]
fn json_report_uses_stable_keys() {
    let json = render_json(&report(ContextMode::Retrieval(stats()))).unwrap();
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(v["total_score"], 25);
    assert_eq!(v["max_score"], 100);
    assert_eq!(v["rag_used"], true);
    assert_eq!(v["elapsed_secs"], 12.3);
    assert_eq!(v["index_stats"]["chunk_count"], 8);

    let policy = &v["sections"]["policy_alignment"];
    assert_eq!(policy["title"], "Policy Alignment");
    assert_eq!(policy["evidence"]["percentage"], 83.3);
    assert_eq!(policy["evidence"]["detailed_scores"][0]["item"], "SDGs linkage");
    assert_eq!(policy["evidence"]["detailed_scores"][0]["reason"], "Targets 4.1 and 4.5 are cited.");
    for key in ["reasoning", "strengths", "weaknesses", "recommendations"] {
        assert!(policy["evidence"].get(key).is_some(), "missing {key}");
    }

    let implementation = &v["sections"]["implementation_readiness"]["evidence"];
    assert_eq!(implementation["score"], 0);
    assert_eq!(implementation["max_score"], 70);
}

#[test]
fn json_record_identifies_document() {
    let report = report(ContextMode::Prefix {
        reason: "document text produced no chunks".to_string(),
    });
    let document = DocumentInfo::new(std::path::Path::new("report.txt"), b"abc", 3, 1, 0);
    let record = AuditRecord {
        generated_at: chrono::Utc::now(),
        embedding_model: "text-embedding-004",
        generation_model: "gemini-2.5-pro",
        document: &document,
        report: &report,
    };
    let v: serde_json::Value = serde_json::from_str(&render_record_json(&record).unwrap()).unwrap();
    assert_eq!(
        v["document"]["sha256"],
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_eq!(v["report"]["rag_used"], false);
    assert_eq!(v["report"]["fallback_reason"], "document text produced no chunks");
    assert!(v["report"].get("index_stats").is_none());
    assert_eq!(v["generation_model"], "gemini-2.5-pro");
}
