//! Structured scoring prompts.
//!
//! One prompt per rubric section: evaluator persona, the section's
//! sub-items with their point maxima, the report excerpt, and the exact
//! JSON shape the model must answer with. The response is parsed without
//! stripping markdown fences, so the prompt demands bare JSON.

use std::fmt::Write;

use serde_json::Value;

use crate::rubric::RubricSection;

/// Render the scoring prompt for `section` over `context`.
pub fn render_prompt(section: &RubricSection, context: &str) -> String {
    let mut p = String::with_capacity(context.len() + 2048);

    let _ = writeln!(
        p,
        "{} Evaluate the report excerpts below against the '{}' criterion.",
        section.reviewer.trim(),
        section.title
    );
    p.push('\n');

    let _ = writeln!(
        p,
        "=== Evaluation criteria ({} points total) ===",
        section.max_score
    );
    for (i, item) in section.items.iter().enumerate() {
        let _ = writeln!(p, "{}. {} ({} points)", i + 1, item.name, item.max_score);
    }
    p.push('\n');

    p.push_str("=== Report excerpts ===\n");
    p.push_str(context);
    p.push_str("\n\n");

    p.push_str("=== Output format (JSON) ===\n");
    p.push_str("{\n");
    let _ = writeln!(
        p,
        "  \"total_score\": <integer between 0 and {}>,",
        section.max_score
    );
    p.push_str("  \"detailed_scores\": [\n");
    for (i, item) in section.items.iter().enumerate() {
        let sep = if i + 1 < section.items.len() { "," } else { "" };
        let _ = writeln!(
            p,
            "    {{\"item\": {}, \"score\": <integer between 0 and {}>, \"max_score\": {}, \"reason\": \"<evidence from the report for this score>\"}}{}",
            Value::String(item.name.clone()),
            item.max_score,
            item.max_score,
            sep
        );
    }
    p.push_str("  ],\n");
    p.push_str("  \"reasoning\": \"<detailed explanation of how the total was reached>\",\n");
    p.push_str("  \"strengths\": [\"<every strength found>\"],\n");
    p.push_str("  \"weaknesses\": [\"<every weakness found>\"],\n");
    p.push_str("  \"recommendations\": [\"<every improvement needed>\"]\n");
    p.push_str("}\n\n");

    let _ = writeln!(
        p,
        "total_score must equal the sum of the detailed scores and may not exceed {}.",
        section.max_score
    );
    p.push_str(
        "List every strength, weakness, and recommendation you find; do not summarize them away.\n",
    );
    match &section.response_language {
        Some(language) => {
            let _ = writeln!(p, "Write every text value in {}.", language);
        }
        None => p.push_str("Write every text value in the language of the report excerpts.\n"),
    }
    p.push_str("Output only the JSON object. Do not wrap it in markdown code fences or add any other text.");

    p
}
