//! `appraise audit`: extract, score, render.

use anyhow::{Context, Result};
use std::path::Path;

use appraisal_core::Auditor;

use crate::config::Config;
use crate::embedding::create_provider;
use crate::extract::{extract, source_from_path, DocumentSource};
use crate::generation::create_generator;
use crate::progress::ProgressMode;
use crate::report::{render_record_json, render_text, AuditRecord, DocumentInfo};

/// Output format for the rendered report.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Run a full audit of the document at `path`.
///
/// Provider construction (credentials, URLs) happens before the document
/// is read, so a configuration problem never costs an extraction.
pub async fn run_audit(
    cfg: &Config,
    path: &Path,
    format: OutputFormat,
    output: Option<&Path>,
    progress: ProgressMode,
) -> Result<()> {
    let embedder = create_provider(&cfg.embedding).context("embedding provider")?;
    let generator = create_generator(&cfg.generation).context("generation provider")?;
    let embedding_model = embedder.model_name().to_string();
    let generation_model = generator.model_name().to_string();

    let auditor = Auditor::new(embedder, generator, cfg.audit_settings())
        .context("invalid pipeline configuration")?
        .with_observer(progress.observer());

    let source = source_from_path(path)?;
    let extracted =
        extract(&source).with_context(|| format!("Failed to extract {}", path.display()))?;
    let raw: &[u8] = match &source {
        DocumentSource::Pdf(bytes) => bytes,
        DocumentSource::Text(text) => text.as_bytes(),
    };
    let document = DocumentInfo::new(
        path,
        raw,
        extracted.char_count(),
        extracted.pages_total,
        extracted.pages_failed,
    );
    tracing::info!(
        path = %document.path,
        sha256 = %document.sha256,
        chars = document.chars,
        pages = document.pages_total,
        pages_failed = document.pages_failed,
        "document extracted"
    );

    let report = auditor.run(&extracted.text).await?;

    let rendered = match format {
        OutputFormat::Text => render_text(&report, &cfg.grading),
        OutputFormat::Json => render_record_json(&AuditRecord {
            generated_at: chrono::Utc::now(),
            embedding_model: &embedding_model,
            generation_model: &generation_model,
            document: &document,
            report: &report,
        })?,
    };

    match output {
        Some(out) => {
            std::fs::write(out, rendered.as_bytes())
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Report written to {}", out.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
