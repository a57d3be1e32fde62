//! `appraise extract` and `appraise index`: look at what the pipeline sees
//! without calling the generator.

use anyhow::{Context, Result};
use std::path::Path;

use appraisal_core::chunk::{expected_chunk_count, split_text};
use appraisal_core::store::VectorStore;

use crate::config::Config;
use crate::embedding::create_provider;
use crate::extract::{extract, source_from_path, ExtractedText};
use crate::progress::ProgressMode;

fn load_text(path: &Path) -> Result<ExtractedText> {
    let source = source_from_path(path)?;
    extract(&source).with_context(|| format!("Failed to extract {}", path.display()))
}

/// Print extraction statistics and the chunk count the configured
/// chunker would produce.
pub fn run_extract(cfg: &Config, path: &Path) -> Result<()> {
    let extracted = load_text(path)?;
    let settings = cfg.audit_settings();
    let chars = extracted.char_count();

    println!("file: {}", path.display());
    println!("  pages: {}", extracted.pages_total);
    println!("  failed pages: {}", extracted.pages_failed);
    println!("  characters: {}", chars);
    println!(
        "  chunks: {} (chunk_size {}, overlap {})",
        expected_chunk_count(chars, &settings.chunking),
        settings.chunking.chunk_size,
        settings.chunking.overlap
    );
    Ok(())
}

/// Build the vector store for `path`, print its statistics, and
/// optionally the top `k` chunks for `query`.
pub async fn run_index(
    cfg: &Config,
    path: &Path,
    query: Option<&str>,
    k: Option<usize>,
    progress: ProgressMode,
) -> Result<()> {
    let settings = cfg.audit_settings();
    settings
        .validate()
        .context("invalid pipeline configuration")?;
    let embedder = create_provider(&cfg.embedding).context("embedding provider")?;

    let extracted = load_text(path)?;
    let chunks = split_text(&extracted.text, &settings.chunking)?;

    let mut store = VectorStore::new(embedder, settings.rate_limit);
    let observer = progress.observer();
    store.add_texts_observed(chunks, observer.as_ref()).await;

    let stats = store.stats();
    println!("index: {}", path.display());
    println!("  chunks: {}", stats.chunk_count);
    println!("  embeddings: {}", stats.embedding_count);
    println!("  dimension: {}", stats.dimension);
    println!("  zero vectors: {}", stats.zero_vector_count);

    if let Some(query) = query {
        let k = k.unwrap_or(settings.retrieval.top_k);
        match store.try_similarity_search(query, k).await {
            Ok(indices) => {
                println!("top {} for {:?}:", indices.len(), query);
                for (rank, i) in indices.into_iter().enumerate() {
                    println!("{}. chunk #{}", rank + 1, i);
                    println!("   {}", snippet(&store.chunks()[i], 200));
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "ranked search unavailable");
                println!("ranked search unavailable ({}); leading chunks:", e);
                for line in leading_chunk_lines(store.chunks(), k) {
                    println!("{}", line);
                }
            }
        }
    }
    Ok(())
}

/// Numbered snippets of the first `k` chunks, for when ranking is unavailable.
fn leading_chunk_lines(chunks: &[String], k: usize) -> Vec<String> {
    chunks
        .iter()
        .take(k)
        .enumerate()
        .map(|(i, chunk)| format!("{}. {}", i + 1, snippet(chunk, 200)))
        .collect()
}

fn snippet(text: &str, max_chars: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let cut = appraisal_core::context::truncate_chars(&flat, max_chars);
    if cut.len() < flat.len() {
        format!("{}…", cut)
    } else {
        cut.to_string()
    }
}
