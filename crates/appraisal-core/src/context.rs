//! Context assembly for rubric prompts.
//!
//! A section's context is either the top-k retrieved chunks joined with a
//! visible separator, or (without a store) a prefix of the full text.
//! Both are cut to [`RetrievalParams::max_context_chars`] characters.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::store::VectorStore;

/// Marks the seam between two retrieved, non-adjacent passages.
pub const CHUNK_SEPARATOR: &str = "\n---\n";

/// Sent instead of an empty context.
pub const NO_CONTEXT_PLACEHOLDER: &str = "No relevant content was found in the report.";

/// Retrieval bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalParams {
    /// Chunks retrieved per section.
    pub top_k: usize,
    /// Upper bound on context length, in characters.
    pub max_context_chars: usize,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            top_k: 15,
            max_context_chars: 35_000,
        }
    }
}

impl RetrievalParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::ZeroRetrievalBound("top_k"));
        }
        if self.max_context_chars == 0 {
            return Err(ConfigError::ZeroRetrievalBound("max_context_chars"));
        }
        Ok(())
    }
}

/// Retrieve the `k` chunks most relevant to `query` and join them.
///
/// Returns an empty string when there is no store.
pub async fn get_context(store: Option<&VectorStore>, query: &str, k: usize) -> String {
    match store {
        Some(store) => store.similarity_search(query, k).await.join(CHUNK_SEPARATOR),
        None => String::new(),
    }
}

/// Context for one rubric section.
///
/// Uses retrieval when a store is present, otherwise the first
/// `max_context_chars` characters of `full_text`. Never returns an empty
/// string.
pub async fn section_context(
    store: Option<&VectorStore>,
    full_text: &str,
    query: &str,
    params: &RetrievalParams,
) -> String {
    let retrieved;
    let source = match store {
        Some(store) => {
            retrieved = get_context(Some(store), query, params.top_k).await;
            retrieved.as_str()
        }
        None => full_text,
    };
    let context = truncate_chars(source, params.max_context_chars);

    if context.trim().is_empty() {
        tracing::warn!(query, "no context available, using placeholder");
        return NO_CONTEXT_PLACEHOLDER.to_string();
    }
    context.to_string()
}

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
