//! In-memory vector store for one document.
//!
//! Holds chunk texts and their embeddings in two parallel vectors that
//! always have the same length. A chunk whose embedding failed keeps its
//! slot with an all-zero vector, which cosine similarity scores as `0.0`.
//!
//! The store is populated once with [`VectorStore::add_texts`], queried
//! many times, and dropped when the audit finishes. Nothing is persisted.
//!
//! # Pacing
//!
//! Chunks are embedded one at a time. After every call the store sleeps
//! for [`RateLimit::delay`]; after every `batch_size`-th call it sleeps
//! for [`RateLimit::batch_delay`] instead. No pause follows the last call.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embedding::{cosine_similarity, is_zero_vector, EmbedMode, EmbeddingProvider};
use crate::error::RetrievalError;
use crate::observer::{AuditObserver, NoopObserver};

/// Pauses inserted between embedding calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Pause after an ordinary call.
    pub delay: Duration,
    /// Pause after every `batch_size`-th call.
    pub batch_delay: Duration,
    pub batch_size: usize,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(300),
            batch_delay: Duration::from_millis(1000),
            batch_size: 10,
        }
    }
}

impl RateLimit {
    /// No pauses at all.
    pub fn none() -> Self {
        Self {
            delay: Duration::ZERO,
            batch_delay: Duration::ZERO,
            batch_size: 1,
        }
    }

    /// Pause owed after the `n`-th call (1-based).
    pub fn pause_after(&self, n: usize) -> Duration {
        if self.batch_size > 0 && n % self.batch_size == 0 {
            self.batch_delay
        } else {
            self.delay
        }
    }
}

/// Diagnostic counters for a populated store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub chunk_count: usize,
    pub embedding_count: usize,
    pub dimension: usize,
    pub zero_vector_count: usize,
}

/// Chunk texts plus order-aligned embeddings for a single document.
pub struct VectorStore {
    provider: Arc<dyn EmbeddingProvider>,
    dims: usize,
    rate_limit: RateLimit,
    chunks: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    failed: usize,
}

impl VectorStore {
    /// Create an empty store. The dimension is taken from the provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, rate_limit: RateLimit) -> Self {
        let dims = provider.dims();
        Self {
            provider,
            dims,
            rate_limit,
            chunks: Vec::new(),
            embeddings: Vec::new(),
            failed: 0,
        }
    }

    /// Embed and store `chunks`, replacing any previous contents.
    ///
    /// Returns the number of chunks whose embedding failed.
    pub async fn add_texts(&mut self, chunks: Vec<String>) -> usize {
        self.add_texts_observed(chunks, &NoopObserver).await
    }

    /// [`add_texts`](Self::add_texts) with per-chunk progress reported
    /// to `observer`.
    pub async fn add_texts_observed(
        &mut self,
        chunks: Vec<String>,
        observer: &dyn AuditObserver,
    ) -> usize {
        let total = chunks.len();
        let mut embeddings = Vec::with_capacity(total);
        let mut failed = 0usize;

        info!(total, model = self.provider.model_name(), "embedding chunks");

        for (i, text) in chunks.iter().enumerate() {
            let n = i + 1;
            match self.embed_checked(text, EmbedMode::Document).await {
                Ok(vector) => embeddings.push(vector),
                Err(e) => {
                    warn!(chunk = n, error = %e, "chunk embedding failed, storing zero vector");
                    embeddings.push(vec![0.0; self.dims]);
                    failed += 1;
                }
            }
            observer.embedding_progress(n, total, failed);

            if n < total {
                let pause = self.rate_limit.pause_after(n);
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
            }
        }

        self.chunks = chunks;
        self.embeddings = embeddings;
        self.failed = failed;

        info!(
            embedded = total - failed,
            failed, total, "chunk embedding finished"
        );
        failed
    }

    /// Return the `k` chunk texts most similar to `query`.
    ///
    /// Ties keep original chunk order. If the ranked search cannot be
    /// served, the first `k` chunks are returned in document order.
    /// At most `min(k, len)` texts are returned.
    pub async fn similarity_search(&self, query: &str, k: usize) -> Vec<String> {
        match self.try_similarity_search(query, k).await {
            Ok(indices) => indices.into_iter().map(|i| self.chunks[i].clone()).collect(),
            Err(e) => {
                warn!(error = %e, k, "similarity search failed, returning leading chunks");
                self.chunks.iter().take(k).cloned().collect()
            }
        }
    }

    /// Ranked search that reports failure instead of falling back.
    ///
    /// Returns chunk indices, best first.
    pub async fn try_similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<usize>, RetrievalError> {
        if self.chunks.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self
            .provider
            .embed(query, EmbedMode::Query)
            .await
            .map_err(|e| RetrievalError::QueryEmbedding(format!("{:#}", e)))?;
        if query_vec.len() != self.dims {
            return Err(RetrievalError::Dimension {
                got: query_vec.len(),
                expected: self.dims,
            });
        }
        if query_vec.iter().any(|x| !x.is_finite()) {
            return Err(RetrievalError::NonFinite);
        }

        let top = self.rank_by_vector(&query_vec, k);
        debug!(returned = top.len(), k, "similarity search complete");
        Ok(top)
    }

    /// Indices of the `k` stored embeddings closest to `query_vec`,
    /// best first, ties broken by original index.
    pub fn rank_by_vector(&self, query_vec: &[f32], k: usize) -> Vec<usize> {
        let sims: Vec<f32> = self
            .embeddings
            .iter()
            .map(|e| cosine_similarity(query_vec, e))
            .collect();

        let mut order: Vec<usize> = (0..sims.len()).collect();
        // sort_by is stable: equal scores stay in index order.
        order.sort_by(|&a, &b| sims[b].partial_cmp(&sims[a]).unwrap_or(Ordering::Equal));
        order.truncate(k);
        order
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            chunk_count: self.chunks.len(),
            embedding_count: self.embeddings.len(),
            dimension: self.dims,
            zero_vector_count: self.embeddings.iter().filter(|e| is_zero_vector(e)).count(),
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// Chunks whose embedding failed in the last [`add_texts`](Self::add_texts).
    pub fn failed_count(&self) -> usize {
        self.failed
    }

    async fn embed_checked(&self, text: &str, mode: EmbedMode) -> anyhow::Result<Vec<f32>> {
        let vector = self.provider.embed(text, mode).await?;
        if vector.len() != self.dims {
            anyhow::bail!(
                "embedding has {} dimensions, expected {}",
                vector.len(),
                self.dims
            );
        }
        if vector.iter().any(|x| !x.is_finite()) {
            anyhow::bail!("embedding contains non-finite values");
        }
        Ok(vector)
    }
}
