//! Audit orchestration.
//!
//! One [`Auditor::run`] walks a fixed sequence of stages:
//!
//! ```text
//! Started → Extracted → { Indexed | IndexFailed } → ScoredPolicy
//!         → ScoredImplementation → Aggregated → Done
//! ```
//!
//! The only fork is indexing. When the vector store cannot be built, both
//! sections are scored on a prefix of the document and the report says so.
//! Sections are scored in order and independently; a failed section
//! becomes a zero-scored evidence and never stops the run. Nothing is
//! retried at this level.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, info_span, warn, Instrument};

use crate::chunk::{split_text, ChunkingParams};
use crate::context::RetrievalParams;
use crate::embedding::EmbeddingProvider;
use crate::error::{AuditError, ConfigError, IndexError};
use crate::generation::Generator;
use crate::models::{AuditEvidence, AuditReport, ContextMode, SectionKey, SectionResult};
use crate::observer::{AuditObserver, AuditStage, NoopObserver};
use crate::rubric::Rubric;
use crate::scorer::{failed_evidence, try_score_section};
use crate::store::{RateLimit, VectorStore};

/// Tunables for one audit. Loaded and owned by the application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditSettings {
    pub chunking: ChunkingParams,
    pub retrieval: RetrievalParams,
    pub rate_limit: RateLimit,
    pub rubric: Rubric,
}

impl AuditSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking.validate()?;
        self.retrieval.validate()?;
        self.rubric.validate()?;
        Ok(())
    }
}

/// Runs audits against one embedding backend and one generator.
///
/// Every run builds its own [`VectorStore`]; nothing is shared between
/// runs, so one `Auditor` can serve concurrent audits.
pub struct Auditor {
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn Generator>,
    settings: AuditSettings,
    observer: Arc<dyn AuditObserver>,
}

impl Auditor {
    /// # Errors
    ///
    /// [`ConfigError`] if `settings` fail validation or the embedder
    /// reports a zero dimension.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn Generator>,
        settings: AuditSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        if embedder.dims() == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        Ok(Self {
            embedder,
            generator,
            settings,
            observer: Arc::new(NoopObserver),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn AuditObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    /// Chunk and embed `text` into a fresh store.
    ///
    /// # Errors
    ///
    /// - [`IndexError::NoChunks`] when the text yields no chunks.
    /// - [`IndexError::AllEmbeddingsFailed`] when not a single chunk
    ///   could be embedded. Such a store would rank every chunk at 0.0.
    pub async fn build_index(&self, text: &str) -> Result<VectorStore, IndexError> {
        let chunks = split_text(text, &self.settings.chunking)?;
        if chunks.is_empty() {
            return Err(IndexError::NoChunks);
        }
        let total = chunks.len();

        let mut store = VectorStore::new(self.embedder.clone(), self.settings.rate_limit);
        let failed = store
            .add_texts_observed(chunks, self.observer.as_ref())
            .await;
        if failed == total {
            return Err(IndexError::AllEmbeddingsFailed(total));
        }
        Ok(store)
    }

    /// Score one section. Failures come back as failed evidence.
    pub async fn score_section(
        &self,
        key: SectionKey,
        store: Option<&VectorStore>,
        full_text: &str,
    ) -> AuditEvidence {
        let section = self.settings.rubric.section(key);
        let result = try_score_section(
            self.generator.as_ref(),
            section,
            store,
            full_text,
            &self.settings.retrieval,
        )
        .await;
        match result {
            Ok(evidence) => {
                self.observer.section_scored(key, &evidence, None);
                evidence
            }
            Err(e) => {
                let evidence = failed_evidence(section, &e);
                self.observer.section_scored(key, &evidence, Some(&e));
                evidence
            }
        }
    }

    /// Audit one document's extracted text.
    ///
    /// # Errors
    ///
    /// [`AuditError::EmptyDocument`] if `text` has no non-whitespace
    /// content. Every other failure degrades the report instead.
    pub async fn run(&self, text: &str) -> Result<AuditReport, AuditError> {
        let span = info_span!(
            "audit",
            chars = text.chars().count(),
            embedder = self.embedder.model_name(),
            generator = self.generator.model_name()
        );
        self.run_inner(text).instrument(span).await
    }

    async fn run_inner(&self, text: &str) -> Result<AuditReport, AuditError> {
        let started = Instant::now();
        self.observer.stage(AuditStage::Started);

        if text.trim().is_empty() {
            return Err(AuditError::EmptyDocument);
        }
        self.observer.stage(AuditStage::Extracted);

        let (store, mode) = match self.build_index(text).await {
            Ok(store) => {
                let stats = store.stats();
                info!(
                    chunks = stats.chunk_count,
                    zero_vectors = stats.zero_vector_count,
                    "index built"
                );
                self.observer.stage(AuditStage::Indexed);
                (Some(store), ContextMode::Retrieval(stats))
            }
            Err(e) => {
                warn!(error = %e, "indexing failed, scoring on document prefix");
                self.observer.index_failed(&e);
                self.observer.stage(AuditStage::IndexFailed);
                (
                    None,
                    ContextMode::Prefix {
                        reason: e.to_string(),
                    },
                )
            }
        };

        let policy = self
            .score_section(SectionKey::PolicyAlignment, store.as_ref(), text)
            .await;
        self.observer.stage(AuditStage::ScoredPolicy);

        let implementation = self
            .score_section(SectionKey::ImplementationReadiness, store.as_ref(), text)
            .await;
        self.observer.stage(AuditStage::ScoredImplementation);

        let rubric = &self.settings.rubric;
        let report = AuditReport::new(
            SectionResult {
                title: rubric.policy.title.clone(),
                evidence: policy,
            },
            SectionResult {
                title: rubric.implementation.title.clone(),
                evidence: implementation,
            },
            started.elapsed(),
            mode,
        );
        self.observer.stage(AuditStage::Aggregated);

        info!(
            total = report.total_score(),
            max = report.max_score(),
            rag = report.rag_used(),
            elapsed_ms = report.elapsed().as_millis() as u64,
            "audit complete"
        );
        self.observer.finished(&report);
        self.observer.stage(AuditStage::Done);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbedMode;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Fixed(usize);

    #[async_trait]
    impl EmbeddingProvider for Fixed {
        fn model_name(&self) -> &str {
            "fixed"
        }
        fn dims(&self) -> usize {
            self.0
        }
        async fn embed(&self, _text: &str, _mode: EmbedMode) -> Result<Vec<f32>> {
            Ok(vec![0.5; self.0])
        }
    }

    struct Down;

    #[async_trait]
    impl EmbeddingProvider for Down {
        fn model_name(&self) -> &str {
            "down"
        }
        fn dims(&self) -> usize {
            8
        }
        async fn embed(&self, _text: &str, _mode: EmbedMode) -> Result<Vec<f32>> {
            bail!("connection refused")
        }
    }

    struct Silent;

    #[async_trait]
    impl Generator for Silent {
        fn model_name(&self) -> &str {
            "silent"
        }
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok("{}".to_string())
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<AuditStage>>);

    impl AuditObserver for Recorder {
        fn stage(&self, stage: AuditStage) {
            self.0.lock().unwrap().push(stage);
        }
    }

    fn settings() -> AuditSettings {
        AuditSettings {
            rate_limit: RateLimit::none(),
            ..AuditSettings::default()
        }
    }

    #[test]
    fn test_bad_settings_refuse_to_start() {
        let mut s = settings();
        s.chunking.overlap = s.chunking.chunk_size;
        let err = Auditor::new(Arc::new(Fixed(4)), Arc::new(Silent), s).err();
        assert!(matches!(err, Some(ConfigError::OverlapTooLarge { .. })));

        let err = Auditor::new(Arc::new(Fixed(0)), Arc::new(Silent), settings()).err();
        assert_eq!(err, Some(ConfigError::ZeroDimension));
    }

    #[tokio::test]
    async fn test_empty_document_is_hard_failure() {
        let auditor = Auditor::new(Arc::new(Fixed(4)), Arc::new(Silent), settings()).unwrap();
        let err = auditor.run(" \n\t ").await.unwrap_err();
        assert!(matches!(err, AuditError::EmptyDocument));
    }

    #[tokio::test]
    async fn test_all_embeddings_failed_is_index_error() {
        let auditor = Auditor::new(Arc::new(Down), Arc::new(Silent), settings()).unwrap();
        let err = auditor.build_index("some text").await.err();
        assert_eq!(err, Some(IndexError::AllEmbeddingsFailed(1)));
    }

    #[tokio::test]
    async fn test_stage_sequence_on_fallback() {
        let recorder = Arc::new(Recorder::default());
        let auditor = Auditor::new(Arc::new(Down), Arc::new(Silent), settings())
            .unwrap()
            .with_observer(recorder.clone());
        let report = auditor.run("report body").await.unwrap();
        assert!(!report.rag_used());
        assert_eq!(report.total_score(), 0);
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![
                AuditStage::Started,
                AuditStage::Extracted,
                AuditStage::IndexFailed,
                AuditStage::ScoredPolicy,
                AuditStage::ScoredImplementation,
                AuditStage::Aggregated,
                AuditStage::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_stage_sequence_with_index() {
        let recorder = Arc::new(Recorder::default());
        let auditor = Auditor::new(Arc::new(Fixed(4)), Arc::new(Silent), settings())
            .unwrap()
            .with_observer(recorder.clone());
        let report = auditor.run("report body").await.unwrap();
        assert!(report.rag_used());
        assert_eq!(report.index_stats().map(|s| s.chunk_count), Some(1));
        assert_eq!(recorder.0.lock().unwrap()[2], AuditStage::Indexed);
    }
}
