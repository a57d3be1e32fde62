//! Text extraction for appraisal documents (PDF and plain text).
//!
//! PDFs are read page by page with `lopdf`. A page that fails to decode is
//! logged and skipped; the remaining pages still count. If the per-page
//! pass recovers nothing, the whole document is retried through
//! `pdf-extract`. Zero recovered characters is [`ExtractError::Empty`],
//! which stops the audit before indexing.

use std::path::Path;

use anyhow::Context;
use thiserror::Error;
use tracing::{debug, warn};

/// Extraction error. Never a panic.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("document contains no extractable text")]
    Empty,
}

/// A document handed to the pipeline.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// A paginated binary document.
    Pdf(Vec<u8>),
    /// Raw text, used as-is.
    Text(String),
}

/// Extracted text plus page accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    /// Pages in the document (1 for plain text).
    pub pages_total: usize,
    /// Pages skipped because they could not be decoded.
    pub pages_failed: usize,
}

impl ExtractedText {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Extract plain text from `source`.
pub fn extract(source: &DocumentSource) -> Result<ExtractedText, ExtractError> {
    let extracted = match source {
        DocumentSource::Text(text) => ExtractedText {
            text: text.clone(),
            pages_total: 1,
            pages_failed: 0,
        },
        DocumentSource::Pdf(bytes) => extract_pdf(bytes)?,
    };
    if extracted.text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(extracted)
}

fn extract_pdf(bytes: &[u8]) -> Result<ExtractedText, ExtractError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let pages = doc.get_pages();
    let pages_total = pages.len();

    let mut text = String::new();
    let mut pages_failed = 0usize;
    for &page_number in pages.keys() {
        match doc.extract_text(&[page_number]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => {
                warn!(page = page_number, error = %e, "page extraction failed, skipping");
                pages_failed += 1;
            }
        }
    }

    if text.trim().is_empty() {
        debug!(pages_total, "per-page pass found no text, trying whole-document extraction");
        text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    }

    Ok(ExtractedText {
        text,
        pages_total,
        pages_failed,
    })
}

/// Load `path` as a [`DocumentSource`], choosing the variant by extension:
/// `.pdf` is binary, `.txt`, `.md` or no extension is text.
pub fn source_from_path(path: &Path) -> anyhow::Result<DocumentSource> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(DocumentSource::Pdf(bytes))
        }
        Some("txt") | Some("md") | None => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(DocumentSource::Text(text))
        }
        Some(other) => Err(ExtractError::UnsupportedContentType(format!(".{}", other)))
            .with_context(|| format!("Cannot extract {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract(&DocumentSource::Pdf(b"not a pdf".to_vec())).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn whitespace_text_is_empty() {
        let err = extract(&DocumentSource::Text(" \n\n ".into())).unwrap_err();
        assert!(matches!(err, ExtractError::Empty));
    }

    #[test]
    fn text_passes_through() {
        let out = extract(&DocumentSource::Text("사업 개요".into())).unwrap();
        assert_eq!(out.text, "사업 개요");
        assert_eq!(out.pages_total, 1);
        assert_eq!(out.char_count(), 5);
    }

    #[test]
    fn unknown_extension_rejected() {
        let err = source_from_path(Path::new("report.docx")).unwrap_err();
        assert!(format!("{:#}", err).contains("unsupported content-type: .docx"));
    }
}
