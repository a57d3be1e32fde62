use std::fs;

use appraisal_harness::extract::{extract, source_from_path, DocumentSource, ExtractError};
use tempfile::TempDir;

/// Minimal valid one-page PDF with the phrase "appraisal test phrase".
fn minimal_pdf_with_phrase() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(b"4 0 obj << /Length 53 >> stream\nBT /F1 12 Tf 100 700 Td (appraisal test phrase) Tj ET\nendstream endobj\n");
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o1).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o2).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o3).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o4).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o5).as_bytes());
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

#[test]
fn pdf_text_is_extracted() {
    let out = extract(&DocumentSource::Pdf(minimal_pdf_with_phrase())).unwrap();
    assert!(
        out.text.contains("appraisal test phrase"),
        "got: {:?}",
        out.text
    );
    assert_eq!(out.pages_total, 1);
}

#[test]
fn source_from_path_picks_variant() {
    let tmp = TempDir::new().unwrap();

    let pdf = tmp.path().join("report.PDF");
    fs::write(&pdf, minimal_pdf_with_phrase()).unwrap();
    assert!(matches!(source_from_path(&pdf).unwrap(), DocumentSource::Pdf(_)));

    let md = tmp.path().join("report.md");
    fs::write(&md, "# 사업 개요\n\n본 사업은").unwrap();
    match source_from_path(&md).unwrap() {
        DocumentSource::Text(t) => assert!(t.starts_with("# 사업 개요")),
        other => panic!("expected text, got {:?}", other),
    }

    let bare = tmp.path().join("REPORT");
    fs::write(&bare, "plain").unwrap();
    assert!(matches!(source_from_path(&bare).unwrap(), DocumentSource::Text(_)));
}

#[test]
fn missing_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let err = source_from_path(&tmp.path().join("absent.txt")).unwrap_err();
    assert!(err.to_string().contains("absent.txt"));
}

#[test]
fn empty_text_file_is_a_hard_failure() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("blank.txt");
    fs::write(&path, "\n\n   \n").unwrap();
    let source = source_from_path(&path).unwrap();
    assert!(matches!(extract(&source), Err(ExtractError::Empty)));
}
