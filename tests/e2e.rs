//! End-to-end tests against the live Vision and Gemini APIs.
//!
//! These tests need real PDFs in `./test_cases/`, a pdfium library and
//! `GEMINI_API_KEY`. They are gated behind `E2E_ENABLED` so they do not run
//! in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 LD_LIBRARY_PATH=. cargo test --test e2e -- --nocapture

use pdf_ocr_extract::{
    extract, extract_from_bytes, recognise, report_outcome, ErrorKind, ExtractionConfig,
    PageSelection,
};
use std::path::PathBuf;

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip unless E2E_ENABLED is set and the PDF at `path` exists.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

fn live_config() -> ExtractionConfig {
    ExtractionConfig::from_env()
        .expect("GEMINI_API_KEY must be set for e2e tests")
        .language_hint("pt")
        .build()
        .unwrap()
}

#[tokio::test]
async fn e2e_orestes_total_assets() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("orestes.pdf"));
    let outcome = extract(&path, &live_config()).await;
    let report = report_outcome(&outcome);
    println!("{report}");

    let output = outcome.expect("extraction should succeed");
    assert!(!output.answer.trim().is_empty());
    assert!(output.stats.recognised_pages > 0);
    assert_eq!(
        output.stats.recognised_pages + output.stats.skipped_pages,
        output.stats.selected_pages
    );
}

#[tokio::test]
async fn e2e_first_page_text_only() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("orestes.pdf"));
    let mut config = live_config();
    config.pages = PageSelection::Single(1);

    let doc = recognise(&path, &config).await.expect("OCR should succeed");
    assert_eq!(doc.pages.len(), 1);
    assert!(!doc.text.is_empty());
    assert!(doc.total_pages >= 1);
}

#[tokio::test]
async fn e2e_bytes_input_matches_file_input() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("orestes.pdf"));
    let mut config = live_config();
    config.pages = PageSelection::Single(1);

    let bytes = std::fs::read(&path).unwrap();
    let output = extract_from_bytes(&bytes, &config)
        .await
        .expect("extraction from bytes should succeed");
    assert_eq!(output.stats.selected_pages, 1);
}

#[tokio::test]
async fn e2e_page_beyond_document_is_empty_text() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("orestes.pdf"));
    let mut config = live_config();
    config.pages = PageSelection::Single(100_000);

    let err = extract(&path, &config).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyText);
}
