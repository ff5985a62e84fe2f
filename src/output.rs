//! Result types produced by an extraction run.

use crate::error::PageError;
use serde::{Deserialize, Serialize};

/// Outcome of OCR for one selected page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    /// 1-indexed page number in the PDF.
    pub page_num: usize,
    /// Recognised text; `None` when the page was skipped.
    pub text: Option<String>,
    /// Why the page was skipped, if it was.
    pub error: Option<PageError>,
    /// Wall-clock time spent on the OCR request.
    pub duration_ms: u64,
}

impl PageText {
    pub fn recognised(page_num: usize, text: String, duration_ms: u64) -> Self {
        Self {
            page_num,
            text: Some(text),
            error: None,
            duration_ms,
        }
    }

    pub fn skipped(error: PageError, duration_ms: u64) -> Self {
        Self {
            page_num: error.page(),
            text: None,
            error: Some(error),
            duration_ms,
        }
    }
}

/// OCR result for a whole document, before any answer is requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentText {
    /// Recognised pages joined with a blank line, failed pages omitted.
    pub text: String,
    /// Per-page outcomes in ascending page order.
    pub pages: Vec<PageText>,
    /// Page count of the PDF.
    pub total_pages: usize,
    /// Time spent rendering and recognising.
    pub duration_ms: u64,
}

impl DocumentText {
    pub fn recognised_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.text.is_some()).count()
    }

    pub fn skipped_pages(&self) -> usize {
        self.pages.len() - self.recognised_pages()
    }
}

/// Full result of [`crate::extract::extract`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// The answer text exactly as returned by the model.
    pub answer: String,
    /// The aggregated OCR text that was sent after the prompt.
    pub document_text: String,
    /// Per-page OCR outcomes in ascending page order.
    pub pages: Vec<PageText>,
    pub stats: ExtractionStats,
}

/// Counters and timings for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub total_pages: usize,
    pub selected_pages: usize,
    pub recognised_pages: usize,
    pub skipped_pages: usize,
    pub ocr_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}
