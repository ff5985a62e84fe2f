//! Error types for the pdf-ocr-extract library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`]: **Fatal**: the run cannot produce an answer (missing
//!   API key, unreadable PDF, no text on any page, the answer request
//!   failed). Returned as `Err(ExtractError)` from the `extract*` functions.
//!
//! * [`PageError`]: **Non-fatal**: a single page could not be rendered or
//!   recognised. Stored inside [`crate::output::PageText`]; the page is
//!   skipped and the run continues with the next one.
//!
//! Both expose an [`ErrorKind`] so callers can branch on the failure class
//! without inspecting message text. The `Display` output of each variant is
//! the human-readable report printed by the CLI.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification shared by [`ExtractError`] and [`PageError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Configuration is incomplete (missing API key, invalid knob).
    Config,
    /// The input PDF does not exist.
    NotFound,
    /// The input PDF exists but could not be opened.
    OpenFailed,
    /// A single page failed to render or OCR.
    PageFailed,
    /// No page produced any text; the answer request was never sent.
    EmptyText,
    /// The answer request never obtained a response.
    TransportError,
    /// The answer endpoint returned a non-2xx status.
    HttpError,
    /// The answer response did not have the expected structure.
    ShapeError,
    /// Anything else.
    Unknown,
}

/// Detail recovered from a non-2xx answer response body.
#[derive(Debug, Clone)]
pub enum HttpErrorDetails {
    /// The body parsed as JSON.
    Json(serde_json::Value),
    /// The body was not JSON; kept verbatim.
    Raw(String),
}

/// All fatal errors returned by the pdf-ocr-extract library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageText`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// The generative-text API key is not set (or is empty).
    #[error("Error: the environment variable {var} is not set.\nSet it to your Gemini API key (or add it to a .env file).")]
    MissingApiKey { var: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Document errors ───────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Error: PDF file not found at path: {}", .path.display())]
    NotFound { path: PathBuf },

    /// The file exists but could not be opened as a PDF.
    #[error("Error opening PDF '{}': {detail}", .path.display())]
    OpenFailed { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Error opening PDF: failed to bind to the pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or place the library next to the binary."
    )]
    PdfiumUnavailable(String),

    // ── Aggregation ───────────────────────────────────────────────────────
    /// Every page failed or returned no text.
    #[error("Warning: no text could be extracted from any page of the PDF.")]
    EmptyText,

    // ── Answer request errors ─────────────────────────────────────────────
    /// The request never produced a response (DNS, TLS, connect, timeout).
    #[error("Error in request to the Gemini API: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-2xx status.
    #[error("Error in request to the Gemini API: {message}\n{}", format_http_details(.status, .details))]
    HttpStatus {
        /// The status error as raised by the HTTP client.
        message: String,
        status: u16,
        details: HttpErrorDetails,
    },

    /// The response has no (or an empty) `candidates` list.
    #[error("Error: Gemini response without 'candidates'.")]
    NoCandidates,

    /// The first candidate has no (or an empty) `content.parts` list.
    #[error("Error: Gemini response without 'parts'.")]
    NoParts,

    /// The first part has no `text` field.
    #[error("Error: Gemini response without 'text'.")]
    NoText,

    /// The response is not shaped as expected; the raw body is kept.
    #[error("Unexpected Gemini response format ({detail}).\nFull Gemini response (for debugging):\n{raw}")]
    UnexpectedShape { detail: String, raw: String },

    /// An `edgequake-llm` provider failed to produce an answer.
    #[error("Error in request to LLM provider '{provider}': {detail}")]
    ProviderFailed { provider: String, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("General error while processing the PDF: {0}")]
    Internal(String),
}

fn format_http_details(status: &u16, details: &HttpErrorDetails) -> String {
    match details {
        HttpErrorDetails::Json(value) => format!("Error details: {value}"),
        HttpErrorDetails::Raw(text) => {
            format!("Status code: {status}\nResponse (not JSON): {text}")
        }
    }
}

impl ExtractError {
    /// The failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::MissingApiKey { .. } | ExtractError::InvalidConfig(_) => {
                ErrorKind::Config
            }
            ExtractError::NotFound { .. } => ErrorKind::NotFound,
            ExtractError::OpenFailed { .. } | ExtractError::PdfiumUnavailable(_) => {
                ErrorKind::OpenFailed
            }
            ExtractError::EmptyText => ErrorKind::EmptyText,
            ExtractError::Transport { .. } => ErrorKind::TransportError,
            ExtractError::HttpStatus { .. } => ErrorKind::HttpError,
            ExtractError::NoCandidates
            | ExtractError::NoParts
            | ExtractError::NoText
            | ExtractError::UnexpectedShape { .. } => ErrorKind::ShapeError,
            ExtractError::ProviderFailed { .. } | ExtractError::Internal(_) => ErrorKind::Unknown,
        }
    }

    /// Wrap a reqwest error that occurred before any response was obtained.
    ///
    /// The URL is stripped because it carries the API key as a query parameter.
    pub(crate) fn transport(e: reqwest::Error) -> Self {
        ExtractError::Transport {
            source: e.without_url(),
        }
    }
}

/// A non-fatal error for a single page.
///
/// Stored alongside [`crate::output::PageText`] when a page is skipped.
/// The run continues with the next page.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum PageError {
    /// Page rasterisation or PNG encoding failed.
    #[error("Error processing page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The OCR request failed at the transport or HTTP level.
    #[error("Warning: OCR request for page {page} failed: {detail}")]
    OcrRequestFailed { page: usize, detail: String },

    /// The OCR service reported an error for this page.
    #[error("Warning: OCR error on page {page}: {message}")]
    OcrServiceError { page: usize, message: String },

    /// The OCR service found no text on this page.
    #[error("Warning: no text could be extracted from page {page}.")]
    NoText { page: usize },
}

impl PageError {
    /// Always [`ErrorKind::PageFailed`].
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::PageFailed
    }

    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RenderFailed { page, .. }
            | PageError::OcrRequestFailed { page, .. }
            | PageError::OcrServiceError { page, .. }
            | PageError::NoText { page } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_names_path() {
        let e = ExtractError::NotFound {
            path: PathBuf::from("orestes.pdf"),
        };
        assert!(e.to_string().contains("orestes.pdf"));
        assert_eq!(e.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn http_status_json_details_display() {
        let e = ExtractError::HttpStatus {
            message: "HTTP status client error (400 Bad Request)".into(),
            status: 400,
            details: HttpErrorDetails::Json(serde_json::json!({
                "error": {"message": "API key not valid"}
            })),
        };
        let msg = e.to_string();
        assert!(msg.contains("400 Bad Request"), "got: {msg}");
        assert!(msg.contains("API key not valid"), "got: {msg}");
        assert_eq!(e.kind(), ErrorKind::HttpError);
    }

    #[test]
    fn http_status_raw_details_display() {
        let e = ExtractError::HttpStatus {
            message: "HTTP status server error (502 Bad Gateway)".into(),
            status: 502,
            details: HttpErrorDetails::Raw("<html>bad gateway</html>".into()),
        };
        let msg = e.to_string();
        assert!(msg.contains("Status code: 502"), "got: {msg}");
        assert!(msg.contains("<html>bad gateway</html>"), "got: {msg}");
    }

    #[test]
    fn shape_errors_share_kind() {
        assert_eq!(ExtractError::NoCandidates.kind(), ErrorKind::ShapeError);
        assert_eq!(ExtractError::NoParts.kind(), ErrorKind::ShapeError);
        assert!(ExtractError::NoCandidates.to_string().contains("'candidates'"));
        assert!(ExtractError::NoParts.to_string().contains("'parts'"));
    }

    #[test]
    fn page_error_reports_page() {
        let e = PageError::OcrServiceError {
            page: 4,
            message: "Bad image data".into(),
        };
        assert_eq!(e.page(), 4);
        assert_eq!(e.kind(), ErrorKind::PageFailed);
        assert!(e.to_string().contains("page 4"));
    }
}
