//! # pdf-ocr-extract
//!
//! Pull a specific figure (by default: total assets and their date) out of a
//! scanned PDF. Pages are rasterised with pdfium, read by Cloud Vision
//! document-text OCR, joined into one text and handed to a Gemini model
//! together with an instruction prompt. The model's answer is returned as-is.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      check the path exists and is a PDF
//!  ├─ 2. Render     rasterise pages at 3x via pdfium (spawn_blocking)
//!  ├─ 3. Encode     RGB PNG bytes, in memory only
//!  ├─ 4. OCR        DOCUMENT_TEXT_DETECTION per page; failed pages skipped
//!  ├─ 5. Aggregate  join page texts with a blank line
//!  └─ 6. Answer     one generateContent request, response parsed defensively
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_ocr_extract::{extract, report_outcome, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY (required), GOOGLE_VISION_API_KEY, GEMINI_MODEL
//!     let config = ExtractionConfig::from_env()?.build()?;
//!     let outcome = extract("orestes.pdf", &config).await;
//!     println!("{}", report_outcome(&outcome));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocr-extract` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf-ocr-extract = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, PageSelection};
pub use error::{ErrorKind, ExtractError, HttpErrorDetails, PageError};
pub use extract::{
    extract, extract_from_bytes, extract_sync, extract_with, recognise, recognise_with,
};
pub use output::{DocumentText, ExtractionOutput, ExtractionStats, PageText};
pub use pipeline::llm::{AnswerClient, GeminiClient, ProviderClient};
pub use pipeline::ocr::{OcrEngine, VisionClient};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use report::report_outcome;
