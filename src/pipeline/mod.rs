//! Pipeline stages for PDF figure extraction.
//!
//! Each submodule implements exactly one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ ocr ──▶ aggregate ──▶ llm
//! (path)    (pdfium)   (PNG)     (Vision)  ("\n\n")     (Gemini)
//! ```
//!
//! 1. [`input`]: validate the user-supplied path before pdfium opens it
//! 2. [`render`]: rasterise selected pages on the blocking pool and stream
//!    them through a bounded channel
//! 3. [`encode`]: RGB PNG bytes for the OCR request
//! 4. [`ocr`]: one `DOCUMENT_TEXT_DETECTION` request per page; failures
//!    skip the page
//! 5. [`aggregate`]: join recognised pages, refuse to continue on empty text
//! 6. [`llm`]: single answer request, response walked field by field

pub mod aggregate;
pub mod encode;
pub mod input;
pub mod llm;
pub mod ocr;
pub mod render;
