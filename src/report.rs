//! Outcome → the one string the CLI prints.
//!
//! A success prints the payload verbatim (the model's answer, or the OCR
//! text in text-only mode). A failure prints the error's `Display`, which
//! already carries the user-facing wording and any recoverable detail.

use crate::error::ExtractError;
use crate::output::{DocumentText, ExtractionOutput};

/// A successful run result that has a printable payload.
pub trait Reportable {
    fn report_text(&self) -> &str;
}

impl Reportable for ExtractionOutput {
    fn report_text(&self) -> &str {
        &self.answer
    }
}

impl Reportable for DocumentText {
    fn report_text(&self) -> &str {
        &self.text
    }
}

/// Render any run outcome as a single human-readable string.
pub fn report_outcome<T: Reportable>(outcome: &Result<T, ExtractError>) -> String {
    match outcome {
        Ok(value) => value.report_text().to_string(),
        Err(e) => e.to_string(),
    }
}
