//! Text aggregation: per-page OCR results → one document string.
//!
//! Only recognised pages contribute. Skipped pages leave no placeholder, so
//! once a page fails the block positions no longer line up with page numbers.

use crate::error::ExtractError;
use crate::output::PageText;

/// Separator placed between consecutive page texts.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Join the text of every recognised page, in the order given.
pub fn join_pages(pages: &[PageText]) -> String {
    let texts: Vec<&str> = pages.iter().filter_map(|p| p.text.as_deref()).collect();
    texts.join(PAGE_SEPARATOR)
}

/// Refuse an empty aggregate: there is nothing to ask the model about.
pub fn require_text(text: &str) -> Result<&str, ExtractError> {
    if text.is_empty() {
        return Err(ExtractError::EmptyText);
    }
    Ok(text)
}
