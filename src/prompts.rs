//! Instruction prompt for the figure-extraction request.
//!
//! The prompt and the document text are concatenated with no separator of
//! their own; the instruction is responsible for ending in whatever
//! whitespace it wants between itself and the document. Callers can
//! override it via [`crate::config::ExtractionConfig::prompt`].

/// Default instruction: total assets with their date, Portuguese source text,
/// answer as JSON.
pub const DEFAULT_PROMPT: &str = "Extract the total asset or total assets together with their date. \
The text is in Portuguese. Produce a JSON object with that information:\n\n";

/// Compose the full request text: instruction followed directly by the document.
pub fn compose(instruction: &str, document_text: &str) -> String {
    let mut out = String::with_capacity(instruction.len() + document_text.len());
    out.push_str(instruction);
    out.push_str(document_text);
    out
}
