//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the pipeline renders and recognises each page.
//!
//! # Example
//!
//! ```rust
//! use pdf_ocr_extract::{ExtractionProgressCallback, ExtractionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     recognised: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, text_len: usize) {
//!         self.recognised.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {} recognised ({} chars)", page_num, text_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { recognised: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder("key")
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it processes each page.
///
/// `on_document_opened` is called from the blocking render thread; the page
/// events may arrive from different tasks when `ocr_concurrency > 1`.
/// All methods default to no-ops.
pub trait ExtractionProgressCallback: Send + Sync {
    /// The PDF was opened; `selected_pages` will be rendered.
    fn on_document_opened(&self, total_pages: usize, selected_pages: usize) {
        let _ = (total_pages, selected_pages);
    }

    /// The OCR request for a page is about to be sent.
    fn on_page_start(&self, page_num: usize) {
        let _ = page_num;
    }

    /// A page produced text.
    fn on_page_complete(&self, page_num: usize, text_len: usize) {
        let _ = (page_num, text_len);
    }

    /// A page was skipped.
    fn on_page_skipped(&self, page_num: usize, reason: &str) {
        let _ = (page_num, reason);
    }

    /// The answer request is about to be sent.
    fn on_answer_start(&self, text_len: usize) {
        let _ = text_len;
    }

    /// The run finished (successfully or not).
    fn on_run_complete(&self, recognised_pages: usize, skipped_pages: usize) {
        let _ = (recognised_pages, skipped_pages);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        skipped: AtomicUsize,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_page_skipped(&self, _page_num: usize, _reason: &str) {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn default_methods_are_noops() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_document_opened(3, 3);
        cb.on_page_start(1);
        cb.on_page_complete(1, 10);
        cb.on_run_complete(1, 0);
    }

    #[test]
    fn overridden_method_is_called() {
        let cb = Arc::new(TrackingCallback {
            skipped: AtomicUsize::new(0),
        });
        let dyn_cb: ProgressCallback = cb.clone();
        dyn_cb.on_page_skipped(2, "no text");
        dyn_cb.on_page_complete(3, 5);
        assert_eq!(cb.skipped.load(Ordering::SeqCst), 1);
    }
}
