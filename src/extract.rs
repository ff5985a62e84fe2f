//! Extraction entry points.
//!
//! [`extract`] runs the whole pipeline: render, OCR, aggregate, answer.
//! [`recognise`] stops after aggregation and never contacts the model.
//! Both have `_with` variants taking injected engines, which is how tests
//! and embedders swap the network clients out.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::output::{DocumentText, ExtractionOutput, ExtractionStats, PageText};
use crate::pipeline::llm::{self, AnswerClient};
use crate::pipeline::ocr::{OcrEngine, VisionClient};
use crate::pipeline::render::{self, RenderJob, RenderedPage};
use crate::pipeline::{aggregate, input};
use crate::progress::ExtractionProgressCallback;
use crate::prompts;
use futures::stream::{Stream, StreamExt};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

/// Extract the answer for a PDF on disk.
///
/// # Errors
/// Returns `Err(ExtractError)` only for fatal outcomes:
/// - file not found / not openable
/// - no page produced text (the model is never called)
/// - the answer request failed or its response had an unexpected shape
///
/// Individual page failures are not errors; see `output.pages`.
pub async fn extract(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let ocr: Arc<dyn OcrEngine> = Arc::new(VisionClient::from_config(config)?);
    let answer = llm::client_for(config)?;
    extract_with(path, config, ocr, answer).await
}

/// [`extract`] with caller-supplied OCR and answer engines.
pub async fn extract_with(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
    ocr: Arc<dyn OcrEngine>,
    answer: Arc<dyn AnswerClient>,
) -> Result<ExtractionOutput, ExtractError> {
    let started = Instant::now();
    info!("Starting extraction: {}", path.as_ref().display());

    let document = recognise_document(path.as_ref(), config, ocr).await?;
    answer_document(document, config, answer.as_ref(), started).await
}

/// OCR and aggregate a PDF without requesting an answer.
pub async fn recognise(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<DocumentText, ExtractError> {
    let ocr: Arc<dyn OcrEngine> = Arc::new(VisionClient::from_config(config)?);
    recognise_with(path, config, ocr).await
}

/// [`recognise`] with a caller-supplied OCR engine.
pub async fn recognise_with(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
    ocr: Arc<dyn OcrEngine>,
) -> Result<DocumentText, ExtractError> {
    let document = recognise_document(path.as_ref(), config, ocr).await?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(document.recognised_pages(), document.skipped_pages());
    }
    aggregate::require_text(&document.text)?;
    Ok(document)
}

/// Extract from PDF bytes held in memory.
///
/// The bytes are written to a managed temp file, removed when this returns.
pub async fn extract_from_bytes(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| ExtractError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| ExtractError::Internal(format!("tempfile write: {e}")))?;
    extract(tmp.path(), config).await
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally; do not call from async code.
pub fn extract_sync(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(path, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Render every selected page and OCR it, keeping page order.
async fn recognise_document(
    path: &Path,
    config: &ExtractionConfig,
    ocr: Arc<dyn OcrEngine>,
) -> Result<DocumentText, ExtractError> {
    let started = Instant::now();
    let path = input::resolve_local(path)?;

    let concurrency = config.ocr_concurrency.max(1);
    let (tx, rx) = mpsc::channel(concurrency);
    let job = RenderJob {
        path,
        scale: config.render_scale,
        password: config.password.clone(),
        pages: config.pages.clone(),
        pdfium_lib_path: config.pdfium_lib_path.clone(),
        progress: config.progress_callback.clone(),
    };
    let renderer = render::spawn_renderer(job, tx);

    let pages = recognise_pages(
        ReceiverStream::new(rx),
        ocr,
        concurrency,
        config.progress_callback.clone(),
    )
    .await;

    // An open failure sends nothing, so `pages` is empty and this error wins.
    let total_pages = renderer
        .await
        .map_err(|e| ExtractError::Internal(format!("render task failed: {e}")))??;

    let text = aggregate::join_pages(&pages);
    let document = DocumentText {
        text,
        pages,
        total_pages,
        duration_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        "OCR complete: {}/{} pages recognised, {} chars, {}ms",
        document.recognised_pages(),
        document.pages.len(),
        document.text.len(),
        document.duration_ms
    );
    Ok(document)
}

/// Drive OCR over the rendered-page stream with at most `concurrency`
/// requests in flight. Results come back in stream order.
async fn recognise_pages<S>(
    rendered: S,
    ocr: Arc<dyn OcrEngine>,
    concurrency: usize,
    progress: Option<Arc<dyn ExtractionProgressCallback>>,
) -> Vec<PageText>
where
    S: Stream<Item = RenderedPage>,
{
    rendered
        .map(|page| {
            let ocr = Arc::clone(&ocr);
            let progress = progress.clone();
            async move { recognise_one(ocr.as_ref(), page, progress.as_deref()).await }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

async fn recognise_one(
    ocr: &dyn OcrEngine,
    page: RenderedPage,
    progress: Option<&dyn ExtractionProgressCallback>,
) -> PageText {
    let started = Instant::now();
    let RenderedPage { page_num, png } = page;

    let result = match png {
        Ok(png) => {
            if let Some(cb) = progress {
                cb.on_page_start(page_num);
            }
            ocr.detect_text(page_num, &png).await
        }
        Err(e) => Err(e),
    };
    let duration_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(text) => {
            info!("Page {}: {} chars", page_num, text.len());
            if let Some(cb) = progress {
                cb.on_page_complete(page_num, text.len());
            }
            PageText::recognised(page_num, text, duration_ms)
        }
        Err(e) => {
            warn!("{}", e);
            if let Some(cb) = progress {
                cb.on_page_skipped(page_num, &e.to_string());
            }
            PageText::skipped(e, duration_ms)
        }
    }
}

/// Ask the model about the aggregated text.
async fn answer_document(
    document: DocumentText,
    config: &ExtractionConfig,
    answer: &dyn AnswerClient,
    started: Instant,
) -> Result<ExtractionOutput, ExtractError> {
    let progress = config.progress_callback.as_deref();
    let finish = |doc: &DocumentText| {
        if let Some(cb) = progress {
            cb.on_run_complete(doc.recognised_pages(), doc.skipped_pages());
        }
    };

    if let Err(e) = aggregate::require_text(&document.text) {
        warn!("{}", e);
        finish(&document);
        return Err(e);
    }

    if let Some(cb) = progress {
        cb.on_answer_start(document.text.len());
    }
    let llm_started = Instant::now();
    let composed = prompts::compose(&config.prompt, &document.text);
    let result = answer.answer(&composed).await;
    let llm_duration_ms = llm_started.elapsed().as_millis() as u64;
    finish(&document);
    let answer = result?;

    let stats = ExtractionStats {
        total_pages: document.total_pages,
        selected_pages: document.pages.len(),
        recognised_pages: document.recognised_pages(),
        skipped_pages: document.skipped_pages(),
        ocr_duration_ms: document.duration_ms,
        llm_duration_ms,
        total_duration_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        "Extraction complete: {} chars answer, {}ms total",
        answer.len(),
        stats.total_duration_ms
    );

    Ok(ExtractionOutput {
        answer,
        document_text: document.text,
        pages: document.pages,
        stats,
    })
}
