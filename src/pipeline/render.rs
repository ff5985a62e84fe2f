//! Page rasteriser: open the PDF with pdfium and render pages to PNG bytes.
//!
//! ## Threading
//!
//! pdfium is blocking and not async-aware, so the whole render loop runs on
//! a blocking-pool thread and hands each encoded page to the OCR stage
//! through a bounded channel. The channel capacity bounds how far rendering
//! runs ahead of OCR.
//!
//! ## Document lifetime
//!
//! The `PdfDocument` is owned by [`render_blocking`] and dropped when it
//! returns, on every path: normal completion, a page error, a closed channel
//! or an early `?`. No explicit close call exists to be skipped.

use crate::config::PageSelection;
use crate::error::{ExtractError, PageError};
use crate::pipeline::encode;
use crate::progress::ProgressCallback;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// One rendered page on its way to OCR.
#[derive(Debug)]
pub struct RenderedPage {
    /// 1-indexed page number.
    pub page_num: usize,
    /// PNG bytes, or the reason the page could not be rendered.
    pub png: Result<Vec<u8>, PageError>,
}

/// Everything the render thread needs, owned so it can cross into `spawn_blocking`.
#[derive(Clone)]
pub struct RenderJob {
    pub path: PathBuf,
    pub scale: f32,
    pub password: Option<String>,
    pub pages: PageSelection,
    pub pdfium_lib_path: Option<PathBuf>,
    pub progress: Option<ProgressCallback>,
}

/// Start rendering on the blocking pool.
///
/// Pages are sent on `tx` in ascending order. The task resolves to the
/// document's total page count, or to the fatal error that prevented the
/// document from being opened (in which case nothing is sent).
pub fn spawn_renderer(
    job: RenderJob,
    tx: mpsc::Sender<RenderedPage>,
) -> JoinHandle<Result<usize, ExtractError>> {
    tokio::task::spawn_blocking(move || render_blocking(&job, &tx))
}

/// Bind to the pdfium shared library.
///
/// Resolution order: the explicit `lib_path`, a library next to the working
/// directory, then the system library search path.
pub fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, ExtractError> {
    let bindings = match lib_path {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ExtractError::PdfiumUnavailable(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of the render loop.
fn render_blocking(job: &RenderJob, tx: &mpsc::Sender<RenderedPage>) -> Result<usize, ExtractError> {
    let pdfium = bind_pdfium(job.pdfium_lib_path.as_deref())?;

    let document = pdfium
        .load_pdf_from_file(&job.path, job.password.as_deref())
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            let detail = if err_str.to_lowercase().contains("password") {
                if job.password.is_some() {
                    "wrong password".to_string()
                } else {
                    "the document is encrypted and requires a password".to_string()
                }
            } else {
                err_str
            };
            ExtractError::OpenFailed {
                path: job.path.clone(),
                detail,
            }
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    let indices = job.pages.to_indices(total_pages);
    info!(
        "PDF opened: {} pages, {} selected",
        total_pages,
        indices.len()
    );
    if let Some(ref cb) = job.progress {
        cb.on_document_opened(total_pages, indices.len());
    }

    let render_config = PdfRenderConfig::new().scale_page_by_factor(job.scale);

    for idx in indices {
        let page_num = idx + 1;
        let png = render_page(&pages, idx, &render_config);
        if tx.blocking_send(RenderedPage { page_num, png }).is_err() {
            debug!("OCR stage stopped receiving; ending render at page {}", page_num);
            break;
        }
    }

    Ok(total_pages)
}

/// Render and encode one page. Any failure is confined to this page.
fn render_page(
    pages: &PdfPages<'_>,
    idx: usize,
    render_config: &PdfRenderConfig,
) -> Result<Vec<u8>, PageError> {
    let page_num = idx + 1;
    let failed = |detail: String| PageError::RenderFailed {
        page: page_num,
        detail,
    };

    let index = idx
        .try_into()
        .map_err(|_| failed(format!("page index {} exceeds pdfium range", idx)))?;
    let page = pages.get(index).map_err(|e| failed(format!("{:?}", e)))?;
    let bitmap = page
        .render_with_config(render_config)
        .map_err(|e| failed(format!("{:?}", e)))?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        page_num,
        image.width(),
        image.height()
    );

    encode::encode_png(&image).map_err(|e| failed(format!("image encoding failed: {}", e)))
}
