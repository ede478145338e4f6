//! PDF rasterisation: render every page to a [`PixelBuffer`] at one scale.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! [`render_pages`] moves the work onto the blocking pool so the Tokio worker
//! threads never stall during CPU-heavy rendering.
//!
//! ## Why all or nothing?
//!
//! A page that fails to rasterise cannot be OCR'd, so any sensitive text on
//! it would silently survive. The first page failure aborts the run with
//! [`RedactError::PageConversion`]; no partial result is ever returned.

use super::run_blocking;
use crate::backend::{open_document, PdfBackend};
use crate::cancel::CancelToken;
use crate::config::RedactionConfig;
use crate::error::{RedactError, Stage};
use crate::model::{PixelBuffer, RasterDims, RenderScale};
use crate::progress::ProgressCallback;
use std::sync::Arc;
use tracing::{debug, info};

/// Every page of a document, rasterised.
#[derive(Debug, Clone)]
pub struct Rasterized {
    /// One buffer per page, in page order.
    pub pages: Vec<PixelBuffer>,
    /// The scale every page was rendered at.
    pub scale: RenderScale,
}

impl Rasterized {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Pixel dimensions per page, kept for the geometry pass after the
    /// images themselves are dropped.
    pub fn raster_dims(&self) -> Vec<RasterDims> {
        self.pages.iter().map(PixelBuffer::dims).collect()
    }
}

/// Rasterise every page of `pdf`.
///
/// Blocking; the buffer is consumed by the backend.
pub fn rasterize(
    backend: &dyn PdfBackend,
    pdf: Vec<u8>,
    scale: RenderScale,
    password: Option<&str>,
    cancel: &CancelToken,
    progress: Option<&ProgressCallback>,
) -> Result<Rasterized, RedactError> {
    if pdf.is_empty() {
        return Err(RedactError::InvalidInput {
            reason: "PDF buffer is empty".into(),
        });
    }

    open_document(backend, pdf, password, |doc| {
        let total = doc.page_count();
        if total == 0 {
            return Err(RedactError::NoPages);
        }
        info!(pages = total, %scale, backend = backend.name(), "Rasterising document");
        if let Some(cb) = progress {
            cb.on_run_start(total);
        }

        let mut pages = Vec::with_capacity(total);

        for index in 0..total {
            cancel.check(Stage::Rasterize)?;

            let conversion = |detail: String| RedactError::PageConversion {
                page: index + 1,
                detail,
            };
            let image = doc
                .render_page(index, scale)
                .map_err(|e| conversion(e.to_string()))?;
            if image.width() == 0 || image.height() == 0 {
                return Err(conversion("renderer produced an empty bitmap".into()));
            }

            debug!(
                page = index + 1,
                width = image.width(),
                height = image.height(),
                "Rendered page"
            );
            if let Some(cb) = progress {
                cb.on_page_rendered(index + 1, total);
            }

            pages.push(PixelBuffer::new(index, image));
        }

        Ok(Rasterized { pages, scale })
    })
}

/// Async wrapper over [`rasterize`] under the configured stage timeout.
pub async fn render_pages(
    backend: Arc<dyn PdfBackend>,
    pdf: Vec<u8>,
    config: &RedactionConfig,
) -> Result<Rasterized, RedactError> {
    let scale = config.render_scale;
    let password = config.password.clone();
    let progress = config.progress_callback.clone();

    run_blocking(Stage::Rasterize, config.stage_timeout_secs, &config.cancel, move |cancel| {
        rasterize(
            backend.as_ref(),
            pdf,
            scale,
            password.as_deref(),
            &cancel,
            progress.as_ref(),
        )
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_is_rejected_before_the_backend() {
        let backend = crate::backend::pdfium::PdfiumBackend::new(Some(
            "/nonexistent/libpdfium.so".into(),
        ));
        let err = rasterize(
            &backend,
            Vec::new(),
            RenderScale::default(),
            None,
            &CancelToken::new(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, RedactError::InvalidInput { .. }));
    }
}
