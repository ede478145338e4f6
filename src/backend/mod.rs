//! PDF engine boundary: load, measure, rasterise, draw, save.
//!
//! The pipeline never touches pdfium types directly. It sees a
//! [`PdfDocumentHandle`]: a strongly typed, owned handle whose lifetime is
//! scoped by [`PdfBackend::with_document`]. The scope matters for pdfium:
//! the library is bound, the document opened, used, and closed on one
//! blocking thread, and nothing outlives the callback.
//!
//! [`pdfium::PdfiumBackend`] is the production implementation. Tests plug in
//! in-memory fakes through [`crate::RedactionConfig::pdf_backend`].

pub mod pdfium;

use crate::error::{EngineError, RedactError};
use crate::model::{PageSize, PdfRect, RenderScale, RgbColor};
use image::DynamicImage;

/// Capabilities the pipeline needs from an opened PDF.
pub trait PdfDocumentHandle {
    fn page_count(&self) -> usize;

    /// Page size in PDF points.
    fn page_size(&self, index: usize) -> Result<PageSize, EngineError>;

    /// Rasterise one page at `scale` (1.0 = one pixel per point).
    fn render_page(&self, index: usize, scale: RenderScale) -> Result<DynamicImage, EngineError>;

    /// Draw an opaque filled rectangle in PDF space (bottom-left origin).
    fn draw_filled_rect(
        &mut self,
        index: usize,
        rect: PdfRect,
        color: RgbColor,
    ) -> Result<(), EngineError>;

    /// Serialise the document, including any drawn rectangles.
    fn save(&self) -> Result<Vec<u8>, EngineError>;
}

/// A PDF engine that can open documents from bytes.
pub trait PdfBackend: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Open `pdf` and hand the document to `f` for the duration of the call.
    ///
    /// The byte buffer is consumed. Load failures map to
    /// [`RedactError::CorruptPdf`], [`RedactError::PasswordRequired`] or
    /// [`RedactError::WrongPassword`]; errors returned by `f` are passed
    /// through unchanged.
    fn with_document(
        &self,
        pdf: Vec<u8>,
        password: Option<&str>,
        f: &mut dyn FnMut(&mut dyn PdfDocumentHandle) -> Result<(), RedactError>,
    ) -> Result<(), RedactError>;
}

/// Typed convenience over [`PdfBackend::with_document`] that returns the
/// callback's value.
pub fn open_document<R>(
    backend: &dyn PdfBackend,
    pdf: Vec<u8>,
    password: Option<&str>,
    f: impl FnOnce(&mut dyn PdfDocumentHandle) -> Result<R, RedactError>,
) -> Result<R, RedactError> {
    let mut f = Some(f);
    let mut out = None;
    backend.with_document(pdf, password, &mut |doc| {
        let f = f
            .take()
            .ok_or_else(|| RedactError::Internal("document callback invoked twice".into()))?;
        out = Some(f(doc)?);
        Ok(())
    })?;
    out.ok_or_else(|| {
        RedactError::Internal(format!(
            "PDF backend '{}' returned without opening the document",
            backend.name()
        ))
    })
}
