//! pdfium-backed implementation of [`PdfBackend`].
//!
//! ## Why bind per call?
//!
//! pdfium keeps thread-local state and `Pdfium` is not `Send`, so it cannot
//! be parked in an `Arc` and shared across `spawn_blocking` threads. Each
//! [`PdfBackend::with_document`] call binds the library on the calling
//! thread, opens the document, runs the callback, and releases everything
//! before returning. Binding is a `dlopen` of an already-mapped library after
//! the first call, so the cost is negligible next to rasterisation.

use super::{PdfBackend, PdfDocumentHandle};
use crate::error::{EngineError, RedactError};
use crate::model::{PageSize, PdfRect, RenderScale, RgbColor};
use image::DynamicImage;
use pdfium_render::prelude::{
    PdfColor, PdfDocument, PdfPage, PdfPageObjectsCommon, PdfRenderConfig, Pdfium,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming a pdfium library file or its directory.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// pdfium engine, bound lazily on each blocking call.
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    library_path: Option<PathBuf>,
}

impl PdfiumBackend {
    /// `library_path` may be the library file or the directory holding it.
    /// `None` consults `PDFIUM_LIB_PATH`, then the working directory, then
    /// the system library search path.
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }

    fn bind(&self) -> Result<Pdfium, RedactError> {
        let explicit = self
            .library_path
            .clone()
            .or_else(|| std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from));

        let bindings = match explicit {
            Some(path) => {
                let lib = library_file(&path);
                debug!("Binding pdfium from {}", lib.display());
                Pdfium::bind_to_library(&lib).map_err(|e| {
                    RedactError::PdfiumBindingFailed(format!("{}: {:?}", lib.display(), e))
                })?
            }
            None => {
                let local = Pdfium::pdfium_platform_library_name_at_path("./");
                Pdfium::bind_to_library(&local)
                    .or_else(|_| Pdfium::bind_to_system_library())
                    .map_err(|e| RedactError::PdfiumBindingFailed(format!("{:?}", e)))?
            }
        };

        Ok(Pdfium::new(bindings))
    }
}

/// Resolve a directory to the platform library file inside it.
fn library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}

impl PdfBackend for PdfiumBackend {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn with_document(
        &self,
        pdf: Vec<u8>,
        password: Option<&str>,
        f: &mut dyn FnMut(&mut dyn PdfDocumentHandle) -> Result<(), RedactError>,
    ) -> Result<(), RedactError> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_byte_vec(pdf, password)
            .map_err(|e| classify_load_error(format!("{:?}", e), password.is_some()))?;

        let mut handle = PdfiumDocument { document };
        f(&mut handle)
    }
}

/// Map a pdfium load failure onto the password/corruption variants.
fn classify_load_error(detail: String, had_password: bool) -> RedactError {
    if detail.contains("Password") || detail.contains("password") {
        if had_password {
            RedactError::WrongPassword
        } else {
            RedactError::PasswordRequired
        }
    } else {
        RedactError::CorruptPdf { detail }
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumDocument<'a> {
    fn page(&self, index: usize) -> Result<PdfPage<'a>, EngineError> {
        let total = self.page_count();
        if index >= total {
            return Err(EngineError::new(format!(
                "page index {} out of range (document has {} pages)",
                index, total
            )));
        }
        self.document
            .pages()
            .get(index as u16)
            .map_err(|e| EngineError::new(format!("{:?}", e)))
    }
}

impl PdfDocumentHandle for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, index: usize) -> Result<PageSize, EngineError> {
        let page = self.page(index)?;
        Ok(PageSize {
            width: f64::from(page.width().value),
            height: f64::from(page.height().value),
        })
    }

    fn render_page(&self, index: usize, scale: RenderScale) -> Result<DynamicImage, EngineError> {
        let page = self.page(index)?;
        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale.get());

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| EngineError::new(format!("{:?}", e)))?;

        Ok(bitmap.as_image())
    }

    fn draw_filled_rect(
        &mut self,
        index: usize,
        rect: PdfRect,
        color: RgbColor,
    ) -> Result<(), EngineError> {
        let mut page = self.page(index)?;
        let bounds = pdfium_render::prelude::PdfRect::new_from_values(
            rect.y as f32,
            rect.x as f32,
            rect.top() as f32,
            rect.right() as f32,
        );

        page.objects_mut()
            .create_path_object_rect(
                bounds,
                None,
                None,
                Some(PdfColor::new(color.r, color.g, color.b, 255)),
            )
            .map(|_| ())
            .map_err(|e| EngineError::new(format!("{:?}", e)))
    }

    fn save(&self) -> Result<Vec<u8>, EngineError> {
        self.document
            .save_to_bytes()
            .map_err(|e| EngineError::new(format!("{:?}", e)))
    }
}
