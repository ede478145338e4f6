//! Configuration types for a redaction run.
//!
//! All run behaviour is controlled through [`RedactionConfig`], built via its
//! [`RedactionConfigBuilder`]. The redaction *policy* (confidence threshold,
//! geometry guards, size guard) is deliberately not part of it: those are
//! fixed constants in the modules that enforce them, so two runs with
//! different configs still make the same accept/reject decisions.

use crate::backend::PdfBackend;
use crate::cancel::CancelToken;
use crate::error::RedactError;
use crate::model::RenderScale;
use crate::ocr::OcrEngine;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Source documents above this size are rejected before any processing.
pub const MAX_INPUT_BYTES: u64 = 50 * 1024 * 1024;

/// Configuration for a redaction run.
///
/// Built via [`RedactionConfig::builder()`] or using
/// [`RedactionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_ocr_redact::RedactionConfig;
///
/// let config = RedactionConfig::builder()
///     .render_scale(2.0)
///     .ocr_language("eng")
///     .stage_timeout_secs(300)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RedactionConfig {
    /// Multiplier applied to every page when rasterising for OCR. Default: 2.0.
    ///
    /// Tesseract reads 10–12 pt body text reliably from about 150 DPI; a
    /// scale of 2.0 on a 72-point-per-inch page gives 144 DPI. Raise it for
    /// small print at the cost of memory and OCR time.
    pub render_scale: RenderScale,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Tesseract language code(s), e.g. `"eng"` or `"eng+deu"`. Default: `"eng"`.
    pub ocr_language: String,

    /// Tesseract page segmentation mode (`--psm`). Default: 3 (fully automatic).
    pub page_segmentation_mode: u8,

    /// Tesseract executable. Default: `tesseract` on `PATH`.
    pub tesseract_path: PathBuf,

    /// Explicit pdfium library (file or directory). Falls back to
    /// `PDFIUM_LIB_PATH`, the working directory, then the system library.
    pub pdfium_library_path: Option<PathBuf>,

    /// Time budget for each blocking stage in seconds. Default: 600.
    ///
    /// OCR dominates run time: roughly 1–3 s per page at scale 2.0, so the
    /// default covers a few hundred pages.
    pub stage_timeout_secs: u64,

    /// Cancellation checked between pages and between stages.
    pub cancel: CancelToken,

    /// Optional per-page event sink.
    pub progress_callback: Option<ProgressCallback>,

    /// Pre-constructed PDF engine. Takes precedence over the pdfium default.
    pub pdf_backend: Option<Arc<dyn PdfBackend>>,

    /// Pre-constructed OCR engine. Takes precedence over the tesseract default.
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            render_scale: RenderScale::default(),
            password: None,
            ocr_language: "eng".to_string(),
            page_segmentation_mode: 3,
            tesseract_path: PathBuf::from("tesseract"),
            pdfium_library_path: None,
            stage_timeout_secs: 600,
            cancel: CancelToken::default(),
            progress_callback: None,
            pdf_backend: None,
            ocr_engine: None,
        }
    }
}

impl fmt::Debug for RedactionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactionConfig")
            .field("render_scale", &self.render_scale)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("ocr_language", &self.ocr_language)
            .field("page_segmentation_mode", &self.page_segmentation_mode)
            .field("tesseract_path", &self.tesseract_path)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("stage_timeout_secs", &self.stage_timeout_secs)
            .field("cancelled", &self.cancel.is_cancelled())
            .field(
                "pdf_backend",
                &self.pdf_backend.as_ref().map(|_| "<dyn PdfBackend>"),
            )
            .field(
                "ocr_engine",
                &self.ocr_engine.as_ref().map(|e| e.name().to_string()),
            )
            .finish()
    }
}

impl RedactionConfig {
    /// Create a new builder for `RedactionConfig`.
    pub fn builder() -> RedactionConfigBuilder {
        RedactionConfigBuilder {
            render_scale: RenderScale::default().get(),
            config: Self::default(),
        }
    }
}

/// Builder for [`RedactionConfig`].
#[derive(Debug)]
pub struct RedactionConfigBuilder {
    render_scale: f32,
    config: RedactionConfig,
}

impl RedactionConfigBuilder {
    pub fn render_scale(mut self, scale: f32) -> Self {
        self.render_scale = scale;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn page_segmentation_mode(mut self, psm: u8) -> Self {
        self.config.page_segmentation_mode = psm;
        self
    }

    pub fn tesseract_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tesseract_path = path.into();
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn stage_timeout_secs(mut self, secs: u64) -> Self {
        self.config.stage_timeout_secs = secs;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.config.cancel = token;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn pdf_backend(mut self, backend: Arc<dyn PdfBackend>) -> Self {
        self.config.pdf_backend = Some(backend);
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr_engine = Some(engine);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<RedactionConfig, RedactError> {
        self.config.render_scale = RenderScale::new(self.render_scale)?;

        let c = &self.config;
        if c.page_segmentation_mode > 13 {
            return Err(RedactError::InvalidConfig(format!(
                "page segmentation mode must be 0–13, got {}",
                c.page_segmentation_mode
            )));
        }
        if !is_valid_language(&c.ocr_language) {
            return Err(RedactError::InvalidConfig(format!(
                "OCR language must look like 'eng' or 'eng+deu', got '{}'",
                c.ocr_language
            )));
        }
        if c.stage_timeout_secs == 0 {
            return Err(RedactError::InvalidConfig(
                "stage timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Tesseract language specs are `+`-joined traineddata names.
fn is_valid_language(lang: &str) -> bool {
    !lang.is_empty()
        && lang.split('+').all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        })
}
