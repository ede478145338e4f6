//! Error types for the pdf-ocr-redact library.
//!
//! Two distinct kinds of failure reflect two distinct scopes:
//!
//! * [`RedactError`]: **Fatal**: the run cannot produce a trustworthy
//!   document (unreadable input, a page that would not rasterise, an OCR
//!   engine failure). Returned as `Err(RedactError)` from the top-level
//!   `redact*` functions. No partial document is ever returned with it.
//!
//! * [`SkipReason`]: **Non-fatal**: a single redaction target was not drawn
//!   (malformed OCR box, a rectangle that would black out most of the page,
//!   a drawing failure). Counted in [`crate::output::RedactionReport`] so the
//!   caller can judge how much to trust the result.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-ocr-redact library.
#[derive(Debug, Error)]
pub enum RedactError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The source buffer is empty or otherwise unusable.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The source document exceeds the upstream size guard.
    #[error("Input is {size} bytes; documents larger than {max} bytes are rejected.\nSplit the PDF and redact the parts separately.")]
    InputTooLarge { size: u64, max: u64 },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for encrypted PDF")]
    WrongPassword,

    /// The document loaded but has no pages to rasterise.
    #[error("No pages found in PDF")]
    NoPages,

    /// Rasterisation failed on a specific page (1-indexed).
    #[error("Failed to convert page {page} to an image: {detail}")]
    PageConversion { page: usize, detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR engine failed on a specific page (1-indexed).
    #[error("OCR failed on page {page}: {detail}")]
    Recognition { page: usize, detail: String },

    /// The OCR engine could not be started.
    #[error("OCR engine '{engine}' is not available.\n{hint}")]
    OcrEngineUnavailable { engine: String, hint: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The mutated document could not be serialised.
    #[error("Failed to save redacted PDF: {detail}")]
    SaveFailed { detail: String },

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Run control ───────────────────────────────────────────────────────
    /// A pipeline stage exceeded its time budget.
    #[error("{stage} stage timed out after {secs}s\nIncrease --stage-timeout.")]
    StageTimeout { stage: Stage, secs: u64 },

    /// The run was cancelled through its [`crate::CancelToken`].
    #[error("Redaction cancelled during {stage} stage")]
    Cancelled { stage: Stage },

    /// A blocking stage panicked; the panic payload is in `detail`.
    #[error("{stage} stage panicked: {detail}")]
    StagePanicked { stage: Stage, detail: String },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (or its directory).\n\
  • Place the platform pdfium library in the working directory.\n\
  • Install pdfium system-wide so the dynamic loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RedactError {
    /// Pipeline stage a fatal error is attributed to, for user-facing reports.
    pub fn stage(&self) -> Stage {
        match self {
            RedactError::FileNotFound { .. }
            | RedactError::PermissionDenied { .. }
            | RedactError::NotAPdf { .. }
            | RedactError::InvalidInput { .. }
            | RedactError::InputTooLarge { .. }
            | RedactError::InvalidConfig(_) => Stage::Input,
            RedactError::CorruptPdf { .. }
            | RedactError::PasswordRequired
            | RedactError::WrongPassword
            | RedactError::NoPages
            | RedactError::PageConversion { .. }
            | RedactError::PdfiumBindingFailed(_) => Stage::Rasterize,
            RedactError::Recognition { .. } | RedactError::OcrEngineUnavailable { .. } => {
                Stage::Recognize
            }
            RedactError::SaveFailed { .. } | RedactError::OutputWriteFailed { .. } => {
                Stage::Redact
            }
            RedactError::StageTimeout { stage, .. }
            | RedactError::Cancelled { stage }
            | RedactError::StagePanicked { stage, .. } => *stage,
            RedactError::Internal(_) => Stage::Input,
        }
    }

    /// 1-indexed page the failure happened on, when it is page-specific.
    pub fn page(&self) -> Option<usize> {
        match self {
            RedactError::PageConversion { page, .. } | RedactError::Recognition { page, .. } => {
                Some(*page)
            }
            _ => None,
        }
    }
}

/// Pipeline stage, used to attribute fatal errors and timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Input,
    Rasterize,
    Recognize,
    Match,
    Redact,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Input => "input",
            Stage::Rasterize => "rasterize",
            Stage::Recognize => "recognize",
            Stage::Match => "match",
            Stage::Redact => "redact",
        };
        f.write_str(name)
    }
}

/// Failure reported by an external engine (pdfium, tesseract, a test fake).
///
/// Engines only describe *what* went wrong; the pipeline stage that called
/// them decides which [`RedactError`] variant (and which page) it becomes.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}

/// Geometry guard that rejected a single OCR box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryRejection {
    /// Negative origin or inverted corners.
    InvalidBox,
    /// Far outside the rasterised page.
    OutOfBounds,
    /// Rectangle would cover more than the allowed share of the page.
    ExcessiveCoverage,
    /// Rectangle nearly as wide as the page.
    ExcessiveWidth,
    /// Rectangle taller than half the page.
    ExcessiveHeight,
    /// Zero-area rectangle after clamping to the page.
    Degenerate,
}

/// Why a redaction target was not drawn.
///
/// Unit variants only: serialised as JSON map keys in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The target's page does not exist in the document being redacted.
    PageOutOfRange,
    InvalidBox,
    OutOfBounds,
    ExcessiveCoverage,
    ExcessiveWidth,
    ExcessiveHeight,
    Degenerate,
    /// The PDF engine failed to draw the rectangle.
    DrawFailed,
}

impl From<GeometryRejection> for SkipReason {
    fn from(r: GeometryRejection) -> Self {
        match r {
            GeometryRejection::InvalidBox => SkipReason::InvalidBox,
            GeometryRejection::OutOfBounds => SkipReason::OutOfBounds,
            GeometryRejection::ExcessiveCoverage => SkipReason::ExcessiveCoverage,
            GeometryRejection::ExcessiveWidth => SkipReason::ExcessiveWidth,
            GeometryRejection::ExcessiveHeight => SkipReason::ExcessiveHeight,
            GeometryRejection::Degenerate => SkipReason::Degenerate,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::PageOutOfRange => "page out of range",
            SkipReason::InvalidBox => "invalid bounding box",
            SkipReason::OutOfBounds => "bounding box far outside page",
            SkipReason::ExcessiveCoverage => "coverage guard",
            SkipReason::ExcessiveWidth => "width guard",
            SkipReason::ExcessiveHeight => "height guard",
            SkipReason::Degenerate => "empty rectangle",
            SkipReason::DrawFailed => "drawing failed",
        })
    }
}
