//! # pdf-ocr-redact
//!
//! Redact sensitive text from scanned PDFs by OCR.
//!
//! ## Why this crate?
//!
//! Scanned documents have no text layer to search: the words only exist as
//! pixels. This crate rasterises each page, runs OCR to recover text lines
//! with their bounding boxes, matches them against your query phrases, and
//! paints opaque black rectangles over the matching lines on the original
//! PDF. Page count and page sizes are preserved.
//!
//! Redaction is visual: rectangles are drawn on top of the page content. The
//! underlying image data is not removed.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      size guard, magic bytes, retained copy
//!  ├─ 2. Render     rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Recognize  tesseract TSV → lines in reference space
//!  ├─ 4. Match      case-insensitive substring, confidence > 60
//!  └─ 5. Overlay    raster → PDF transform, safety guards, black rectangles
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_ocr_redact::{redact_to_file, RedactionConfig, RedactionOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RedactionConfig::default();
//!     let outcome = redact_to_file("scan.pdf", "scan_redacted.pdf", ["Jane Doe"], &config).await?;
//!     let stats = &outcome.report().stats;
//!     eprintln!("{} drawn, {} skipped", stats.applied, stats.skipped);
//!     if let RedactionOutcome::NothingToRedact(_) = outcome {
//!         eprintln!("nothing matched; no file written");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfredact` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf-ocr-redact = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! * A pdfium shared library: `PDFIUM_LIB_PATH`, the working directory, or
//!   the system library path.
//! * The `tesseract` executable with the language data for `ocr_language`.
//!
//! Both engines sit behind traits ([`backend::PdfBackend`],
//! [`ocr::OcrEngine`]) and can be replaced through [`RedactionConfig`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod cancel;
pub mod config;
pub mod error;
pub mod model;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod redact;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{PdfBackend, PdfDocumentHandle};
pub use cancel::CancelToken;
pub use config::{RedactionConfig, RedactionConfigBuilder, MAX_INPUT_BYTES};
pub use error::{EngineError, GeometryRejection, RedactError, SkipReason, Stage};
pub use model::{
    BoundingBox, PageGeometry, PageSize, PdfRect, PixelBuffer, RasterDims, RecognizedFragment,
    RedactionTarget, RenderScale, RgbColor,
};
pub use ocr::{OcrEngine, OcrPage, OcrWorker};
pub use output::{
    AppliedRedaction, DocumentInfo, RedactedDocument, RedactionOutcome, RedactionPasses,
    RedactionReport, RedactionStats,
};
pub use pipeline::matcher::{QuerySet, MIN_CONFIDENCE};
pub use progress::{NoopProgressCallback, ProgressCallback, RedactionProgressCallback};
pub use redact::{inspect, redact_bytes, redact_file, redact_passes, redact_sync, redact_to_file};
