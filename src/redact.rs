//! Redaction entry points.
//!
//! Every entry point runs the same four stages strictly in order:
//! rasterise → recognise → match → overlay. Each blocking stage runs on the
//! blocking pool under the configured time budget, and the cancel token is
//! checked between stages (and between pages inside the first two).
//!
//! The source bytes are cloned once before rasterisation: the rasteriser
//! consumes its copy, the overlay stage draws on the retained one.

use crate::backend::pdfium::PdfiumBackend;
use crate::backend::{open_document, PdfBackend};
use crate::config::RedactionConfig;
use crate::error::{RedactError, Stage};
use crate::model::PageSize;
use crate::ocr::tesseract::TesseractEngine;
use crate::ocr::OcrEngine;
use crate::output::{
    DocumentInfo, RedactedDocument, RedactionOutcome, RedactionPasses, RedactionReport,
    RedactionStats,
};
use crate::pipeline::matcher::{self, QuerySet};
use crate::pipeline::{input, overlay, recognize, render, run_blocking};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Redact every line matching any of `queries` from an in-memory PDF.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// [`RedactionOutcome::Redacted`] with the new document when at least one
/// target was found, [`RedactionOutcome::NothingToRedact`] otherwise. The
/// input is never modified in place.
///
/// # Errors
/// Any fatal [`RedactError`]: an unreadable or oversized document, a page
/// that would not rasterise, an OCR failure, a timeout or cancellation. No
/// partial document is returned with an error.
///
/// # Example
/// ```rust,no_run
/// use pdf_ocr_redact::{redact_bytes, RedactionConfig, RedactionOutcome};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pdf = std::fs::read("scan.pdf")?;
/// let config = RedactionConfig::default();
/// match redact_bytes(pdf, ["Acme Corp", "555-0199"], &config).await? {
///     RedactionOutcome::Redacted(doc) => std::fs::write("scan_redacted.pdf", &doc.bytes)?,
///     RedactionOutcome::NothingToRedact(_) => eprintln!("no matches"),
/// }
/// # Ok(())
/// # }
/// ```
pub async fn redact_bytes<I, S>(
    pdf: Vec<u8>,
    queries: I,
    config: &RedactionConfig,
) -> Result<RedactionOutcome, RedactError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let queries = QuerySet::new(queries)?;
    input::validate_bytes(&pdf)?;
    run(pdf, &queries, config).await
}

/// Read a PDF from disk and redact it. See [`redact_bytes`].
pub async fn redact_file<I, S>(
    path: impl AsRef<Path>,
    queries: I,
    config: &RedactionConfig,
) -> Result<RedactionOutcome, RedactError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let path = path.as_ref();
    let queries = QuerySet::new(queries)?;
    info!("Starting redaction: {}", path.display());
    let pdf = input::load_pdf(path)?;
    run(pdf, &queries, config).await
}

/// Redact a PDF file and write the result to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files. When
/// nothing matched, no file is written and the outcome says so.
pub async fn redact_to_file<I, S>(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    queries: I,
    config: &RedactionConfig,
) -> Result<RedactionOutcome, RedactError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let outcome = redact_file(input_path, queries, config).await?;
    if let RedactionOutcome::Redacted(ref doc) = outcome {
        write_atomic(output_path.as_ref(), &doc.bytes).await?;
        info!(
            "Wrote {} ({} bytes)",
            output_path.as_ref().display(),
            doc.bytes.len()
        );
    }
    Ok(outcome)
}

/// Synchronous wrapper around [`redact_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn redact_sync<I, S>(
    path: impl AsRef<Path>,
    queries: I,
    config: &RedactionConfig,
) -> Result<RedactionOutcome, RedactError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokio::runtime::Runtime::new()
        .map_err(|e| RedactError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(redact_file(path, queries, config))
}

/// Redact repeatedly, feeding each output back in, until a pass finds
/// nothing, a pass draws nothing, or `max_passes` passes have run.
///
/// Redacted output is an ordinary PDF, so later passes go through exactly
/// the same pipeline as the first. A line the first pass missed (OCR read it
/// differently at one point and matched the next time, or a guard rejected
/// the whole line but a shorter one surfaces once it is covered) gets another
/// chance.
pub async fn redact_passes<I, S>(
    pdf: Vec<u8>,
    queries: I,
    config: &RedactionConfig,
    max_passes: usize,
) -> Result<RedactionPasses, RedactError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if max_passes == 0 {
        return Err(RedactError::InvalidConfig(
            "at least one redaction pass is required".into(),
        ));
    }
    let queries = QuerySet::new(queries)?;
    input::validate_bytes(&pdf)?;

    let mut current = pdf;
    let mut document: Option<RedactedDocument> = None;
    let mut reports = Vec::new();

    for pass in 1..=max_passes {
        info!(pass, max_passes, "Starting redaction pass");
        match run(std::mem::take(&mut current), &queries, config).await? {
            RedactionOutcome::NothingToRedact(report) => {
                reports.push(report);
                break;
            }
            RedactionOutcome::Redacted(doc) => {
                let applied = doc.report.stats.applied;
                reports.push(doc.report.clone());
                current = doc.bytes.clone();
                document = Some(doc);
                if applied == 0 {
                    debug!(pass, "Pass drew nothing, stopping");
                    break;
                }
            }
        }
    }

    Ok(RedactionPasses { document, reports })
}

/// Read page count and page sizes without rasterising or running OCR.
pub async fn inspect(
    path: impl AsRef<Path>,
    config: &RedactionConfig,
) -> Result<DocumentInfo, RedactError> {
    let pdf = input::load_pdf(path.as_ref())?;
    let file_size = pdf.len() as u64;
    let backend = resolve_backend(config);
    let password = config.password.clone();

    let pages = run_blocking(Stage::Input, config.stage_timeout_secs, &config.cancel, move |_| {
        open_document(backend.as_ref(), pdf, password.as_deref(), |doc| {
            (0..doc.page_count())
                .map(|i| {
                    doc.page_size(i).map_err(|e| RedactError::CorruptPdf {
                        detail: format!("page {}: {}", i + 1, e),
                    })
                })
                .collect::<Result<Vec<PageSize>, _>>()
        })
    })
    .await?;

    Ok(DocumentInfo {
        page_count: pages.len(),
        pages,
        file_size,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run(
    pdf: Vec<u8>,
    queries: &QuerySet,
    config: &RedactionConfig,
) -> Result<RedactionOutcome, RedactError> {
    let total_start = Instant::now();
    let backend = resolve_backend(config);
    let engine = resolve_ocr_engine(config);
    info!(
        bytes = pdf.len(),
        queries = queries.queries().len(),
        scale = %config.render_scale,
        backend = backend.name(),
        ocr = engine.name(),
        "Redaction run starting"
    );

    // ── Step 1: Rasterise ────────────────────────────────────────────────
    config.cancel.check(Stage::Rasterize)?;
    let retained = pdf.clone();
    let render_start = Instant::now();
    let rasterized = render::render_pages(Arc::clone(&backend), pdf, config).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    let total_pages = rasterized.page_count();
    let raster_dims = rasterized.raster_dims();
    let scale = rasterized.scale;
    info!("Rendered {} pages in {}ms", total_pages, render_duration_ms);

    // ── Step 2: Recognise ────────────────────────────────────────────────
    config.cancel.check(Stage::Recognize)?;
    let ocr_start = Instant::now();
    let pages = recognize::recognize_pages(engine, rasterized.pages, scale, config).await?;
    let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;
    let fragments: usize = pages.iter().map(Vec::len).sum();
    info!(
        pages = total_pages,
        fragments, "Recognised {} lines in {}ms", fragments, ocr_duration_ms
    );

    // ── Step 3: Match ────────────────────────────────────────────────────
    config.cancel.check(Stage::Match)?;
    let targets = matcher::find_targets(&pages, queries);
    info!(targets = targets.len(), "Matching complete");
    if let Some(ref cb) = config.progress_callback {
        cb.on_targets_found(targets.len());
    }

    let mut stats = RedactionStats {
        total_pages,
        fragments,
        targets: targets.len(),
        render_duration_ms,
        ocr_duration_ms,
        ..Default::default()
    };
    let mut report = RedactionReport {
        queries: queries.queries().to_vec(),
        render_scale: scale,
        stats: RedactionStats::default(),
        redactions: Vec::new(),
    };

    if targets.is_empty() {
        stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
        report.stats = stats;
        info!("No redaction targets found; document left untouched");
        if let Some(ref cb) = config.progress_callback {
            cb.on_run_complete(0, 0);
        }
        return Ok(RedactionOutcome::NothingToRedact(report));
    }

    // ── Step 4: Overlay ──────────────────────────────────────────────────
    config.cancel.check(Stage::Redact)?;
    let redact_start = Instant::now();
    let password = config.password.clone();
    let (bytes, tally) = run_blocking(
        Stage::Redact,
        config.stage_timeout_secs,
        &config.cancel,
        move |_| {
            overlay::redact_document(
                backend.as_ref(),
                retained,
                password.as_deref(),
                &targets,
                &raster_dims,
                scale,
            )
        },
    )
    .await?;

    stats.redact_duration_ms = redact_start.elapsed().as_millis() as u64;
    stats.applied = tally.applied;
    stats.skipped = tally.skipped;
    stats.skipped_by_reason = tally.skipped_by_reason;
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    report.stats = stats;
    report.redactions = tally.rects;

    info!(
        applied = report.stats.applied,
        skipped = report.stats.skipped,
        "Redaction complete: {}/{} targets drawn, {}ms total",
        report.stats.applied,
        report.stats.targets,
        report.stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(report.stats.applied, report.stats.skipped);
    }

    Ok(RedactionOutcome::Redacted(RedactedDocument { bytes, report }))
}

/// Pre-built backend from the config, else pdfium.
fn resolve_backend(config: &RedactionConfig) -> Arc<dyn PdfBackend> {
    match config.pdf_backend {
        Some(ref backend) => Arc::clone(backend),
        None => Arc::new(PdfiumBackend::new(config.pdfium_library_path.clone())),
    }
}

/// Pre-built OCR engine from the config, else tesseract.
fn resolve_ocr_engine(config: &RedactionConfig) -> Arc<dyn OcrEngine> {
    match config.ocr_engine {
        Some(ref engine) => Arc::clone(engine),
        None => Arc::new(TesseractEngine::from_config(config)),
    }
}

/// Write `bytes` to `path` through a temp file and a rename, creating parent
/// directories as needed.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RedactError> {
    let write_err = |source| RedactError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_query_set_is_rejected_before_any_work() {
        let err = redact_bytes(b"%PDF-1.7".to_vec(), ["  "], &RedactionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RedactError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn empty_buffer_is_invalid_input() {
        let err = redact_bytes(Vec::new(), ["x"], &RedactionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RedactError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn zero_passes_is_invalid() {
        let err = redact_passes(b"%PDF".to_vec(), ["x"], &RedactionConfig::default(), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, RedactError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn write_atomic_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out.pdf");
        write_atomic(&out, b"%PDF-1.7").await.unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"%PDF-1.7");
        assert!(!out.with_extension("pdf.tmp").exists());
    }

    #[test]
    fn redact_sync_reports_missing_file() {
        let err = redact_sync("/nonexistent/scan.pdf", ["x"], &RedactionConfig::default())
            .unwrap_err();
        assert!(matches!(err, RedactError::FileNotFound { .. }));
    }
}
