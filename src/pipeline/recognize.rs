//! OCR stage: pixel buffers → per-page [`RecognizedFragment`] lists.
//!
//! One worker is acquired per call and held by [`WorkerGuard`], which
//! terminates it when dropped: after the last page, on the first error, and
//! during a panic unwind alike. A failed termination is logged and never
//! replaces the run's actual result.

use super::run_blocking;
use crate::cancel::CancelToken;
use crate::config::RedactionConfig;
use crate::error::{RedactError, Stage};
use crate::model::{PixelBuffer, RecognizedFragment, RenderScale};
use crate::ocr::{OcrEngine, OcrPage, OcrWorker};
use crate::progress::ProgressCallback;
use std::sync::Arc;
use tracing::{debug, info, warn};

struct WorkerGuard {
    engine: String,
    worker: Box<dyn OcrWorker>,
}

impl WorkerGuard {
    fn start(engine: &dyn OcrEngine) -> Result<Self, RedactError> {
        let worker = engine.start_worker()?;
        debug!(engine = engine.name(), "OCR worker started");
        Ok(Self {
            engine: engine.name().to_string(),
            worker,
        })
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        match self.worker.terminate() {
            Ok(()) => debug!(engine = %self.engine, "OCR worker terminated"),
            Err(e) => warn!(engine = %self.engine, error = %e, "OCR worker termination failed"),
        }
    }
}

/// OCR every page in order. Blocking.
///
/// Returns one fragment list per input page, parallel to `pages`. A page with
/// no recognisable text yields an empty list.
pub fn recognize(
    engine: &dyn OcrEngine,
    pages: &[PixelBuffer],
    scale: RenderScale,
    cancel: &CancelToken,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<Vec<RecognizedFragment>>, RedactError> {
    let mut guard = WorkerGuard::start(engine)?;
    let total = pages.len();
    info!(pages = total, engine = engine.name(), "Recognising pages");

    let mut out = Vec::with_capacity(total);
    for page in pages {
        cancel.check(Stage::Recognize)?;

        let ocr = guard
            .worker
            .recognize(page)
            .map_err(|e| RedactError::Recognition {
                page: page.page_index + 1,
                detail: e.to_string(),
            })?;

        let fragments = flatten(&ocr, scale);
        debug!(
            page = page.page_index + 1,
            fragments = fragments.len(),
            "Recognised page"
        );
        if let Some(cb) = progress {
            cb.on_page_recognized(page.page_index + 1, total, fragments.len());
        }
        out.push(fragments);
    }

    Ok(out)
}

/// Flatten an OCR tree to line fragments in reference space.
///
/// Only lines with at least one word survive; every coordinate is divided
/// by the render scale.
pub fn flatten(page: &OcrPage, scale: RenderScale) -> Vec<RecognizedFragment> {
    let factor = f64::from(scale.get());
    page.lines()
        .filter(|line| !line.words.is_empty())
        .map(|line| RecognizedFragment {
            text: line.text.clone(),
            bbox: line.bbox.descale(factor),
            confidence: line.confidence,
        })
        .collect()
}

/// Async wrapper over [`recognize`] under the configured stage timeout.
pub async fn recognize_pages(
    engine: Arc<dyn OcrEngine>,
    pages: Vec<PixelBuffer>,
    scale: RenderScale,
    config: &RedactionConfig,
) -> Result<Vec<Vec<RecognizedFragment>>, RedactError> {
    let progress = config.progress_callback.clone();

    run_blocking(Stage::Recognize, config.stage_timeout_secs, &config.cancel, move |cancel| {
        recognize(engine.as_ref(), &pages, scale, &cancel, progress.as_ref())
    })
    .await
}
