//! Pipeline stages for OCR-driven PDF redaction.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets the engines behind
//! them be swapped without touching the other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ recognize ──▶ matcher ──▶ geometry + overlay
//! (bytes)   (pixels)   (fragments)   (targets)   (black rectangles)
//! ```
//!
//! 1. [`input`]    : load the source PDF and apply the size/magic guards
//! 2. [`render`]   : rasterise every page at the run's render scale; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]   : PNG-encode a page for engines that read image files
//! 4. [`recognize`]: OCR each page with one scoped worker, flatten to lines
//!    in reference space
//! 5. [`matcher`]  : case-insensitive substring match plus confidence floor
//! 6. [`geometry`] : raster → PDF transform with the safety guards
//! 7. [`overlay`]  : draw the accepted rectangles on the retained copy

pub mod encode;
pub mod geometry;
pub mod input;
pub mod matcher;
pub mod overlay;
pub mod recognize;
pub mod render;

use crate::cancel::CancelToken;
use crate::error::{RedactError, Stage};
use std::time::Duration;
use tokio::task::JoinError;
use tracing::warn;

/// Run a blocking stage on the blocking pool under the stage time budget.
///
/// The closure receives a child of `cancel` and must poll it between units
/// of work. On timeout the child is cancelled and the task is awaited, so
/// nothing the stage acquired (an OCR worker, an open document) outlives
/// the returned [`RedactError::StageTimeout`]. The caller's token is left
/// untouched.
pub(crate) async fn run_blocking<T, F>(
    stage: Stage,
    timeout_secs: u64,
    cancel: &CancelToken,
    f: F,
) -> Result<T, RedactError>
where
    T: Send + 'static,
    F: FnOnce(CancelToken) -> Result<T, RedactError> + Send + 'static,
{
    let stage_cancel = cancel.child();
    let mut task = tokio::task::spawn_blocking({
        let stage_cancel = stage_cancel.clone();
        move || f(stage_cancel)
    });

    match tokio::time::timeout(Duration::from_secs(timeout_secs), &mut task).await {
        Ok(joined) => joined.map_err(|e| panicked(stage, e))?,
        Err(_) => {
            warn!(%stage, secs = timeout_secs, "Stage exceeded its time budget, stopping it");
            stage_cancel.cancel();
            if let Err(e) = task.await {
                warn!(%stage, error = %e, "Timed-out stage did not stop cleanly");
            }
            Err(RedactError::StageTimeout {
                stage,
                secs: timeout_secs,
            })
        }
    }
}

fn panicked(stage: Stage, e: JoinError) -> RedactError {
    let detail = match e.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".into()),
        Err(e) => e.to_string(),
    };
    RedactError::StagePanicked { stage, detail }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn run_blocking_returns_value() {
        let v = run_blocking(Stage::Match, 5, &CancelToken::new(), |_| Ok(42))
            .await
            .unwrap();
        assert_eq!(v, 42);
    }

    #[tokio::test]
    async fn run_blocking_passes_errors_through() {
        let err = run_blocking::<(), _>(Stage::Rasterize, 5, &CancelToken::new(), |_| {
            Err(RedactError::NoPages)
        })
        .await
        .unwrap_err();
        assert!(matches!(err, RedactError::NoPages));
    }

    #[tokio::test]
    async fn timeout_stops_the_stage_before_returning() {
        let cancel = CancelToken::new();
        let steps = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let err = run_blocking(Stage::Recognize, 1, &cancel, {
            let steps = Arc::clone(&steps);
            let finished = Arc::clone(&finished);
            move |stage_cancel| {
                let result: Result<(), RedactError> = (0..20).try_for_each(|_| {
                    stage_cancel.check(Stage::Recognize)?;
                    steps.fetch_add(1, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(300));
                    Ok(())
                });
                finished.store(true, Ordering::SeqCst);
                result
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            RedactError::StageTimeout {
                stage: Stage::Recognize,
                secs: 1
            }
        ));
        assert!(finished.load(Ordering::SeqCst), "stage still running");
        assert!(steps.load(Ordering::SeqCst) < 20);
        assert!(!cancel.is_cancelled(), "caller token must stay usable");
    }

    #[tokio::test]
    async fn run_blocking_reports_panics_with_their_stage() {
        let err = run_blocking::<(), _>(Stage::Redact, 5, &CancelToken::new(), |_| panic!("boom"))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Redact);
        assert!(matches!(
            err,
            RedactError::StagePanicked { stage: Stage::Redact, ref detail } if detail == "boom"
        ));
    }
}
