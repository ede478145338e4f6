//! Progress-callback trait for per-stage redaction events.
//!
//! Inject an [`Arc<dyn RedactionProgressCallback>`] via
//! [`crate::config::RedactionConfigBuilder::progress_callback`] to receive
//! events as the pipeline rasterises and recognises each page.
//!
//! Callers can forward events to a channel, a WebSocket, or a terminal
//! progress bar without the library knowing how the host application
//! communicates. Events are emitted from `spawn_blocking` threads, hence the
//! `Send + Sync` bound.
//!
//! # Example
//!
//! ```rust
//! use pdf_ocr_redact::{RedactionConfig, RedactionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     recognised: AtomicUsize,
//! }
//!
//! impl RedactionProgressCallback for PageCounter {
//!     fn on_page_recognized(&self, page_num: usize, total_pages: usize, fragments: usize) {
//!         self.recognised.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("OCR page {}/{}: {} lines", page_num, total_pages, fragments);
//!     }
//! }
//!
//! let counter = Arc::new(PageCounter { recognised: AtomicUsize::new(0) });
//!
//! let config = RedactionConfig::builder()
//!     .progress_callback(counter as Arc<dyn RedactionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the redaction pipeline as it moves through pages and stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Pages are processed one at a time, so events for a
/// single run never overlap; an implementation shared across concurrent runs
/// still needs its own synchronisation.
pub trait RedactionProgressCallback: Send + Sync {
    /// Called once the document is loaded and its page count is known.
    ///
    /// # Arguments
    /// * `total_pages`: number of pages that will be rasterised and OCR'd
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after each page has been rasterised.
    ///
    /// # Arguments
    /// * `page_num`   : 1-indexed page number
    /// * `total_pages`: total pages in the document
    fn on_page_rendered(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called after OCR finishes on a page.
    ///
    /// # Arguments
    /// * `page_num`   : 1-indexed page number
    /// * `total_pages`: total pages in the document
    /// * `fragments`  : number of text lines recovered from the page
    fn on_page_recognized(&self, page_num: usize, total_pages: usize, fragments: usize) {
        let _ = (page_num, total_pages, fragments);
    }

    /// Called once the matcher has produced its target list.
    fn on_targets_found(&self, count: usize) {
        let _ = count;
    }

    /// Called once the overlay pass has finished.
    ///
    /// # Arguments
    /// * `applied`: rectangles drawn
    /// * `skipped`: targets rejected by a guard or a drawing failure
    fn on_run_complete(&self, applied: usize, skipped: usize) {
        let _ = (applied, skipped);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RedactionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RedactionConfig`].
pub type ProgressCallback = Arc<dyn RedactionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        started_total: AtomicUsize,
        rendered: AtomicUsize,
        recognised: AtomicUsize,
        fragments: AtomicUsize,
        targets: AtomicUsize,
        applied: AtomicUsize,
    }

    impl RedactionProgressCallback for TrackingCallback {
        fn on_run_start(&self, total_pages: usize) {
            self.started_total.store(total_pages, Ordering::SeqCst);
        }

        fn on_page_rendered(&self, _page_num: usize, _total_pages: usize) {
            self.rendered.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_recognized(&self, _page_num: usize, _total_pages: usize, fragments: usize) {
            self.recognised.fetch_add(1, Ordering::SeqCst);
            self.fragments.fetch_add(fragments, Ordering::SeqCst);
        }

        fn on_targets_found(&self, count: usize) {
            self.targets.store(count, Ordering::SeqCst);
        }

        fn on_run_complete(&self, applied: usize, _skipped: usize) {
            self.applied.store(applied, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(5);
        cb.on_page_rendered(1, 5);
        cb.on_page_recognized(1, 5, 12);
        cb.on_targets_found(3);
        cb.on_run_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_run_start(2);
        tracker.on_page_rendered(1, 2);
        tracker.on_page_rendered(2, 2);
        tracker.on_page_recognized(1, 2, 10);
        tracker.on_page_recognized(2, 2, 4);
        tracker.on_targets_found(3);
        tracker.on_run_complete(3, 0);

        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.rendered.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.recognised.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.fragments.load(Ordering::SeqCst), 14);
        assert_eq!(tracker.targets.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.applied.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn RedactionProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_run_start(10);
        cb.on_page_rendered(1, 10);
    }
}
