//! Cooperative cancellation for a redaction run.
//!
//! The pipeline has no way to interrupt pdfium or tesseract mid-call, so
//! cancellation is checked at page boundaries inside the rasteriser and the
//! recogniser, and between stages in the orchestrator. Clones share state.
//!
//! A [`CancelToken::child`] observes its parent but can be cancelled on its
//! own. The stage runner hands each blocking stage a child so a stage
//! timeout stops that stage without cancelling the caller's token.

use crate::error::{RedactError, Stage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    parent: Option<Box<CancelToken>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token cancelled when either it or `self` is cancelled.
    pub fn child(&self) -> Self {
        Self {
            cancelled: Arc::default(),
            parent: Some(Box::new(self.clone())),
        }
    }

    /// Request cancellation. Takes effect at the next page or stage boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }

    /// `Err(Cancelled { stage })` once cancellation has been requested.
    pub fn check(&self, stage: Stage) -> Result<(), RedactError> {
        if self.is_cancelled() {
            Err(RedactError::Cancelled { stage })
        } else {
            Ok(())
        }
    }
}
