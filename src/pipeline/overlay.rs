//! Overlay stage: draw opaque rectangles over every placeable target.
//!
//! Runs against the retained copy of the source bytes, never against the
//! buffer the rasteriser consumed. Individual targets that cannot be placed
//! or drawn are skipped and tallied by reason; the stage as a whole only
//! fails when the document cannot be opened or saved.

use super::geometry::place_redaction;
use crate::backend::{open_document, PdfBackend, PdfDocumentHandle};
use crate::error::{RedactError, SkipReason};
use crate::model::{PageGeometry, RasterDims, RedactionTarget, RenderScale, RgbColor};
use crate::output::AppliedRedaction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Outcome of one overlay pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedactionTally {
    pub applied: usize,
    pub skipped: usize,
    pub skipped_by_reason: BTreeMap<SkipReason, usize>,
    /// Every rectangle drawn, in target order.
    pub rects: Vec<AppliedRedaction>,
}

impl RedactionTally {
    fn skip(&mut self, reason: SkipReason) {
        self.skipped += 1;
        *self.skipped_by_reason.entry(reason).or_insert(0) += 1;
    }
}

/// Draw a black rectangle for each target onto an opened document.
///
/// `raster` holds the pixel dimensions of each page as rasterised, indexed
/// like the document's pages.
pub fn apply_redactions(
    doc: &mut dyn PdfDocumentHandle,
    targets: &[RedactionTarget],
    raster: &[RasterDims],
    scale: RenderScale,
) -> RedactionTally {
    let mut tally = RedactionTally::default();
    let page_count = doc.page_count();

    for target in targets {
        let page = target.page;
        if page >= page_count || page >= raster.len() {
            warn!(
                page = page + 1,
                pages = page_count,
                "Redaction target on a page that does not exist, skipping"
            );
            tally.skip(SkipReason::PageOutOfRange);
            continue;
        }

        let size = match doc.page_size(page) {
            Ok(s) => s,
            Err(e) => {
                warn!(page = page + 1, error = %e, "Could not read page size, skipping target");
                tally.skip(SkipReason::DrawFailed);
                continue;
            }
        };
        let geometry = PageGeometry {
            page: size,
            raster: raster[page],
            scale,
        };

        let rect = match place_redaction(&target.bbox, &geometry) {
            Ok(rect) => rect,
            Err(rejection) => {
                let reason = SkipReason::from(rejection);
                debug!(page = page + 1, %reason, bbox = ?target.bbox, "Target rejected");
                tally.skip(reason);
                continue;
            }
        };

        match doc.draw_filled_rect(page, rect, RgbColor::BLACK) {
            Ok(()) => {
                debug!(
                    page = page + 1,
                    x = rect.x,
                    y = rect.y,
                    width = rect.width,
                    height = rect.height,
                    "Target accepted"
                );
                tally.applied += 1;
                tally.rects.push(AppliedRedaction {
                    page,
                    word: target.word.clone(),
                    rect,
                });
            }
            Err(e) => {
                warn!(page = page + 1, error = %e, "Drawing redaction failed, skipping target");
                tally.skip(SkipReason::DrawFailed);
            }
        }
    }

    tally
}

/// Open `pdf`, overlay every target, and serialise the result. Blocking.
///
/// With no targets the document is saved unmodified.
pub fn redact_document(
    backend: &dyn PdfBackend,
    pdf: Vec<u8>,
    password: Option<&str>,
    targets: &[RedactionTarget],
    raster: &[RasterDims],
    scale: RenderScale,
) -> Result<(Vec<u8>, RedactionTally), RedactError> {
    open_document(backend, pdf, password, |doc| {
        let tally = if targets.is_empty() {
            RedactionTally::default()
        } else {
            apply_redactions(doc, targets, raster, scale)
        };
        info!(
            applied = tally.applied,
            skipped = tally.skipped,
            "Overlay pass complete"
        );

        let bytes = doc.save().map_err(|e| RedactError::SaveFailed {
            detail: e.to_string(),
        })?;
        Ok((bytes, tally))
    })
}
