//! Raster → PDF coordinate transform and the overlay safety guards.
//!
//! OCR boxes arrive in reference space (top-left origin, one unit per pixel
//! at scale 1.0). PDF drawing space has a bottom-left origin in points. The
//! transform is a per-axis scale plus a Y flip:
//!
//! ```text
//! reference_w = raster_w / render_scale        scale_x = page_w / reference_w
//! x = max(0, x0·scale_x)                       w = max(1, (x1 − x0)·scale_x)
//! y = max(0, page_h − y0·scale_y − h)          h = max(1, (y1 − y0)·scale_y)
//! ```
//!
//! The guards that follow exist because a single malformed OCR box can
//! otherwise black out an entire page. They reject the box, never clamp it
//! into something plausible.

use crate::error::GeometryRejection;
use crate::model::{BoundingBox, PageGeometry, PdfRect};

/// A box whose far corner lies beyond this multiple of the raster size is
/// treated as garbage.
pub const BBOX_SANITY_FACTOR: f64 = 5.0;

/// Largest share of the page area a single rectangle may cover.
pub const MAX_PAGE_COVERAGE: f64 = 0.80;

/// Largest share of the page width a single rectangle may span.
pub const MAX_WIDTH_FRACTION: f64 = 0.95;

/// Largest share of the page height a single rectangle may span.
pub const MAX_HEIGHT_FRACTION: f64 = 0.50;

/// Place one reference-space box on its PDF page, or say why not.
pub fn place_redaction(
    bbox: &BoundingBox,
    geometry: &PageGeometry,
) -> Result<PdfRect, GeometryRejection> {
    if !bbox.is_well_formed() {
        return Err(GeometryRejection::InvalidBox);
    }

    let raster_w = f64::from(geometry.raster.width);
    let raster_h = f64::from(geometry.raster.height);
    if bbox.x1 > raster_w * BBOX_SANITY_FACTOR || bbox.y1 > raster_h * BBOX_SANITY_FACTOR {
        return Err(GeometryRejection::OutOfBounds);
    }

    let (sx, sy) = (geometry.scale_x(), geometry.scale_y());
    let (page_w, page_h) = (geometry.page.width, geometry.page.height);

    let x = (bbox.x0 * sx).max(0.0);
    let w = (bbox.width() * sx).max(1.0);
    let h = (bbox.height() * sy).max(1.0);
    let y = (page_h - bbox.y0 * sy - h).max(0.0);

    let rect = PdfRect {
        x,
        y,
        width: w.min(page_w - x),
        height: h.min(page_h - y),
    };

    if rect.area() / geometry.page.area() > MAX_PAGE_COVERAGE {
        return Err(GeometryRejection::ExcessiveCoverage);
    }
    if rect.width > page_w * MAX_WIDTH_FRACTION {
        return Err(GeometryRejection::ExcessiveWidth);
    }
    if rect.height > page_h * MAX_HEIGHT_FRACTION {
        return Err(GeometryRejection::ExcessiveHeight);
    }
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return Err(GeometryRejection::Degenerate);
    }

    Ok(rect)
}
