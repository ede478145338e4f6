//! Data model shared by every pipeline stage.
//!
//! Three coordinate systems meet in this crate:
//!
//! | Space | Origin | Unit | Produced by |
//! |-------|--------|------|-------------|
//! | raster | top-left | pixel at the run's [`RenderScale`] | rasteriser, OCR engine |
//! | reference | top-left | pixel at scale 1.0 | recogniser (descaled boxes) |
//! | PDF | bottom-left | point | the PDF page itself |
//!
//! [`RecognizedFragment`] and [`RedactionTarget`] always carry
//! *reference-space* boxes. Only [`crate::pipeline::geometry`] converts to
//! PDF space.

use crate::error::RedactError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A rasterised page, owned by the stage that produced it.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    /// 0-based page index established at rasterisation time.
    pub page_index: usize,
    pub image: DynamicImage,
}

impl PixelBuffer {
    pub fn new(page_index: usize, image: DynamicImage) -> Self {
        Self { page_index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixel dimensions retained for the geometry pass after the image is dropped.
    pub fn dims(&self) -> RasterDims {
        RasterDims {
            width: self.width(),
            height: self.height(),
        }
    }
}

/// Pixel dimensions of a rasterised page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterDims {
    pub width: u32,
    pub height: u32,
}

/// Uniform multiplier applied to every page when rasterising for OCR.
///
/// One value per run: every bounding box on every page is converted with the
/// same scale, so it travels with the rasterised pages rather than as a
/// separately tracked constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct RenderScale(f32);

impl RenderScale {
    pub const MIN: f32 = 0.25;
    pub const MAX: f32 = 8.0;

    pub fn new(scale: f32) -> Result<Self, RedactError> {
        if !scale.is_finite() || !(Self::MIN..=Self::MAX).contains(&scale) {
            return Err(RedactError::InvalidConfig(format!(
                "render scale must be {}–{}, got {}",
                Self::MIN,
                Self::MAX,
                scale
            )));
        }
        Ok(Self(scale))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for RenderScale {
    fn default() -> Self {
        Self(2.0)
    }
}

impl TryFrom<f32> for RenderScale {
    type Error = RedactError;

    fn try_from(v: f32) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<RenderScale> for f32 {
    fn from(s: RenderScale) -> f32 {
        s.0
    }
}

impl fmt::Display for RenderScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Axis-aligned box `(x0, y0)`–`(x1, y1)` with a top-left origin.
///
/// OCR engines do not guarantee `x1 >= x0` or `y1 >= y0`; nothing in this
/// type enforces it either. Use [`BoundingBox::is_well_formed`] before
/// trusting the corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Divide every coordinate by `factor` (raster space → reference space).
    pub fn descale(&self, factor: f64) -> Self {
        Self {
            x0: self.x0 / factor,
            y0: self.y0 / factor,
            x1: self.x1 / factor,
            y1: self.y1 / factor,
        }
    }

    /// Non-negative origin and non-inverted corners.
    pub fn is_well_formed(&self) -> bool {
        self.x0 >= 0.0 && self.y0 >= 0.0 && self.x1 >= self.x0 && self.y1 >= self.y0
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

/// One line of OCR text in reference space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedFragment {
    pub text: String,
    pub bbox: BoundingBox,
    /// 0–100.
    pub confidence: f64,
}

/// A matched, confidence-passing fragment slated for an overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionTarget {
    /// Matched text, for reporting.
    pub word: String,
    pub bbox: BoundingBox,
    /// 0-based page index.
    pub page: usize,
}

/// PDF page size in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Everything the raster → PDF transform needs for one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page: PageSize,
    pub raster: RasterDims,
    pub scale: RenderScale,
}

impl PageGeometry {
    /// Raster width normalised back to reference scale.
    pub fn reference_width(&self) -> f64 {
        f64::from(self.raster.width) / f64::from(self.scale.get())
    }

    pub fn reference_height(&self) -> f64 {
        f64::from(self.raster.height) / f64::from(self.scale.get())
    }

    /// PDF points per reference pixel, horizontally.
    pub fn scale_x(&self) -> f64 {
        self.page.width / self.reference_width()
    }

    pub fn scale_y(&self) -> f64 {
        self.page.height / self.reference_height()
    }
}

/// Rectangle in PDF drawing space (bottom-left origin, points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PdfRect {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// Opaque fill colour for overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const BLACK: RgbColor = RgbColor { r: 0, g: 0, b: 0 };
}
