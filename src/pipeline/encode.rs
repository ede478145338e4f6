//! Image encoding: page `DynamicImage` → grayscale PNG bytes for the OCR engine.
//!
//! PNG is lossless; JPEG ringing around glyph edges measurably hurts
//! tesseract accuracy at the 150 DPI range we render at. Tesseract binarises
//! internally, so dropping colour loses nothing and shrinks the file roughly
//! threefold.

use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page as a grayscale PNG.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let gray = DynamicImage::ImageLuma8(img.to_luma8());
    let mut buf = Vec::new();
    gray.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    debug!(
        "Encoded {}x{} page → {} bytes PNG",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let png = encode_png(&img).expect("encode should succeed");
        assert_eq!(&png[1..4], b"PNG");

        let decoded = image::load_from_memory(&png).expect("valid PNG");
        assert_eq!((decoded.width(), decoded.height()), (10, 10));
        assert!(matches!(decoded, DynamicImage::ImageLuma8(_)));
    }
}
