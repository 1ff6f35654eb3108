//! Letterbox resize to a fixed canvas, re-encoded as JPEG
//!
//! The source is scaled (Lanczos3) to fit inside the target size with its
//! aspect ratio intact, then centered on a white canvas of exactly the target
//! size. Transparency is dropped.

use image::{codecs::jpeg::JpegEncoder, imageops, imageops::FilterType, Rgb, RgbImage};
use thiserror::Error;

/// JPEG quality used for uploads.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("could not encode JPEG: {0}")]
    Encode(String),

    #[error("invalid target size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("transform aborted: {0}")]
    Aborted(String),
}

pub trait ImageTransformer: Send + Sync {
    fn transform(&self, bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, TransformError>;
}

#[derive(Debug, Clone)]
pub struct LetterboxTransformer {
    quality: u8,
    background: Rgb<u8>,
}

impl Default for LetterboxTransformer {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
            background: Rgb([255, 255, 255]),
        }
    }
}

impl LetterboxTransformer {
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }
}

impl ImageTransformer for LetterboxTransformer {
    fn transform(&self, bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, TransformError> {
        if width == 0 || height == 0 {
            return Err(TransformError::InvalidSize { width, height });
        }

        let source = image::load_from_memory(bytes)
            .map_err(|e| TransformError::Decode(e.to_string()))?
            .to_rgb8();

        let (src_w, src_h) = source.dimensions();
        if src_w == 0 || src_h == 0 {
            return Err(TransformError::Decode("image has no pixels".to_string()));
        }

        let (fit_w, fit_h) = fit_within(src_w, src_h, width, height);
        let resized = imageops::resize(&source, fit_w, fit_h, FilterType::Lanczos3);
        drop(source);

        let mut canvas = RgbImage::from_pixel(width, height, self.background);
        let x = i64::from((width - fit_w) / 2);
        let y = i64::from((height - fit_h) / 2);
        imageops::replace(&mut canvas, &resized, x, y);

        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, self.quality)
            .encode_image(&canvas)
            .map_err(|e| TransformError::Encode(e.to_string()))?;

        Ok(out)
    }
}

/// Largest size with the source's aspect ratio that fits the target
fn fit_within(src_w: u32, src_h: u32, width: u32, height: u32) -> (u32, u32) {
    let src_ratio = f64::from(src_w) / f64::from(src_h);
    let target_ratio = f64::from(width) / f64::from(height);

    let (w, h) = if src_ratio > target_ratio {
        (width, (f64::from(width) / src_ratio) as u32)
    } else {
        ((f64::from(height) * src_ratio) as u32, height)
    };

    (w.clamp(1, width), h.clamp(1, height))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(400, 100, 120, 80), (120, 30));
        assert_eq!(fit_within(100, 400, 120, 80), (20, 80));
        assert_eq!(fit_within(1200, 800, 1200, 800), (1200, 800));
        assert_eq!(fit_within(10_000, 1, 120, 80), (120, 1));
    }

    #[test]
    fn test_output_is_jpeg_of_target_size() {
        let out = LetterboxTransformer::default()
            .transform(&png(400, 100, [200, 0, 0]), 120, 80)
            .unwrap();

        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (120, 80));
    }

    #[test]
    fn test_wide_image_is_letterboxed_on_white() {
        let out = LetterboxTransformer::default()
            .transform(&png(400, 100, [200, 0, 0]), 120, 80)
            .unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgb8();

        let top = decoded.get_pixel(60, 2);
        assert!(top.0.iter().all(|c| *c > 230), "expected white bar, got {:?}", top);

        let center = decoded.get_pixel(60, 40);
        assert!(center.0[0] > 150 && center.0[1] < 60, "expected red, got {:?}", center);
    }

    #[test]
    fn test_undecodable_input() {
        let err = LetterboxTransformer::default()
            .transform(b"definitely not an image", 120, 80)
            .unwrap_err();
        assert!(matches!(err, TransformError::Decode(_)));
    }

    #[test]
    fn test_zero_target_size() {
        let err = LetterboxTransformer::default()
            .transform(&png(10, 10, [0, 0, 0]), 0, 80)
            .unwrap_err();
        assert_eq!(err, TransformError::InvalidSize { width: 0, height: 80 });
    }
}
