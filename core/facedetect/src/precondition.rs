use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

use crate::error::FaceDetError;

/// Longest side, in pixels, an image may have before it is downscaled.
pub const MAX_SIDE: u32 = 1000;

/// An image ready for detection, plus the factors that map its pixel
/// coordinates back onto the source image.
#[derive(Debug, Clone)]
pub struct ConditionedImage {
    /// The (possibly downscaled) image.
    pub pixels: DynamicImage,
    /// Width of the source image.
    pub original_width: u32,
    /// Height of the source image.
    pub original_height: u32,
    /// Width of `pixels`.
    pub scaled_width: u32,
    /// Height of `pixels`.
    pub scaled_height: u32,
    /// `original_width / scaled_width`; exactly 1.0 when not downscaled.
    pub width_ratio: f32,
    /// `original_height / scaled_height`; exactly 1.0 when not downscaled.
    pub height_ratio: f32,
}

impl ConditionedImage {
    /// Whether the source image was resized.
    pub fn was_downscaled(&self) -> bool {
        self.scaled_width != self.original_width || self.scaled_height != self.original_height
    }

    /// Map a point in scaled coordinates onto the source image.
    pub fn to_original(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.width_ratio, y * self.height_ratio)
    }
}

/// Target size for an image whose longer side exceeds `max_side`, or `None`
/// when it already fits.
///
/// Wider-than-tall images pin the width to `max_side`; all others pin the height.
pub(crate) fn scaled_size(width: u32, height: u32, max_side: u32) -> Option<(u32, u32)> {
    if width <= max_side && height <= max_side {
        return None;
    }

    let aspect = width as f64 / height as f64;
    let size = if aspect > 1.0 {
        let h = (max_side as f64 / aspect).round() as u32;
        (max_side, h.max(1))
    } else {
        let w = (max_side as f64 * aspect).round() as u32;
        (w.max(1), max_side)
    };
    Some(size)
}

/// Downscale `image` so neither side exceeds `max_side`, keeping the aspect ratio.
///
/// Images that already fit pass through untouched with unit ratios.
/// Zero-area images are rejected.
pub fn precondition(image: DynamicImage, max_side: u32) -> Result<ConditionedImage, FaceDetError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(FaceDetError::ZeroDimensions);
    }

    let Some((new_w, new_h)) = scaled_size(width, height, max_side) else {
        return Ok(ConditionedImage {
            pixels: image,
            original_width: width,
            original_height: height,
            scaled_width: width,
            scaled_height: height,
            width_ratio: 1.0,
            height_ratio: 1.0,
        });
    };

    debug!(width, height, new_w, new_h, "downscaling input image");
    let pixels = image.resize_exact(new_w, new_h, FilterType::Triangle);

    Ok(ConditionedImage {
        pixels,
        original_width: width,
        original_height: height,
        scaled_width: new_w,
        scaled_height: new_h,
        width_ratio: width as f32 / new_w as f32,
        height_ratio: height as f32 / new_h as f32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn blank(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
    }

    #[test]
    fn small_image_passes_through() {
        let out = precondition(blank(640, 480), MAX_SIDE).unwrap();
        assert!(!out.was_downscaled());
        assert_eq!((out.pixels.width(), out.pixels.height()), (640, 480));
        assert_eq!(out.width_ratio, 1.0);
        assert_eq!(out.height_ratio, 1.0);
    }

    #[test]
    fn exactly_at_limit_is_not_resized() {
        let out = precondition(blank(1000, 1000), MAX_SIDE).unwrap();
        assert!(!out.was_downscaled());
        assert_eq!(out.width_ratio, 1.0);
    }

    #[test]
    fn landscape_pins_width() {
        let out = precondition(blank(2000, 1000), MAX_SIDE).unwrap();
        assert_eq!((out.scaled_width, out.scaled_height), (1000, 500));
        assert_eq!((out.pixels.width(), out.pixels.height()), (1000, 500));
        assert_eq!(out.width_ratio, 2.0);
        assert_eq!(out.height_ratio, 2.0);
    }

    #[test]
    fn portrait_pins_height() {
        let out = precondition(blank(500, 2000), MAX_SIDE).unwrap();
        assert_eq!((out.scaled_width, out.scaled_height), (250, 1000));
        assert_eq!(out.width_ratio, 2.0);
        assert_eq!(out.height_ratio, 2.0);
    }

    #[test]
    fn square_over_limit_pins_height() {
        // aspect == 1 takes the "not wider" branch
        assert_eq!(scaled_size(1500, 1500, 1000), Some((1000, 1000)));
    }

    #[test]
    fn ratios_never_below_one_when_downscaled() {
        for (w, h) in [(1001, 3), (3, 1001), (4000, 2999), (1234, 5678)] {
            let out = precondition(blank(w, h), MAX_SIDE).unwrap();
            assert!(out.was_downscaled());
            assert!(out.width_ratio >= 1.0, "{w}x{h}: {}", out.width_ratio);
            assert!(out.height_ratio >= 1.0, "{w}x{h}: {}", out.height_ratio);
            assert!(out.scaled_width >= 1 && out.scaled_height >= 1);
        }
    }

    #[test]
    fn rescale_round_trip() {
        let out = precondition(blank(3000, 1200), MAX_SIDE).unwrap();
        let (x, y) = (123.0_f32, 77.0_f32);
        let (ox, oy) = out.to_original(x, y);
        assert!((ox / out.width_ratio - x).abs() < 1e-3);
        assert!((oy / out.height_ratio - y).abs() < 1e-3);
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(matches!(
            precondition(blank(0, 10), MAX_SIDE),
            Err(FaceDetError::ZeroDimensions)
        ));
        assert!(matches!(
            precondition(blank(10, 0), MAX_SIDE),
            Err(FaceDetError::ZeroDimensions)
        ));
    }
}
