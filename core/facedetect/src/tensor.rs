use image::DynamicImage;
use ndarray::Array4;

use crate::face_detector::Device;

/// A batch-of-one image tensor in `[1, C, H, W]` layout.
///
/// Values stay in the `0.0..=255.0` range of the source pixels; any further
/// normalization is up to the detector.
#[derive(Debug, Clone)]
pub struct ImageTensor {
    /// Pixel values, `[1, C, H, W]`.
    pub data: Array4<f32>,
    /// Device the tensor was prepared for.
    pub device: Device,
}

impl ImageTensor {
    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.data.shape()[1]
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.data.shape()[2]
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.data.shape()[3]
    }

    /// Collapse the tensor to a row-major 8-bit luma buffer.
    pub fn to_luma8(&self) -> Vec<u8> {
        let (h, w) = (self.height(), self.width());
        let mut out = Vec::with_capacity(h * w);
        for y in 0..h {
            for x in 0..w {
                let v = if self.channels() >= 3 {
                    0.299 * self.data[[0, 0, y, x]]
                        + 0.587 * self.data[[0, 1, y, x]]
                        + 0.114 * self.data[[0, 2, y, x]]
                } else {
                    self.data[[0, 0, y, x]]
                };
                out.push(v.round().clamp(0.0, 255.0) as u8);
            }
        }
        out
    }
}

/// Convert an image to an RGB `f32` tensor prepared for `device`.
pub fn image_to_tensor(image: &DynamicImage, device: Device) -> ImageTensor {
    let rgb = image.to_rgb8();
    let (w, h) = (rgb.width() as usize, rgb.height() as usize);
    let data = Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
        rgb.get_pixel(x as u32, y as u32).0[c] as f32
    });
    ImageTensor { data, device }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn layout_is_batch_channel_height_width() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, image::Rgb([10, 20, 30]));
        let tensor = image_to_tensor(&DynamicImage::ImageRgb8(img), Device::Cpu);

        assert_eq!(tensor.data.shape(), &[1, 3, 2, 3]);
        assert_eq!(tensor.data[[0, 0, 1, 2]], 10.0);
        assert_eq!(tensor.data[[0, 1, 1, 2]], 20.0);
        assert_eq!(tensor.data[[0, 2, 1, 2]], 30.0);
        assert_eq!(tensor.device, Device::Cpu);
    }

    #[test]
    fn luma_of_gray_pixel_is_identity() {
        let mut img = RgbImage::new(1, 1);
        img.put_pixel(0, 0, image::Rgb([90, 90, 90]));
        let tensor = image_to_tensor(&DynamicImage::ImageRgb8(img), Device::Cpu);
        assert_eq!(tensor.to_luma8(), vec![90]);
    }
}
