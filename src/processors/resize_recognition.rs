//! Resizing of rectified strips for the recognition model.

use image::RgbImage;
use image::imageops::{self, FilterType};

/// Resizer for recognition inputs.
///
/// Strips are scaled to `target_height` keeping their aspect ratio. With a
/// fixed model width, wider strips are squeezed to fit and narrower ones are
/// padded on the right by the normalizer; otherwise the width is only capped
/// at `max_width`.
#[derive(Debug, Clone, PartialEq)]
pub struct OCRResize {
    pub target_height: u32,
    pub fixed_width: Option<u32>,
    pub max_width: u32,
}

impl OCRResize {
    pub fn new(target_height: u32, fixed_width: Option<u32>, max_width: u32) -> Self {
        Self {
            target_height: target_height.max(1),
            fixed_width: fixed_width.filter(|w| *w > 0),
            max_width: max_width.max(1),
        }
    }

    /// Width of the tensor a resized strip of `content_width` is placed in.
    pub fn tensor_width(&self, content_width: u32) -> u32 {
        self.fixed_width.unwrap_or(content_width)
    }

    /// Resizes the strip. The result is at most `tensor_width` wide.
    pub fn apply(&self, img: &RgbImage) -> RgbImage {
        let (w, h) = img.dimensions();
        let ratio = w as f32 / h.max(1) as f32;
        let limit = self.fixed_width.unwrap_or(self.max_width);
        let resized_w = ((self.target_height as f32 * ratio).round() as u32).clamp(1, limit);

        if resized_w == w && self.target_height == h {
            return img.clone();
        }
        imageops::resize(img, resized_w, self.target_height, FilterType::Triangle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_aspect_ratio() {
        let resizer = OCRResize::new(32, None, 800);
        let out = resizer.apply(&RgbImage::new(200, 64));
        assert_eq!(out.dimensions(), (100, 32));
        assert_eq!(resizer.tensor_width(out.width()), 100);
    }

    #[test]
    fn test_fixed_width_pads_or_squeezes() {
        let resizer = OCRResize::new(48, Some(320), 800);
        let narrow = resizer.apply(&RgbImage::new(96, 48));
        assert_eq!(narrow.dimensions(), (96, 48));
        assert_eq!(resizer.tensor_width(narrow.width()), 320);

        let wide = resizer.apply(&RgbImage::new(2000, 48));
        assert_eq!(wide.dimensions(), (320, 48));
    }

    #[test]
    fn test_dynamic_width_is_capped() {
        let resizer = OCRResize::new(48, None, 500);
        let out = resizer.apply(&RgbImage::new(3000, 48));
        assert_eq!(out.width(), 500);
    }
}
