//! Image resizing for the text detection model.
//!
//! Two strategies are supported:
//! - `LimitSide`: scale by a side-length limit and round both sides to a
//!   multiple of [`DETECTION_STRIDE`], for models with dynamic input size.
//! - `Fixed`: letterbox into a fixed `height x width` input, padding the
//!   bottom and right edges.

use crate::core::constants::{DEFAULT_LIMIT_SIDE_LEN, DEFAULT_MAX_SIDE_LIMIT, DETECTION_STRIDE};
use crate::processors::types::LimitType;
use image::RgbImage;
use image::imageops::{self, FilterType};
use tracing::warn;

/// How a detection input is sized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetResizeMode {
    LimitSide {
        limit_side_len: u32,
        limit_type: LimitType,
    },
    /// The model declares a fixed input size.
    Fixed { height: u32, width: u32 },
}

/// Geometry of one resize: the source size, the size of the resized content
/// and the size of the tensor it sits in (content plus padding).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetScaleInfo {
    pub src_w: u32,
    pub src_h: u32,
    pub resized_w: u32,
    pub resized_h: u32,
    pub input_w: u32,
    pub input_h: u32,
}

/// Resizer for detection inputs.
#[derive(Debug, Clone)]
pub struct DetResize {
    pub mode: DetResizeMode,
    /// The maximum allowed side length for `LimitSide`.
    pub max_side_limit: u32,
}

impl Default for DetResize {
    fn default() -> Self {
        Self::limit_side(DEFAULT_LIMIT_SIDE_LEN, LimitType::Max)
    }
}

impl DetResize {
    pub fn limit_side(limit_side_len: u32, limit_type: LimitType) -> Self {
        Self {
            mode: DetResizeMode::LimitSide {
                limit_side_len,
                limit_type,
            },
            max_side_limit: DEFAULT_MAX_SIDE_LIMIT,
        }
    }

    pub fn fixed(height: u32, width: u32) -> Self {
        Self {
            mode: DetResizeMode::Fixed { height, width },
            max_side_limit: DEFAULT_MAX_SIDE_LIMIT,
        }
    }

    /// Computes the resize, without touching pixels.
    pub fn plan(&self, src_w: u32, src_h: u32) -> DetScaleInfo {
        match self.mode {
            DetResizeMode::LimitSide {
                limit_side_len,
                limit_type,
            } => {
                let (w, h) = self.limit_side_dims(src_w, src_h, limit_side_len, limit_type);
                DetScaleInfo {
                    src_w,
                    src_h,
                    resized_w: w,
                    resized_h: h,
                    input_w: w,
                    input_h: h,
                }
            }
            DetResizeMode::Fixed { height, width } => {
                let scale = 1.0f32
                    .min(width as f32 / src_w.max(1) as f32)
                    .min(height as f32 / src_h.max(1) as f32);
                let resized_w = ((src_w as f32 * scale).round() as u32).clamp(1, width.max(1));
                let resized_h = ((src_h as f32 * scale).round() as u32).clamp(1, height.max(1));
                DetScaleInfo {
                    src_w,
                    src_h,
                    resized_w,
                    resized_h,
                    input_w: width,
                    input_h: height,
                }
            }
        }
    }

    fn limit_side_dims(&self, w: u32, h: u32, limit_side_len: u32, limit_type: LimitType) -> (u32, u32) {
        let ratio = match limit_type {
            LimitType::Max if h.max(w) > limit_side_len => limit_side_len as f32 / h.max(w) as f32,
            LimitType::Min if h.min(w) < limit_side_len => {
                limit_side_len as f32 / h.min(w).max(1) as f32
            }
            _ => 1.0,
        };

        let mut resize_h = (h as f32 * ratio) as u32;
        let mut resize_w = (w as f32 * ratio) as u32;

        if resize_h.max(resize_w) > self.max_side_limit {
            warn!(
                "Resized image size ({}x{}) exceeds max_side_limit of {}. Resizing to fit within limit.",
                resize_w, resize_h, self.max_side_limit
            );
            let limit_ratio = self.max_side_limit as f32 / resize_h.max(resize_w) as f32;
            resize_h = (resize_h as f32 * limit_ratio) as u32;
            resize_w = (resize_w as f32 * limit_ratio) as u32;
        }

        // round to the nearest multiple of the stride, never below one stride
        let half = DETECTION_STRIDE / 2;
        resize_h = ((resize_h + half) / DETECTION_STRIDE * DETECTION_STRIDE).max(DETECTION_STRIDE);
        resize_w = ((resize_w + half) / DETECTION_STRIDE * DETECTION_STRIDE).max(DETECTION_STRIDE);
        while resize_h > self.max_side_limit.max(DETECTION_STRIDE) {
            resize_h -= DETECTION_STRIDE;
        }
        while resize_w > self.max_side_limit.max(DETECTION_STRIDE) {
            resize_w -= DETECTION_STRIDE;
        }
        (resize_w, resize_h)
    }

    /// Resizes an image; the returned image has the resized content size, any
    /// padding up to `input_w x input_h` is added during normalization.
    pub fn apply(&self, img: &RgbImage) -> (RgbImage, DetScaleInfo) {
        let info = self.plan(img.width(), img.height());
        if info.resized_w == img.width() && info.resized_h == img.height() {
            return (img.clone(), info);
        }
        let resized = imageops::resize(img, info.resized_w, info.resized_h, FilterType::Triangle);
        (resized, info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_side_rounds_to_stride() {
        let resizer = DetResize::limit_side(960, LimitType::Max);
        let info = resizer.plan(640, 480);
        assert_eq!((info.resized_w, info.resized_h), (640, 480));

        let info = resizer.plan(1920, 1000);
        assert_eq!(info.resized_w, 960);
        assert_eq!(info.resized_h % 32, 0);
        assert_eq!((info.input_w, info.input_h), (info.resized_w, info.resized_h));
    }

    #[test]
    fn test_tiny_image_gets_one_stride() {
        let info = DetResize::default().plan(5, 7);
        assert_eq!((info.resized_w, info.resized_h), (32, 32));
    }

    #[test]
    fn test_limit_min_upscales() {
        let info = DetResize::limit_side(736, LimitType::Min).plan(200, 100);
        assert_eq!(info.resized_h, 736);
        assert_eq!(info.resized_w, 1472);
    }

    #[test]
    fn test_max_side_limit_is_respected() {
        let mut resizer = DetResize::limit_side(8000, LimitType::Min);
        resizer.max_side_limit = 1000;
        let info = resizer.plan(100, 3000);
        assert!(info.resized_h <= 1000);
        assert!(info.resized_w >= 32);
    }

    #[test]
    fn test_fixed_letterbox_keeps_aspect_ratio() {
        let info = DetResize::fixed(640, 640).plan(1280, 640);
        assert_eq!((info.resized_w, info.resized_h), (640, 320));
        assert_eq!((info.input_w, info.input_h), (640, 640));

        // never upscales
        let info = DetResize::fixed(640, 640).plan(100, 50);
        assert_eq!((info.resized_w, info.resized_h), (100, 50));
    }

    #[test]
    fn test_apply_resizes_pixels() {
        let img = RgbImage::new(1920, 1080);
        let (resized, info) = DetResize::default().apply(&img);
        assert_eq!(resized.width(), info.resized_w);
        assert_eq!(resized.height(), info.resized_h);
    }
}
