//! Image normalization for model inputs.
//!
//! Converts RGB images into NCHW `f32` tensors, applying `pixel * scale`
//! followed by per-channel mean/std normalization, optionally collapsing to
//! a single luminance channel.

use crate::core::config::PreprocessConfig;
use crate::core::errors::SimpleError;
use crate::core::{OCRError, Tensor4D};
use image::RgbImage;
use rayon::prelude::*;

/// ITU-R BT.601 luma weights.
const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Normalizes images for model inference.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeImage {
    /// Scaling factors for each channel (alpha = scale / std)
    pub alpha: [f32; 3],
    /// Offset values for each channel (beta = -mean / std)
    pub beta: [f32; 3],
    /// Emit one luminance channel instead of RGB.
    pub grayscale: bool,
}

impl NormalizeImage {
    pub fn new(config: &PreprocessConfig, grayscale: bool) -> Self {
        let mut alpha = [0.0; 3];
        let mut beta = [0.0; 3];
        for c in 0..3 {
            alpha[c] = config.scale / config.std[c];
            beta[c] = -config.mean[c] / config.std[c];
        }
        Self {
            alpha,
            beta,
            grayscale,
        }
    }

    /// Number of channels in the produced tensor.
    pub fn channels(&self) -> usize {
        if self.grayscale { 1 } else { 3 }
    }

    /// Normalizes `img` into a `[1, C, target_h, target_w]` tensor.
    ///
    /// The image is placed at the top-left corner and the remaining area is
    /// zero, which is the normalized mean.
    pub fn to_tensor(
        &self,
        img: &RgbImage,
        target_h: usize,
        target_w: usize,
    ) -> Result<Tensor4D, OCRError> {
        let (width, height) = (img.width() as usize, img.height() as usize);
        if width > target_w || height > target_h {
            return Err(OCRError::normalization(
                &format!("image {width}x{height} does not fit a {target_w}x{target_h} input"),
                SimpleError::new("image larger than tensor"),
            ));
        }
        if target_w == 0 || target_h == 0 {
            return Err(OCRError::invalid_input(format!(
                "tensor size must be non-zero, got {target_w}x{target_h}"
            )));
        }

        let channels = self.channels();
        let mut data = vec![0.0f32; channels * target_h * target_w];
        let raw = img.as_raw();

        data.par_chunks_mut(target_w)
            .enumerate()
            .for_each(|(row_idx, row)| {
                let c = row_idx / target_h;
                let y = row_idx % target_h;
                if y >= height {
                    return;
                }
                let src_row = &raw[y * width * 3..(y + 1) * width * 3];
                for (dst, px) in row.iter_mut().zip(src_row.chunks_exact(3)) {
                    *dst = if self.grayscale {
                        let luma = LUMA_WEIGHTS[0] * px[0] as f32
                            + LUMA_WEIGHTS[1] * px[1] as f32
                            + LUMA_WEIGHTS[2] * px[2] as f32;
                        luma * self.alpha[0] + self.beta[0]
                    } else {
                        px[c] as f32 * self.alpha[c] + self.beta[c]
                    };
                }
            });

        Ok(Tensor4D::from_shape_vec(
            (1, channels, target_h, target_w),
            data,
        )?)
    }
}
