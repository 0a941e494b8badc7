use image::{GrayImage, Luma, imageops};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use ndarray::ArrayView2;

use super::DBPostProcess;

impl DBPostProcess {
    /// Builds the binary text mask: 255 where the heatmap exceeds the
    /// binarization threshold.
    pub(super) fn binarize(&self, pred: &ArrayView2<'_, f32>) -> GrayImage {
        let (height, width) = pred.dim();
        GrayImage::from_fn(width as u32, height as u32, |x, y| {
            if pred[[y as usize, x as usize]] > self.binarization_threshold {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    /// Applies dilation to a binary mask using a Chebyshev radius of 1.
    pub(super) fn dilate_mask(&self, mask: &GrayImage) -> GrayImage {
        if mask.width() == 0 || mask.height() == 0 {
            return mask.clone();
        }
        morphology::dilate(mask, Norm::LInf, 1)
    }

    /// Surrounds a mask with a one-pixel background frame.
    ///
    /// `find_contours` classifies a blob that starts on column 0 as a hole
    /// border. With the frame every blob starts inside the image and gets
    /// an outer border; contour points are then offset by one.
    pub(super) fn frame_mask(&self, mask: &GrayImage) -> GrayImage {
        let mut framed = GrayImage::new(mask.width() + 2, mask.height() + 2);
        imageops::replace(&mut framed, mask, 1, 1);
        framed
    }
}
