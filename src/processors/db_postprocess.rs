//! Post-processing for DB (Differentiable Binarization) text detection models.
//!
//! The [`DBPostProcess`] struct converts a raw detection heatmap into scored
//! quadrilaterals by thresholding, contour extraction, scoring and unclipping.
//! Mask morphology and polygon scoring live in helper modules next to this
//! file.

#[path = "db_mask.rs"]
mod db_mask;
#[path = "db_score.rs"]
mod db_score;

use crate::core::config::PipelineConfig;
use crate::core::constants::{
    DEFAULT_BINARIZATION_THRESHOLD, DEFAULT_DETECTION_THRESHOLD, DEFAULT_MAX_CANDIDATES,
    DEFAULT_MIN_REGION_SIZE, DEFAULT_UNCLIP_RATIO,
};
use crate::processors::geometry::{BoundingBox, Point};
use crate::processors::resize_detection::DetScaleInfo;
use imageproc::contours::{BorderType, Contour, find_contours};
use imageproc::point::Point as ImagePoint;
use ndarray::{ArrayView2, s};
use tracing::debug;

/// Post-processor for DB (Differentiable Binarization) text detection models.
#[derive(Debug, Clone)]
pub struct DBPostProcess {
    /// Threshold for binarizing the prediction map (default: 0.3).
    pub binarization_threshold: f32,
    /// Minimum mean heatmap value inside a region (default: 0.6).
    pub detection_threshold: f32,
    /// Maximum number of contours to consider (default: 1000).
    pub max_candidates: usize,
    /// Ratio for unclipping (expanding) regions (default: 1.5).
    pub unclip_ratio: f32,
    /// Minimum short side of a region.
    pub min_size: f32,
    /// Whether to dilate the binary mask before contour detection.
    pub use_dilation: bool,
}

impl Default for DBPostProcess {
    fn default() -> Self {
        Self {
            binarization_threshold: DEFAULT_BINARIZATION_THRESHOLD,
            detection_threshold: DEFAULT_DETECTION_THRESHOLD,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            unclip_ratio: DEFAULT_UNCLIP_RATIO,
            min_size: DEFAULT_MIN_REGION_SIZE,
            use_dilation: false,
        }
    }
}

impl DBPostProcess {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            binarization_threshold: config.binarization_threshold,
            detection_threshold: config.detection_threshold,
            max_candidates: config.max_candidates,
            unclip_ratio: config.unclip_ratio,
            min_size: config.min_region_size,
            use_dilation: config.use_dilation,
        }
    }

    /// Extracts scored quadrilaterals from a heatmap, in source image
    /// coordinates.
    ///
    /// `pred` covers the whole model input; only the part holding resized
    /// image content (not padding) is searched.
    pub fn process(&self, pred: ArrayView2<'_, f32>, info: &DetScaleInfo) -> Vec<(BoundingBox, f32)> {
        let (pred_h, pred_w) = pred.dim();
        if pred_h == 0 || pred_w == 0 || info.src_w == 0 || info.src_h == 0 {
            return Vec::new();
        }

        // the heatmap may be downsampled relative to the input tensor
        let valid_w = ((info.resized_w as f32 * pred_w as f32 / info.input_w.max(1) as f32).round()
            as usize)
            .clamp(1, pred_w);
        let valid_h = ((info.resized_h as f32 * pred_h as f32 / info.input_h.max(1) as f32).round()
            as usize)
            .clamp(1, pred_h);
        let pred = pred.slice(s![..valid_h, ..valid_w]);

        let mut mask = self.binarize(&pred);
        if self.use_dilation {
            mask = self.dilate_mask(&mask);
        }
        let mask = self.frame_mask(&mask);

        let dest_w = info.src_w as f32;
        let dest_h = info.src_h as f32;
        let width_scale = dest_w / valid_w as f32;
        let height_scale = dest_h / valid_h as f32;

        let contours = find_contours::<u32>(&mask);
        let mut results = Vec::new();

        for contour in contours
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer)
            .take(self.max_candidates)
        {
            let bbox = BoundingBox::from_contour(&unframe(contour));
            if bbox.get_min_area_rect().min_side() < self.min_size {
                continue;
            }

            let score = self.box_score_fast(&pred, &bbox);
            if score < self.detection_threshold {
                continue;
            }

            let final_rect = bbox.unclip(self.unclip_ratio).get_min_area_rect();
            if final_rect.min_side() < self.min_size + 2.0 {
                continue;
            }

            let points = final_rect
                .get_box_points()
                .iter()
                .map(|p| {
                    Point::new(
                        (p.x * width_scale).clamp(0.0, dest_w),
                        (p.y * height_scale).clamp(0.0, dest_h),
                    )
                })
                .collect();
            results.push((BoundingBox::new(points), score));
        }

        debug!("DB post-processing kept {} candidate regions", results.len());
        results
    }
}

/// Maps a contour found on a framed mask back to heatmap coordinates.
fn unframe(contour: Contour<u32>) -> Contour<u32> {
    let points = contour
        .points
        .iter()
        .map(|p| ImagePoint::new(p.x.saturating_sub(1), p.y.saturating_sub(1)))
        .collect();
    Contour::new(points, contour.border_type, contour.parent)
}
