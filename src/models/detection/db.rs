//! DB (Differentiable Binarization) text detector.
//!
//! Handles preprocessing, inference and postprocessing of one image and
//! returns the surviving regions after non-maximum suppression.

use crate::core::inference::{InferenceEngine, fixed_input_dims};
use crate::core::{OCRError, PipelineConfig, Tensor4D, TensorD};
use crate::domain::{DetectedRegion, Image, RegionId};
use crate::processors::{
    DBPostProcess, DetResize, DetScaleInfo, NormalizeImage, non_max_suppression,
};
use ndarray::Array2;
use std::sync::Arc;
use tracing::debug;

/// Text detector over a shared inference engine.
#[derive(Debug, Clone)]
pub struct TextDetector {
    engine: Arc<dyn InferenceEngine>,
    resizer: DetResize,
    normalizer: NormalizeImage,
    postprocessor: DBPostProcess,
    nms_overlap_threshold: f32,
}

impl TextDetector {
    /// Creates a detector, sizing its inputs from the model's declared shape.
    ///
    /// A fixed input height and width selects letterboxing; a single input
    /// channel selects grayscale normalization.
    pub fn new(engine: Arc<dyn InferenceEngine>, config: &PipelineConfig) -> Self {
        let shape = engine.input_shape();
        let (channels, height, width) = fixed_input_dims(shape.as_deref());
        let resizer = match (height, width) {
            (Some(h), Some(w)) => DetResize::fixed(h as u32, w as u32),
            _ => DetResize::limit_side(config.limit_side_len, config.limit_type),
        };
        let normalizer = NormalizeImage::new(&config.detection_preprocess, channels == Some(1));
        debug!(
            "Detector '{}' input shape {:?}, resize mode {:?}",
            engine.name(),
            shape,
            resizer.mode
        );
        Self {
            engine,
            resizer,
            normalizer,
            postprocessor: DBPostProcess::from_config(config),
            nms_overlap_threshold: config.nms_overlap_threshold,
        }
    }

    pub fn model_name(&self) -> &str {
        self.engine.name()
    }

    /// Resizes and normalizes an image into the model input tensor.
    pub fn preprocess(&self, image: &Image) -> Result<(Tensor4D, DetScaleInfo), OCRError> {
        let (resized, info) = self.resizer.apply(image.as_rgb());
        let tensor =
            self.normalizer
                .to_tensor(&resized, info.input_h as usize, info.input_w as usize)?;
        Ok((tensor, info))
    }

    /// Runs the model and returns the probability heatmap.
    pub fn infer(&self, input: &Tensor4D) -> Result<Array2<f32>, OCRError> {
        let output = self.engine.run(input)?;
        heatmap(output).map_err(|shape| {
            OCRError::inference_message(
                self.engine.name(),
                format!("expected a [1, 1, H, W] or [1, H, W] heatmap, got {shape:?}"),
            )
        })
    }

    /// Converts a heatmap into regions, applying NMS and assigning ids.
    pub fn postprocess(&self, heatmap: &Array2<f32>, info: &DetScaleInfo) -> Vec<DetectedRegion> {
        let candidates: Vec<DetectedRegion> = self
            .postprocessor
            .process(heatmap.view(), info)
            .into_iter()
            .map(|(polygon, score)| DetectedRegion::new(RegionId(0), polygon, score))
            .collect();
        let found = candidates.len();

        let kept = non_max_suppression(candidates, self.nms_overlap_threshold);
        debug!("NMS kept {} of {} regions", kept.len(), found);
        kept.into_iter()
            .enumerate()
            .map(|(i, region)| DetectedRegion {
                id: RegionId(i as u32),
                ..region
            })
            .collect()
    }

    /// Runs the complete forward pass: preprocess -> infer -> postprocess.
    pub fn detect(&self, image: &Image) -> Result<Vec<DetectedRegion>, OCRError> {
        let (input, info) = self.preprocess(image)?;
        let heatmap = self.infer(&input)?;
        Ok(self.postprocess(&heatmap, &info))
    }
}

/// Extracts the `[H, W]` map from a `[1, 1, H, W]` or `[1, H, W]` output.
fn heatmap(output: TensorD) -> Result<Array2<f32>, Vec<usize>> {
    let shape = output.shape().to_vec();
    let (h, w) = match shape.as_slice() {
        [1, 1, h, w] | [1, h, w] => (*h, *w),
        _ => return Err(shape),
    };
    output
        .to_shape((h, w))
        .map(|view| view.to_owned())
        .map_err(|_| shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::{HeatmapDetector, page_with_bars};

    #[test]
    fn test_heatmap_shapes() {
        let four = ndarray::Array4::<f32>::zeros((1, 1, 4, 6)).into_dyn();
        assert_eq!(heatmap(four).unwrap().dim(), (4, 6));

        let three = ndarray::Array3::<f32>::zeros((1, 4, 6)).into_dyn();
        assert_eq!(heatmap(three).unwrap().dim(), (4, 6));

        let two_channels = ndarray::Array4::<f32>::zeros((1, 2, 4, 6)).into_dyn();
        assert_eq!(heatmap(two_channels).unwrap_err(), vec![1, 2, 4, 6]);

        let flat = ndarray::Array2::<f32>::zeros((4, 6)).into_dyn();
        assert!(heatmap(flat).is_err());
    }

    #[test]
    fn test_detects_bars_with_sequential_ids() {
        let config = PipelineConfig::default();
        let detector = TextDetector::new(Arc::new(HeatmapDetector::default()), &config);
        let image = page_with_bars(&[(100, 100, 100, 20), (300, 300, 150, 20)]);

        let regions = detector.detect(&image).unwrap();
        assert_eq!(regions.len(), 2);
        let mut ids: Vec<u32> = regions.iter().map(|r| r.id.0).collect();
        ids.sort();
        assert_eq!(ids, vec![0, 1]);
        for region in &regions {
            assert_eq!(region.polygon.points.len(), 4);
            assert!(region.confidence > 0.9);
        }

        let first = regions
            .iter()
            .find(|r| r.polygon.x_min() < 150.0)
            .unwrap();
        assert!(first.polygon.x_min() < 100.0 && first.polygon.x_max() > 199.0);
        assert!(first.polygon.y_min() < 100.0 && first.polygon.y_max() > 119.0);
    }

    #[test]
    fn test_blank_page_has_no_regions() {
        let detector = TextDetector::new(
            Arc::new(HeatmapDetector::default()),
            &PipelineConfig::default(),
        );
        assert!(detector.detect(&page_with_bars(&[])).unwrap().is_empty());
    }

    #[test]
    fn test_fixed_input_shape_letterboxes() {
        let engine = HeatmapDetector {
            input_shape: vec![1, 3, 320, 320],
        };
        let detector = TextDetector::new(Arc::new(engine), &PipelineConfig::default());
        let image = page_with_bars(&[(100, 100, 200, 40)]);
        let (input, info) = detector.preprocess(&image).unwrap();
        assert_eq!(input.shape(), &[1, 3, 320, 320]);
        assert_eq!((info.resized_w, info.resized_h), (320, 240));

        let regions = detector.detect(&image).unwrap();
        assert_eq!(regions.len(), 1);
        // coordinates are mapped back to the 640x480 page
        assert!(regions[0].polygon.x_max() > 290.0);
    }
}
