//! Deterministic inference engines and images for tests.

use crate::core::{OCRError, Tensor4D, TensorD};
use crate::core::inference::InferenceEngine;
use crate::domain::{Image, Vocabulary};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use ndarray::{Array3, Axis};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A 640x480 white page with black bars at `(x, y, width, height)`.
pub fn page_with_bars(bars: &[(i32, i32, u32, u32)]) -> Image {
    let mut page = RgbImage::from_pixel(640, 480, Rgb([255, 255, 255]));
    for &(x, y, w, h) in bars {
        draw_filled_rect_mut(&mut page, Rect::at(x, y).of_size(w, h), Rgb([0, 0, 0]));
    }
    match Image::from_rgb(page) {
        Ok(image) => image,
        Err(e) => panic!("test page is valid: {e}"),
    }
}

/// Detector whose heatmap is 1 wherever the first normalized input channel
/// is negative, i.e. on dark pixels.
#[derive(Debug, Clone)]
pub struct HeatmapDetector {
    pub input_shape: Vec<i64>,
}

impl Default for HeatmapDetector {
    fn default() -> Self {
        Self {
            input_shape: vec![1, 3, -1, -1],
        }
    }
}

impl InferenceEngine for HeatmapDetector {
    fn name(&self) -> &str {
        "stub_det"
    }

    fn input_shape(&self) -> Option<Vec<i64>> {
        Some(self.input_shape.clone())
    }

    fn run(&self, input: &Tensor4D) -> Result<TensorD, OCRError> {
        let channel = input.index_axis(Axis(0), 0).index_axis(Axis(0), 0).to_owned();
        let heat = channel.mapv(|v| if v < 0.0 { 1.0 } else { 0.0 });
        Ok(heat.insert_axis(Axis(0)).insert_axis(Axis(0)).into_dyn())
    }
}

/// Recognizer that emits the same text for every strip.
///
/// Each character takes two time steps, the character then a blank, with
/// probability 0.98 on the chosen class.
#[derive(Debug, Clone)]
pub struct ScriptedRecognizer {
    pub text: String,
    pub input_shape: Vec<i64>,
    pub num_classes: usize,
    /// Fail on inputs wider than this many pixels.
    pub fail_wider_than: Option<u32>,
    /// Sleep before answering.
    pub delay: Option<Duration>,
    /// Fired as soon as a strip arrives, before the delay.
    pub cancel_on_run: Option<CancellationToken>,
}

impl ScriptedRecognizer {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            input_shape: vec![1, 3, 48, -1],
            num_classes: Vocabulary::default().len(),
            fail_wider_than: None,
            delay: None,
            cancel_on_run: None,
        }
    }

    fn lattice(&self) -> Array3<f32> {
        let vocabulary = Vocabulary::default();
        let peak = 0.98;
        let rest = (1.0 - peak) / (self.num_classes - 1) as f32;
        let labels: Vec<usize> = self
            .text
            .chars()
            .flat_map(|c| {
                let label = vocabulary
                    .label_of(c)
                    .filter(|l| *l < self.num_classes)
                    .unwrap_or(0);
                [label, 0]
            })
            .collect();
        let mut scores = Array3::from_elem((1, labels.len(), self.num_classes), rest);
        for (t, label) in labels.into_iter().enumerate() {
            scores[[0, t, label]] = peak;
        }
        scores
    }
}

impl InferenceEngine for ScriptedRecognizer {
    fn name(&self) -> &str {
        "stub_rec"
    }

    fn input_shape(&self) -> Option<Vec<i64>> {
        Some(self.input_shape.clone())
    }

    fn run(&self, input: &Tensor4D) -> Result<TensorD, OCRError> {
        if let Some(token) = &self.cancel_on_run {
            token.cancel();
        }
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let width = input.shape()[3];
        if let Some(limit) = self.fail_wider_than {
            if width > limit as usize {
                return Err(OCRError::inference_message(
                    self.name(),
                    format!("input width {width} exceeds {limit}"),
                ));
            }
        }
        Ok(self.lattice().into_dyn())
    }
}
