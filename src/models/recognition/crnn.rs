//! CRNN-style text recognizer.
//!
//! Turns a rectified strip into a [`Lattice`] of per-time-step class
//! probabilities. Decoding happens afterwards in
//! [`CTCDecoder`](crate::processors::CTCDecoder).

use crate::core::inference::{InferenceEngine, fixed_input_dims};
use crate::core::{OCRError, PipelineConfig, Tensor4D};
use crate::domain::{Lattice, LatticeEncoding, LatticeLayout, RectifiedStrip, Vocabulary};
use crate::processors::{NormalizeImage, OCRResize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TextRecognizer {
    engine: Arc<dyn InferenceEngine>,
    resizer: OCRResize,
    normalizer: NormalizeImage,
    layout: LatticeLayout,
    encoding: LatticeEncoding,
    vocabulary: Arc<Vocabulary>,
}

impl TextRecognizer {
    /// Creates a recognizer.
    ///
    /// The input height is the model's fixed height when it declares one,
    /// otherwise `strip_height`. A fixed input width pads narrower strips;
    /// a dynamic one follows the strip, capped at `max_strip_width`.
    pub fn new(
        engine: Arc<dyn InferenceEngine>,
        config: &PipelineConfig,
        vocabulary: Arc<Vocabulary>,
    ) -> Self {
        let shape = engine.input_shape();
        let (channels, height, width) = fixed_input_dims(shape.as_deref());
        let target_height = height.map_or(config.strip_height, |h| h as u32);
        let resizer = OCRResize::new(
            target_height,
            width.map(|w| w as u32),
            config.max_strip_width,
        );
        debug!(
            "Recognizer '{}' input shape {:?}, {} classes",
            engine.name(),
            shape,
            vocabulary.len()
        );
        Self {
            engine,
            resizer,
            normalizer: NormalizeImage::new(&config.recognition_preprocess, channels == Some(1)),
            layout: config.lattice_layout,
            encoding: config.lattice_encoding,
            vocabulary,
        }
    }

    pub fn model_name(&self) -> &str {
        self.engine.name()
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    /// Resizes and normalizes a strip into the model input tensor.
    pub fn preprocess(&self, strip: &RectifiedStrip) -> Result<Tensor4D, OCRError> {
        let resized = self.resizer.apply(&strip.image);
        let width = self.resizer.tensor_width(resized.width());
        self.normalizer
            .to_tensor(&resized, self.resizer.target_height as usize, width as usize)
    }

    /// Runs the model and reads its output as a lattice.
    ///
    /// # Errors
    ///
    /// Returns `OCRError::Inference` if the model fails, its output is not
    /// a valid lattice, or its class count differs from the vocabulary.
    pub fn infer(&self, input: &Tensor4D) -> Result<Lattice, OCRError> {
        let output = self.engine.run(input)?;
        let scores = Lattice::sequence_scores(output, self.layout)?;
        if scores.ncols() != self.vocabulary.len() {
            return Err(OCRError::inference_message(
                self.engine.name(),
                format!(
                    "model produces {} classes but the vocabulary has {}",
                    scores.ncols(),
                    self.vocabulary.len()
                ),
            ));
        }
        Lattice::from_scores(scores, self.encoding)
    }

    pub fn recognize(&self, strip: &RectifiedStrip) -> Result<Lattice, OCRError> {
        let input = self.preprocess(strip)?;
        self.infer(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;
    use crate::domain::RegionId;
    use crate::pipeline::test_support::ScriptedRecognizer;
    use crate::processors::CTCDecoder;
    use image::{Rgb, RgbImage};

    fn strip(width: u32) -> RectifiedStrip {
        RectifiedStrip {
            region_id: RegionId(0),
            image: RgbImage::from_pixel(width, 48, Rgb([255, 255, 255])),
        }
    }

    fn recognizer(engine: ScriptedRecognizer) -> TextRecognizer {
        TextRecognizer::new(
            Arc::new(engine),
            &PipelineConfig::default(),
            Arc::new(Vocabulary::default()),
        )
    }

    #[test]
    fn test_recognize_and_decode() {
        let recognizer = recognizer(ScriptedRecognizer::new("HELLO"));
        let lattice = recognizer.recognize(&strip(120)).unwrap();
        assert_eq!(lattice.num_classes(), 97);
        assert_eq!(lattice.time_steps(), 10);

        let decoded = CTCDecoder::greedy(recognizer.vocabulary().clone()).decode(&lattice);
        assert_eq!(decoded.text, "HELLO");
        assert!(decoded.confidence > 0.9);
    }

    #[test]
    fn test_dynamic_width_follows_strip() {
        let recognizer = recognizer(ScriptedRecognizer::new("A"));
        let input = recognizer.preprocess(&strip(137)).unwrap();
        assert_eq!(input.shape(), &[1, 3, 48, 137]);

        let capped = recognizer.preprocess(&strip(5000)).unwrap();
        assert_eq!(capped.shape(), &[1, 3, 48, 800]);
    }

    #[test]
    fn test_fixed_input_shape_is_respected() {
        let engine = ScriptedRecognizer {
            input_shape: vec![1, 1, 32, 320],
            ..ScriptedRecognizer::new("A")
        };
        let input = recognizer(engine).preprocess(&strip(96)).unwrap();
        assert_eq!(input.shape(), &[1, 1, 32, 320]);
    }

    #[test]
    fn test_class_count_mismatch_is_inference_error() {
        let engine = ScriptedRecognizer {
            num_classes: 40,
            ..ScriptedRecognizer::new("A")
        };
        let err = recognizer(engine).recognize(&strip(64)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inference);
    }

    #[test]
    fn test_model_failure_propagates() {
        let engine = ScriptedRecognizer {
            fail_wider_than: Some(100),
            ..ScriptedRecognizer::new("A")
        };
        let recognizer = recognizer(engine);
        assert!(recognizer.recognize(&strip(64)).is_ok());
        let err = recognizer.recognize(&strip(300)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inference);
    }
}
