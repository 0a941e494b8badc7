//! Pipeline configuration.
//!
//! [`PipelineConfig`] is the single knob set for the whole pipeline. Every field
//! has a default, so a JSON file only needs to name the values it overrides:
//!
//! ```rust
//! use lineocr::core::config::PipelineConfig;
//!
//! let config = PipelineConfig::from_json_str(r#"{ "strict_mode": true, "beam_width": 4 }"#)?;
//! assert!(config.strict_mode);
//! assert_eq!(config.detection_threshold, 0.6);
//! # Ok::<(), lineocr::core::OCRError>(())
//! ```

use super::onnx::OrtSessionConfig;
use crate::core::constants::*;
use crate::core::validation::{validate_channel_values, validate_positive, validate_range};
use crate::core::OCRError;
use crate::domain::{LatticeEncoding, LatticeLayout};
use crate::processors::{DecodingPolicy, LimitType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Pixel normalization applied before a model sees an image.
///
/// Each channel value `v` in `0..=255` becomes `(v * scale - mean[c]) / std[c]`.
/// Single-channel models use the first entry of `mean` and `std`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    pub scale: f32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl PreprocessConfig {
    /// ImageNet statistics, the usual choice for DB detection models.
    pub fn imagenet() -> Self {
        Self {
            scale: 1.0 / 255.0,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
        }
    }

    /// Maps pixels to `[-1, 1]`, as CRNN recognition models expect.
    pub fn centered() -> Self {
        Self {
            scale: 1.0 / 255.0,
            mean: [0.5, 0.5, 0.5],
            std: [0.5, 0.5, 0.5],
        }
    }

    /// Maps pixels to `[-0.5, 0.5]`, as the ocrs models expect.
    pub fn shifted() -> Self {
        Self {
            scale: 1.0 / 255.0,
            mean: [0.5, 0.5, 0.5],
            std: [1.0, 1.0, 1.0],
        }
    }

    fn validate(&self, name: &str) -> Result<(), OCRError> {
        validate_positive(self.scale, &format!("{name}.scale"))?;
        validate_channel_values(&self.mean, &format!("{name}.mean"))?;
        validate_channel_values(&self.std, &format!("{name}.std"))?;
        for value in self.std {
            validate_positive(value, &format!("{name}.std"))?;
        }
        Ok(())
    }
}

/// Configuration for the whole OCR pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Regions whose mean heatmap score is below this are discarded.
    pub detection_threshold: f32,
    /// Pixel threshold used to binarize the detection heatmap.
    pub binarization_threshold: f32,
    /// Regions overlapping a stronger region by more than this IoU are suppressed.
    pub nms_overlap_threshold: f32,
    /// Expansion applied to detected contours.
    pub unclip_ratio: f32,
    /// Maximum number of contours examined per image.
    pub max_candidates: usize,
    /// Minimum short side of a region, in heatmap pixels.
    pub min_region_size: f32,
    /// Dilate the binarized heatmap before contour extraction.
    pub use_dilation: bool,
    /// Side length limit for dynamic-shape detection models.
    pub limit_side_len: u32,
    /// Whether `limit_side_len` caps the long side or raises the short side.
    pub limit_type: LimitType,
    /// Height of rectified strips.
    pub strip_height: u32,
    /// Maximum width of rectified strips.
    pub max_strip_width: u32,
    pub decoding_policy: DecodingPolicy,
    /// Number of beams for [`DecodingPolicy::Beam`].
    pub beam_width: usize,
    /// Number of regions processed concurrently.
    pub worker_count: usize,
    /// Time budget for rectify, recognize and decode of one region.
    pub per_region_timeout_ms: u64,
    /// Optional time budget for detection.
    pub detection_timeout_ms: Option<u64>,
    /// Abort on the first per-region failure.
    pub strict_mode: bool,
    /// Row-grouping tolerance, as a fraction of the row's mean region height.
    pub line_height_tolerance: f32,
    /// Number of ONNX sessions per model; defaults to `worker_count`.
    pub session_pool_size: Option<usize>,
    pub detection_preprocess: PreprocessConfig,
    pub recognition_preprocess: PreprocessConfig,
    pub lattice_layout: LatticeLayout,
    pub lattice_encoding: LatticeEncoding,
    /// Character dictionary replacing the default Latin alphabet.
    pub character_dict_path: Option<PathBuf>,
    /// Append a space symbol to a dictionary that lacks one.
    pub use_space_char: bool,
    pub ort: OrtSessionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detection_threshold: DEFAULT_DETECTION_THRESHOLD,
            binarization_threshold: DEFAULT_BINARIZATION_THRESHOLD,
            nms_overlap_threshold: DEFAULT_NMS_OVERLAP_THRESHOLD,
            unclip_ratio: DEFAULT_UNCLIP_RATIO,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            min_region_size: DEFAULT_MIN_REGION_SIZE,
            use_dilation: false,
            limit_side_len: DEFAULT_LIMIT_SIDE_LEN,
            limit_type: LimitType::Max,
            strip_height: DEFAULT_STRIP_HEIGHT,
            max_strip_width: DEFAULT_MAX_STRIP_WIDTH,
            decoding_policy: DecodingPolicy::Greedy,
            beam_width: DEFAULT_BEAM_WIDTH,
            worker_count: num_cpus::get().max(1),
            per_region_timeout_ms: DEFAULT_PER_REGION_TIMEOUT_MS,
            detection_timeout_ms: None,
            strict_mode: false,
            line_height_tolerance: DEFAULT_LINE_HEIGHT_TOLERANCE,
            session_pool_size: None,
            detection_preprocess: PreprocessConfig::imagenet(),
            recognition_preprocess: PreprocessConfig::centered(),
            lattice_layout: LatticeLayout::BatchMajor,
            lattice_encoding: LatticeEncoding::Auto,
            character_dict_path: None,
            use_space_char: true,
            ort: OrtSessionConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, OCRError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| OCRError::config_error(format!("invalid configuration JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, OCRError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| OCRError::io_error(path, e))?;
        Self::from_json_str(&content)
    }

    pub fn with_detection_threshold(mut self, threshold: f32) -> Self {
        self.detection_threshold = threshold;
        self
    }

    pub fn with_nms_overlap_threshold(mut self, threshold: f32) -> Self {
        self.nms_overlap_threshold = threshold;
        self
    }

    pub fn with_strip_height(mut self, height: u32) -> Self {
        self.strip_height = height;
        self
    }

    pub fn with_max_strip_width(mut self, width: u32) -> Self {
        self.max_strip_width = width;
        self
    }

    pub fn with_decoding_policy(mut self, policy: DecodingPolicy) -> Self {
        self.decoding_policy = policy;
        self
    }

    pub fn with_beam_width(mut self, beam_width: usize) -> Self {
        self.beam_width = beam_width;
        self
    }

    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    pub fn with_per_region_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.per_region_timeout_ms = timeout_ms;
        self
    }

    pub fn with_detection_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.detection_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn with_character_dict(mut self, path: impl Into<PathBuf>) -> Self {
        self.character_dict_path = Some(path.into());
        self
    }

    pub fn with_lattice_format(mut self, layout: LatticeLayout, encoding: LatticeEncoding) -> Self {
        self.lattice_layout = layout;
        self.lattice_encoding = encoding;
        self
    }

    pub fn with_ort_config(mut self, ort: OrtSessionConfig) -> Self {
        self.ort = ort;
        self
    }

    /// Time budget for a single region.
    pub fn per_region_timeout(&self) -> Duration {
        Duration::from_millis(self.per_region_timeout_ms)
    }

    /// Time budget for detection, if any.
    pub fn detection_timeout(&self) -> Option<Duration> {
        self.detection_timeout_ms.map(Duration::from_millis)
    }

    /// Number of sessions to create per model.
    pub fn effective_session_pool_size(&self) -> usize {
        self.session_pool_size.unwrap_or(self.worker_count).max(1)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), OCRError> {
        validate_range(self.detection_threshold, 0.0, 1.0, "detection_threshold")?;
        validate_range(
            self.binarization_threshold,
            0.0,
            1.0,
            "binarization_threshold",
        )?;
        validate_range(self.nms_overlap_threshold, 0.0, 1.0, "nms_overlap_threshold")?;
        validate_positive(self.unclip_ratio, "unclip_ratio")?;
        validate_positive(self.max_candidates, "max_candidates")?;
        validate_range(self.min_region_size, 0.0, f32::MAX, "min_region_size")?;
        validate_positive(self.limit_side_len, "limit_side_len")?;
        validate_positive(self.strip_height, "strip_height")?;
        validate_positive(self.max_strip_width, "max_strip_width")?;
        validate_positive(self.beam_width, "beam_width")?;
        validate_positive(self.worker_count, "worker_count")?;
        validate_positive(self.per_region_timeout_ms, "per_region_timeout_ms")?;
        if let Some(timeout) = self.detection_timeout_ms {
            validate_positive(timeout, "detection_timeout_ms")?;
        }
        if let Some(pool) = self.session_pool_size {
            validate_positive(pool, "session_pool_size")?;
        }
        validate_range(
            self.line_height_tolerance,
            0.0,
            f32::MAX,
            "line_height_tolerance",
        )?;
        self.detection_preprocess.validate("detection_preprocess")?;
        self.recognition_preprocess
            .validate("recognition_preprocess")?;
        self.ort.validate()?;
        Ok(())
    }
}
