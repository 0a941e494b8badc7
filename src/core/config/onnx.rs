//! ONNX Runtime session settings shared by both pipeline models.

use crate::core::OCRError;
use crate::core::validation::validate_positive;
use serde::{Deserialize, Serialize};

/// How aggressively ONNX Runtime rewrites the model graph at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrtGraphOptimizationLevel {
    DisableAll,
    /// Constant folding and redundant node removal.
    #[default]
    Level1,
    /// Adds node fusions.
    Level2,
    /// Adds layout optimizations.
    Level3,
}

/// Knobs applied to every session in a model's pool.
///
/// `None` leaves the ONNX Runtime default in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrtSessionConfig {
    /// Threads used inside a single operator.
    pub intra_threads: Option<usize>,
    /// Threads used to run independent operators concurrently.
    pub inter_threads: Option<usize>,
    pub parallel_execution: Option<bool>,
    pub optimization_level: Option<OrtGraphOptimizationLevel>,
}

impl OrtSessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    pub fn with_inter_threads(mut self, threads: usize) -> Self {
        self.inter_threads = Some(threads);
        self
    }

    pub fn with_parallel_execution(mut self, enabled: bool) -> Self {
        self.parallel_execution = Some(enabled);
        self
    }

    pub fn with_optimization_level(mut self, level: OrtGraphOptimizationLevel) -> Self {
        self.optimization_level = Some(level);
        self
    }

    /// Rejects explicit thread counts of zero.
    pub fn validate(&self) -> Result<(), OCRError> {
        if let Some(threads) = self.intra_threads {
            validate_positive(threads, "ort.intra_threads")?;
        }
        if let Some(threads) = self.inter_threads {
            validate_positive(threads, "ort.inter_threads")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_snake_case_levels() {
        let config: OrtSessionConfig =
            serde_json::from_str(r#"{ "intra_threads": 2, "optimization_level": "level3" }"#)
                .unwrap();
        assert_eq!(config.intra_threads, Some(2));
        assert_eq!(config.optimization_level, Some(OrtGraphOptimizationLevel::Level3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(OrtSessionConfig::new().with_inter_threads(0).validate().is_err());
    }
}
