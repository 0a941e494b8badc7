//! The core module of the OCR pipeline.
//!
//! This module contains the fundamental components shared by every stage:
//! configuration, constants, error handling, parameter validation, tensor
//! aliases and model execution.

pub mod config;
pub mod constants;
pub mod errors;
pub mod inference;
pub mod tensor;
pub mod validation;

pub use config::{OrtSessionConfig, PipelineConfig, PreprocessConfig};
pub use constants::*;
pub use errors::{ErrorKind, OCRError, OcrResult, ProcessingStage};
pub use inference::{InferenceEngine, OrtInfer, load_session};
pub use tensor::{Tensor4D, TensorD};
pub use validation::{validate_finite, validate_positive, validate_range};
