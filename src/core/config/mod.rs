//! Configuration types for the pipeline and the ONNX Runtime sessions.

pub mod onnx;
pub mod pipeline;

pub use onnx::{OrtGraphOptimizationLevel, OrtSessionConfig};
pub use pipeline::{PipelineConfig, PreprocessConfig};
