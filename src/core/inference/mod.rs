//! Model execution.
//!
//! Detection and recognition talk to their models through the
//! [`InferenceEngine`] trait. [`OrtInfer`] is the ONNX Runtime implementation;
//! any other backend (or a deterministic stub in tests) can be plugged in by
//! implementing the trait.

pub mod ort_infer;
pub mod session;

pub use ort_infer::OrtInfer;
pub use session::load_session;

use crate::core::{OCRError, Tensor4D, TensorD};

/// A loaded model that maps one NCHW input tensor to one output tensor.
///
/// Implementations are shared between workers behind an `Arc` and must be
/// callable from several threads at once.
pub trait InferenceEngine: Send + Sync + std::fmt::Debug {
    /// Human-readable model name used in errors and logs.
    fn name(&self) -> &str;

    /// Declared shape of the primary input, `[N, C, H, W]`.
    ///
    /// Dynamic dimensions are reported as `-1`. `None` means the backend does
    /// not know, in which case callers fall back to their configured sizes.
    fn input_shape(&self) -> Option<Vec<i64>>;

    /// Runs a forward pass.
    fn run(&self, input: &Tensor4D) -> Result<TensorD, OCRError>;
}

/// Returns the fixed `(channels, height, width)` of a declared NCHW input shape.
///
/// Each component is `None` when the dimension is dynamic or unknown.
pub fn fixed_input_dims(shape: Option<&[i64]>) -> (Option<usize>, Option<usize>, Option<usize>) {
    let dim = |shape: &[i64], index: usize| {
        shape
            .get(index)
            .copied()
            .filter(|d| *d > 0)
            .map(|d| d as usize)
    };
    match shape {
        Some(shape) if shape.len() == 4 => (dim(shape, 1), dim(shape, 2), dim(shape, 3)),
        _ => (None, None, None),
    }
}
