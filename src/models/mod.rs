//! Model wrappers for the OCR pipeline.
//!
//! Each wrapper owns the pre- and post-processing around one
//! [`InferenceEngine`](crate::core::InferenceEngine) and is shared between
//! workers without mutation.

pub mod detection;
pub mod recognition;

pub use detection::*;
pub use recognition::*;
