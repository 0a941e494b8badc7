//! Error types for the OCR pipeline.
//!
//! Every fallible operation in the crate returns [`OCRError`]. Variants carry
//! enough context (model name, file path, region id) to be logged directly, and
//! [`OCRError::kind`] collapses them into the coarse [`ErrorKind`] taxonomy that
//! callers match on.
//!
//! # Usage
//!
//! ```rust
//! use lineocr::core::errors::{ErrorKind, OCRError};
//!
//! let error = OCRError::geometry("polygon has only 2 points");
//! assert_eq!(error.kind(), ErrorKind::Geometry);
//!
//! let error = OCRError::config_error("beam_width must be positive");
//! assert_eq!(error.kind(), ErrorKind::Config);
//! ```

mod constructors;
mod types;

pub use types::{ErrorKind, OCRError, ProcessingStage, SimpleError};

/// Convenience alias used throughout the crate.
pub type OcrResult<T> = Result<T, OCRError>;
