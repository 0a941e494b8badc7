//! # lineocr
//!
//! A two-stage OCR pipeline over ONNX models: a DB text detector finds text
//! regions, each region is deskewed into a strip, and a CTC recognizer turns
//! the strip into text.
//!
//! ## Modules
//!
//! * [`core`] - Configuration, errors, validation and model execution
//! * [`domain`] - Images, regions, lattices, vocabularies and transcripts
//! * [`models`] - Text detector and text recognizer
//! * [`pipeline`] - The orchestrator and its builder
//! * [`processors`] - Geometry, resizing, normalization and decoding
//! * [`utils`] - Image loading, perspective warping and logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lineocr::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::default().with_worker_count(4);
//! let ocr = Orchestrator::builder("models/det.onnx", "models/rec.onnx")
//!     .config(config)
//!     .build()?;
//!
//! let transcript = ocr.process("document.png").await?;
//! println!("{}", transcript.text());
//! for failure in transcript.failures() {
//!     eprintln!("region {} failed: {}", failure.region_id, failure.message);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod models;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude for the common case of building a pipeline and reading its output.
///
/// ```rust
/// use lineocr::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{ErrorKind, OCRError, OcrResult, PipelineConfig};
    pub use crate::domain::{Image, Transcript, TranscriptEntry, TranscriptStatus};
    pub use crate::pipeline::{ImageSource, Orchestrator};
    pub use crate::processors::DecodingPolicy;
    pub use crate::utils::load_image;
    pub use tokio_util::sync::CancellationToken;
}
