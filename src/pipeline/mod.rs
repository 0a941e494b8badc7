//! The OCR pipeline.
//!
//! [`Orchestrator`] ties the detector, rectifier, recognizer and decoder
//! together and runs per-region work on a bounded worker pool.

mod builder;
mod orchestrator;
mod source;
#[cfg(test)]
pub(crate) mod test_support;

pub use builder::OrchestratorBuilder;
pub use orchestrator::Orchestrator;
pub use source::ImageSource;
