//! Builder that loads the two pipeline models from disk.

use super::orchestrator::Orchestrator;
use crate::core::{OCRError, PipelineConfig, load_session};
use crate::domain::Vocabulary;
use std::path::PathBuf;
use tracing::info;

/// Builder for [`Orchestrator`].
///
/// # Example
///
/// ```no_run
/// use lineocr::core::PipelineConfig;
/// use lineocr::pipeline::Orchestrator;
///
/// # async fn run() -> Result<(), lineocr::core::OCRError> {
/// let ocr = Orchestrator::builder("models/det.onnx", "models/rec.onnx")
///     .config(PipelineConfig::default().with_strict_mode(true))
///     .build()?;
/// let transcript = ocr.process("page.png").await?;
/// println!("{}", transcript.text());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OrchestratorBuilder {
    detection_model: PathBuf,
    recognition_model: PathBuf,
    config: PipelineConfig,
    vocabulary: Option<Vocabulary>,
}

impl OrchestratorBuilder {
    pub fn new(detection_model: impl Into<PathBuf>, recognition_model: impl Into<PathBuf>) -> Self {
        Self {
            detection_model: detection_model.into(),
            recognition_model: recognition_model.into(),
            config: PipelineConfig::default(),
            vocabulary: None,
        }
    }

    /// Replaces the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses this vocabulary instead of `character_dict_path` or the default
    /// alphabet.
    pub fn vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    /// Validates the configuration and loads both models.
    ///
    /// # Errors
    ///
    /// * `OCRError::ConfigError` if the configuration does not validate.
    /// * `OCRError::ModelLoad` if a model file is missing, unreadable or invalid.
    /// * `OCRError::Io` if the character dictionary cannot be read.
    pub fn build(self) -> Result<Orchestrator, OCRError> {
        self.config.validate()?;

        let vocabulary = match (self.vocabulary, &self.config.character_dict_path) {
            (Some(vocabulary), _) => vocabulary,
            (None, Some(path)) => {
                let vocabulary = Vocabulary::from_dict_file(path, self.config.use_space_char)?;
                info!(
                    "Loaded {} symbols from {}",
                    vocabulary.len() - 1,
                    path.display()
                );
                vocabulary
            }
            (None, None) => Vocabulary::default(),
        };

        let detection = load_session(&self.detection_model, &self.config)?;
        let recognition = load_session(&self.recognition_model, &self.config)?;
        Orchestrator::from_engines(detection, recognition, self.config, vocabulary)
    }
}
