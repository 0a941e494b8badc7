//! Helper constructors for [`OCRError`].

use super::types::{OCRError, ProcessingStage, SimpleError};
use crate::domain::RegionId;
use std::path::Path;
use std::time::Duration;

impl OCRError {
    #[inline]
    fn processing_with_context(
        kind: ProcessingStage,
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates an error for a failed normalization step.
    pub fn normalization(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::processing_with_context(ProcessingStage::Normalization, context, error)
    }

    /// Creates an inference error with model context.
    ///
    /// # Arguments
    ///
    /// * `model_name` - The model that failed.
    /// * `context` - What was being attempted.
    /// * `error` - The underlying error.
    pub fn inference_error(
        model_name: &str,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model_name: model_name.to_string(),
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates an inference error that has no underlying error value,
    /// e.g. an output tensor with the wrong rank.
    pub fn inference_message(model_name: &str, context: impl Into<String>) -> Self {
        let context = context.into();
        Self::Inference {
            model_name: model_name.to_string(),
            source: Box::new(SimpleError::new(context.clone())),
            context,
        }
    }

    /// Creates the error recorded when a region exceeds its time budget.
    pub fn inference_timeout(region_id: RegionId, budget: Duration) -> Self {
        Self::inference_message(
            "recognition",
            format!(
                "region {region_id} exceeded the per-region timeout of {} ms",
                budget.as_millis()
            ),
        )
    }

    /// Creates an OCRError for model load failures with contextual suggestions.
    ///
    /// # Arguments
    /// * `model_path` - Path to the model file
    /// * `reason` - Short reason description
    /// * `suggestion` - Optional suggestion message (without punctuation)
    /// * `source` - Optional underlying error
    pub fn model_load_error(
        model_path: impl AsRef<Path>,
        reason: impl Into<String>,
        suggestion: Option<&str>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        let suggestion = suggestion
            .map(|s| format!("; suggested fix: {s}"))
            .unwrap_or_default();
        Self::ModelLoad {
            model_path: model_path.as_ref().display().to_string(),
            reason: reason.into(),
            suggestion,
            source: source.map(|e| Box::new(e) as _),
        }
    }

    /// Wraps an IO error with the path that could not be read.
    pub fn io_error(path: impl AsRef<Path>, error: std::io::Error) -> Self {
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("{}: {error}", path.as_ref().display()),
        ))
    }

    /// Creates an image decode error.
    pub fn image_decode(context: impl Into<String>, source: Option<image::ImageError>) -> Self {
        Self::ImageDecode {
            context: context.into(),
            source,
        }
    }

    /// Creates an error for a polygon that cannot be rectified.
    pub fn geometry(message: impl Into<String>) -> Self {
        Self::Geometry {
            message: message.into(),
        }
    }

    /// Creates an OCRError for invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an OCRError for configuration errors.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Tags a per-region error with the region it came from.
    pub fn region_failed(region_id: RegionId, error: OCRError) -> Self {
        Self::RegionFailed {
            region_id,
            source: Box::new(error),
        }
    }
}

impl From<image::ImageError> for OCRError {
    fn from(error: image::ImageError) -> Self {
        match error {
            image::ImageError::IoError(e) => Self::Io(e),
            other => Self::image_decode("failed to decode image data", Some(other)),
        }
    }
}
