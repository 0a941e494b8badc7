//! Helpers for loading the two pipeline models.

use crate::core::config::PipelineConfig;
use crate::core::errors::OCRError;
use crate::core::inference::OrtInfer;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Loads a model into a shared, read-only session pool sized from `config`.
pub fn load_session(
    model_path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<Arc<OrtInfer>, OCRError> {
    let path = model_path.as_ref();
    let engine = OrtInfer::from_config(path, &config.ort, config.effective_session_pool_size())?;
    info!(
        "Model '{}' ready ({} session(s)) from {}",
        engine.model_name(),
        engine.pool_size(),
        path.display()
    );
    Ok(Arc::new(engine))
}
