use super::*;
use crate::core::config::{OrtGraphOptimizationLevel, OrtSessionConfig};
use ort::logging::LogLevel;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use std::path::Path;
use tracing::debug;

impl OrtInfer {
    /// Creates a session pool for the model at `model_path`.
    ///
    /// The file is checked before ONNX Runtime sees it so that a missing or
    /// empty file produces a clear [`OCRError::ModelLoad`] instead of a runtime
    /// error string.
    pub fn from_config(
        model_path: impl AsRef<Path>,
        ort_config: &OrtSessionConfig,
        pool_size: usize,
    ) -> Result<Self, OCRError> {
        let path = model_path.as_ref();
        Self::check_model_file(path)?;

        let pool_size = pool_size.max(1);
        let mut sessions = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let session = Self::build_session(path, ort_config)?;
            sessions.push(session);
        }

        let first = &sessions[0];
        let input_name = first
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| {
                OCRError::model_load_error(
                    path,
                    "model declares no input tensor",
                    None,
                    None::<std::io::Error>,
                )
            })?;
        let output_name = first
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| {
                OCRError::model_load_error(
                    path,
                    "model declares no output tensor",
                    None,
                    None::<std::io::Error>,
                )
            })?;
        let input_shape = Self::session_input_shape(first);

        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string();

        debug!(
            "Loaded model '{}' with {} session(s): input '{}' {:?}, output '{}'",
            model_name, pool_size, input_name, input_shape, output_name
        );

        Ok(OrtInfer {
            sessions: sessions.into_iter().map(Mutex::new).collect(),
            next_idx: std::sync::atomic::AtomicUsize::new(0),
            input_name,
            output_name,
            input_shape,
            model_path: path.to_path_buf(),
            model_name,
        })
    }

    fn check_model_file(path: &Path) -> Result<(), OCRError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            OCRError::model_load_error(
                path,
                "model file cannot be accessed",
                Some("verify the model path"),
                Some(e),
            )
        })?;
        if !metadata.is_file() {
            return Err(OCRError::model_load_error(
                path,
                "model path is not a regular file",
                None,
                None::<std::io::Error>,
            ));
        }
        if metadata.len() == 0 {
            return Err(OCRError::model_load_error(
                path,
                "model file is empty",
                Some("re-download the model"),
                None::<std::io::Error>,
            ));
        }
        Ok(())
    }

    fn build_session(path: &Path, ort_config: &OrtSessionConfig) -> Result<Session, OCRError> {
        let builder = Session::builder()
            .and_then(|b| Self::apply_ort_config(b, ort_config))
            .map_err(|e| {
                OCRError::model_load_error(
                    path,
                    "failed to configure ONNX session",
                    Some("check the ort session settings"),
                    Some(e),
                )
            })?;
        builder.commit_from_file(path).map_err(|e| {
            OCRError::model_load_error(
                path,
                "failed to create ONNX session",
                Some("verify the file is a valid ONNX model"),
                Some(e),
            )
        })
    }

    fn apply_ort_config(
        mut builder: SessionBuilder,
        cfg: &OrtSessionConfig,
    ) -> Result<SessionBuilder, ort::Error> {
        builder = builder.with_log_level(LogLevel::Error)?;
        if let Some(intra) = cfg.intra_threads {
            builder = builder.with_intra_threads(intra)?;
        }
        if let Some(inter) = cfg.inter_threads {
            builder = builder.with_inter_threads(inter)?;
        }
        if let Some(par) = cfg.parallel_execution {
            builder = builder.with_parallel_execution(par)?;
        }
        if let Some(level) = cfg.optimization_level {
            let mapped = match level {
                OrtGraphOptimizationLevel::DisableAll => GraphOptimizationLevel::Disable,
                OrtGraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
                OrtGraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
                OrtGraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
            };
            builder = builder.with_optimization_level(mapped)?;
        }
        Ok(builder)
    }
}
