//! ONNX Runtime inference engine backed by a pool of sessions.
//!
//! `Session::run` needs exclusive access, so a model loaded once is served by
//! several sessions handed out round-robin. Callers share the `OrtInfer`
//! itself immutably.

use crate::core::errors::OCRError;
use ort::{session::Session, value::ValueType};
use std::sync::Mutex;

#[path = "ort_infer_builders.rs"]
mod ort_infer_builders;
#[path = "ort_infer_execution.rs"]
mod ort_infer_execution;

pub struct OrtInfer {
    pub(super) sessions: Vec<Mutex<Session>>,
    pub(super) next_idx: std::sync::atomic::AtomicUsize,
    pub(super) input_name: String,
    pub(super) output_name: String,
    pub(super) input_shape: Option<Vec<i64>>,
    pub(super) model_path: std::path::PathBuf,
    pub(super) model_name: String,
}

impl std::fmt::Debug for OrtInfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtInfer")
            .field("sessions", &self.sessions.len())
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("input_shape", &self.input_shape)
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl OrtInfer {
    /// Reads the primary input tensor shape of a session.
    ///
    /// Dynamic dimensions (e.g., -1) are returned as-is.
    pub(super) fn session_input_shape(session: &Session) -> Option<Vec<i64>> {
        let input = session.inputs.first()?;
        match &input.input_type {
            ValueType::Tensor { shape, .. } => Some(shape.iter().copied().collect()),
            _ => None,
        }
    }

    /// Returns the model path associated with this inference engine.
    pub fn model_path(&self) -> &std::path::Path {
        &self.model_path
    }

    /// Returns the model name associated with this inference engine.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Number of sessions in the pool.
    pub fn pool_size(&self) -> usize {
        self.sessions.len()
    }
}

impl crate::core::inference::InferenceEngine for OrtInfer {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn input_shape(&self) -> Option<Vec<i64>> {
        self.input_shape.clone()
    }

    fn run(&self, input: &crate::core::Tensor4D) -> Result<crate::core::TensorD, OCRError> {
        self.infer_dyn(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::OrtSessionConfig;
    use crate::core::errors::ErrorKind;
    use std::io::Write;

    #[test]
    fn test_missing_model_file_is_model_load_error() {
        let err = OrtInfer::from_config(
            "/nonexistent/models/det.onnx",
            &OrtSessionConfig::default(),
            1,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelLoad);
        assert!(err.to_string().contains("det.onnx"));
    }

    #[test]
    fn test_directory_is_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = OrtInfer::from_config(dir.path(), &OrtSessionConfig::default(), 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelLoad);
    }

    #[test]
    fn test_empty_model_file_is_model_load_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = OrtInfer::from_config(file.path(), &OrtSessionConfig::default(), 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelLoad);
    }

    #[test]
    #[ignore = "requires the ONNX Runtime shared library"]
    fn test_garbage_model_file_is_model_load_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not an onnx protobuf").unwrap();
        let err = OrtInfer::from_config(file.path(), &OrtSessionConfig::default(), 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelLoad);
    }
}
