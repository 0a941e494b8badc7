use super::*;
use crate::core::errors::SimpleError;
use crate::core::{Tensor4D, TensorD};
use ndarray::{ArrayViewD, IxDyn};
use ort::value::TensorRef;

impl OrtInfer {
    fn run_inference_with_processor<T>(
        &self,
        x: &Tensor4D,
        processor: impl FnOnce(&[i64], &[f32]) -> Result<T, OCRError>,
    ) -> Result<T, OCRError> {
        let input_shape = x.shape().to_vec();

        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            OCRError::inference_error(
                &self.model_name,
                &format!("failed to convert input tensor with shape {input_shape:?}"),
                e,
            )
        })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let idx = self
            .next_idx
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            % self.sessions.len();
        let mut session_guard = self.sessions[idx].lock().map_err(|_| {
            OCRError::inference_error(
                &self.model_name,
                &format!(
                    "failed to acquire session lock for session {}/{}",
                    idx,
                    self.sessions.len()
                ),
                SimpleError::new("session lock poisoned"),
            )
        })?;

        let outputs = session_guard.run(inputs).map_err(|e| {
            OCRError::inference_error(
                &self.model_name,
                &format!(
                    "ONNX Runtime forward pass failed for input '{}' {:?} -> output '{}'",
                    self.input_name, input_shape, self.output_name
                ),
                e,
            )
        })?;

        let (output_shape, output_data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                OCRError::inference_error(
                    &self.model_name,
                    &format!("failed to extract output tensor '{}' as f32", self.output_name),
                    e,
                )
            })?;

        processor(output_shape, output_data)
    }

    /// Runs the model and returns its primary output with the shape it reports.
    pub fn infer_dyn(&self, x: &Tensor4D) -> Result<TensorD, OCRError> {
        self.run_inference_with_processor(x, |output_shape, output_data| {
            if output_shape.iter().any(|d| *d < 0) {
                return Err(OCRError::inference_message(
                    &self.model_name,
                    format!("output tensor has unresolved dimensions {output_shape:?}"),
                ));
            }
            let dims: Vec<usize> = output_shape.iter().map(|d| *d as usize).collect();
            let expected_len: usize = dims.iter().product();
            if output_data.len() != expected_len {
                return Err(OCRError::inference_message(
                    &self.model_name,
                    format!(
                        "output data size mismatch: shape {:?} needs {} values, got {}",
                        dims,
                        expected_len,
                        output_data.len()
                    ),
                ));
            }
            let view = ArrayViewD::from_shape(IxDyn(&dims), output_data)?;
            Ok(view.to_owned())
        })
    }
}
