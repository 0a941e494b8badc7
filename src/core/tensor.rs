//! Tensor aliases used at the model boundary.

/// A 4D tensor (batch, channels, height, width) of f32 values.
pub type Tensor4D = ndarray::Array4<f32>;

/// A tensor of f32 values with runtime-determined rank, as returned by models.
pub type TensorD = ndarray::ArrayD<f32>;
