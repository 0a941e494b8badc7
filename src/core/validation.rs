//! Parameter validation helpers used by configuration types.

use crate::core::OCRError;

/// Validates that a float value is finite (not NaN or infinite).
#[inline]
pub fn validate_finite(value: f32, param_name: &str) -> Result<(), OCRError> {
    if !value.is_finite() {
        return Err(OCRError::config_error(format!(
            "Parameter '{param_name}' must be finite, got: {value}"
        )));
    }
    Ok(())
}

/// Validates that a value is within a specified range (inclusive).
#[inline]
pub fn validate_range<T: PartialOrd + std::fmt::Display>(
    value: T,
    min: T,
    max: T,
    param_name: &str,
) -> Result<(), OCRError> {
    // written so that NaN fails as well
    if !(value >= min && value <= max) {
        return Err(OCRError::config_error(format!(
            "Parameter '{param_name}' must be in range [{min}, {max}], got: {value}"
        )));
    }
    Ok(())
}

/// Validates that a value is positive (> 0).
#[inline]
pub fn validate_positive<T: PartialOrd + std::fmt::Display + Default>(
    value: T,
    param_name: &str,
) -> Result<(), OCRError> {
    if !(value > T::default()) {
        return Err(OCRError::config_error(format!(
            "Parameter '{param_name}' must be positive, got: {value}"
        )));
    }
    Ok(())
}

/// Validates a per-channel vector (mean, std) of exactly three finite values.
pub fn validate_channel_values(values: &[f32], param_name: &str) -> Result<(), OCRError> {
    if values.len() != 3 {
        return Err(OCRError::config_error(format!(
            "Parameter '{param_name}' must have exactly 3 elements, got {}",
            values.len()
        )));
    }
    for value in values {
        validate_finite(*value, param_name)?;
    }
    Ok(())
}
