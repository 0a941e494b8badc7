//! Enums shared by the image processing stages.

use serde::{Deserialize, Serialize};

/// Specifies how to limit the size of an image during detection resizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitType {
    /// Downscale when the longer side exceeds the limit
    #[default]
    Max,
    /// Upscale when the shorter side is below the limit
    Min,
}
