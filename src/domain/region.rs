use crate::processors::BoundingBox;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Stable identifier of a detected region within one `process` call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RegionId(pub u32);

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A text region found by the detector, in original image coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedRegion {
    pub id: RegionId,
    pub polygon: BoundingBox,
    /// Mean heatmap score inside the region, in `[0, 1]`.
    pub confidence: f32,
}

impl DetectedRegion {
    pub fn new(id: RegionId, polygon: BoundingBox, confidence: f32) -> Self {
        Self {
            id,
            polygon,
            confidence,
        }
    }
}

/// A region cropped and deskewed into an upright strip of fixed height.
#[derive(Debug, Clone)]
pub struct RectifiedStrip {
    pub region_id: RegionId,
    pub image: RgbImage,
}

impl RectifiedStrip {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
