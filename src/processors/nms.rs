//! Non-maximum suppression over detected regions.

use crate::domain::DetectedRegion;
use std::cmp::Ordering;

fn by_confidence_then_geometry(a: &DetectedRegion, b: &DetectedRegion) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.polygon.total_cmp(&b.polygon))
}

/// Greedy NMS: regions are visited by descending confidence (ties broken by
/// polygon coordinates) and kept unless their IoU with an already kept region
/// exceeds `overlap_threshold`.
///
/// The output is sorted the same way, so applying the function twice gives
/// the same result as applying it once.
pub fn non_max_suppression(
    mut regions: Vec<DetectedRegion>,
    overlap_threshold: f32,
) -> Vec<DetectedRegion> {
    regions.sort_by(by_confidence_then_geometry);

    let mut kept: Vec<DetectedRegion> = Vec::with_capacity(regions.len());
    for region in regions {
        let suppressed = kept
            .iter()
            .any(|k| k.polygon.iou(&region.polygon) > overlap_threshold);
        if !suppressed {
            kept.push(region);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RegionId;
    use crate::processors::BoundingBox;

    fn region(id: u32, x: f32, y: f32, w: f32, h: f32, confidence: f32) -> DetectedRegion {
        DetectedRegion::new(
            RegionId(id),
            BoundingBox::from_coords(x, y, x + w, y + h),
            confidence,
        )
    }

    #[test]
    fn test_overlapping_region_is_suppressed() {
        let regions = vec![
            region(0, 0.0, 0.0, 100.0, 20.0, 0.8),
            region(1, 5.0, 0.0, 100.0, 20.0, 0.9),
            region(2, 0.0, 50.0, 100.0, 20.0, 0.7),
        ];
        let kept = non_max_suppression(regions, 0.5);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].id, RegionId(1));
        assert_eq!(kept[1].id, RegionId(2));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // IoU of exactly 1/3
        let regions = vec![
            region(0, 0.0, 0.0, 10.0, 10.0, 0.9),
            region(1, 5.0, 0.0, 10.0, 10.0, 0.8),
        ];
        assert_eq!(non_max_suppression(regions.clone(), 0.5).len(), 2);
        assert_eq!(non_max_suppression(regions, 0.3).len(), 1);
    }

    #[test]
    fn test_idempotent() {
        let regions = vec![
            region(0, 0.0, 0.0, 50.0, 20.0, 0.7),
            region(1, 10.0, 2.0, 50.0, 20.0, 0.7),
            region(2, 40.0, 0.0, 50.0, 20.0, 0.9),
            region(3, 200.0, 0.0, 50.0, 20.0, 0.6),
            region(4, 0.0, 100.0, 30.0, 30.0, 0.95),
        ];
        let once = non_max_suppression(regions, 0.3);
        let twice = non_max_suppression(once.clone(), 0.3);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_equal_confidence_is_order_independent() {
        let a = region(0, 0.0, 0.0, 50.0, 20.0, 0.7);
        let b = region(1, 10.0, 0.0, 50.0, 20.0, 0.7);
        let forward = non_max_suppression(vec![a.clone(), b.clone()], 0.3);
        let backward = non_max_suppression(vec![b, a], 0.3);
        assert_eq!(forward, backward);
        assert_eq!(forward[0].id, RegionId(0));
    }
}
