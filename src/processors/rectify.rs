//! Region rectification: crop and deskew a detected polygon into an upright
//! strip of fixed height.

use crate::core::OCRError;
use crate::core::constants::{
    DEFAULT_MAX_STRIP_WIDTH, DEFAULT_STRIP_HEIGHT, MIN_POLYGON_AREA, VERTICAL_TEXT_ASPECT,
};
use crate::domain::{DetectedRegion, Image, RectifiedStrip};
use crate::processors::geometry::{Point, order_quad_points};
use crate::utils::transform::warp_quad_to_rect;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct RegionRectifier {
    pub strip_height: u32,
    pub max_strip_width: u32,
}

impl Default for RegionRectifier {
    fn default() -> Self {
        Self::new(DEFAULT_STRIP_HEIGHT, DEFAULT_MAX_STRIP_WIDTH)
    }
}

impl RegionRectifier {
    pub fn new(strip_height: u32, max_strip_width: u32) -> Self {
        Self {
            strip_height: strip_height.max(1),
            max_strip_width: max_strip_width.max(1),
        }
    }

    /// Finds the quad to warp, ordered top-left, top-right, bottom-right,
    /// bottom-left, rotated a quarter turn for vertical text.
    fn source_quad(&self, region: &DetectedRegion) -> Result<[Point; 4], OCRError> {
        let polygon = &region.polygon;
        if polygon.points.len() < 3 {
            return Err(OCRError::geometry(format!(
                "region {} has {} points, need at least 3",
                region.id,
                polygon.points.len()
            )));
        }
        if !polygon.is_finite() {
            return Err(OCRError::geometry(format!(
                "region {} has non-finite coordinates",
                region.id
            )));
        }
        let hull = polygon.convex_hull();
        if hull.points.len() < 3 {
            return Err(OCRError::geometry(format!(
                "region {} is collinear",
                region.id
            )));
        }
        let area = hull.area();
        if area < MIN_POLYGON_AREA {
            return Err(OCRError::geometry(format!(
                "region {} has near-zero area ({area})",
                region.id
            )));
        }

        let quad = match polygon.points.as_slice() {
            [a, b, c, d] => order_quad_points(&[*a, *b, *c, *d]),
            _ => polygon.get_min_area_rect().get_box_points(),
        };

        let (width, height) = quad_extent(&quad);
        if height >= VERTICAL_TEXT_ASPECT * width {
            debug!("region {} read as vertical text", region.id);
            return Ok([quad[1], quad[2], quad[3], quad[0]]);
        }
        Ok(quad)
    }

    fn strip_width(&self, quad: &[Point; 4]) -> Result<u32, OCRError> {
        let (width, height) = quad_extent(quad);
        if !(width > 0.0 && height > 0.0) {
            return Err(OCRError::geometry(format!(
                "quadrilateral has a zero-length side ({width}x{height})"
            )));
        }
        let scaled = (self.strip_height as f32 * width / height).round();
        Ok((scaled as u32).clamp(1, self.max_strip_width))
    }

    /// Crops and deskews a region into a `width x strip_height` strip.
    pub fn rectify(&self, image: &Image, region: &DetectedRegion) -> Result<RectifiedStrip, OCRError> {
        let quad = self.source_quad(region)?;
        let width = self.strip_width(&quad)?;
        let strip = warp_quad_to_rect(image.as_rgb(), &quad, width, self.strip_height)?;
        Ok(RectifiedStrip {
            region_id: region.id,
            image: strip,
        })
    }
}

/// Mean top/bottom edge length and mean left/right edge length.
fn quad_extent(quad: &[Point; 4]) -> (f32, f32) {
    let width = (quad[0].distance(&quad[1]) + quad[3].distance(&quad[2])) / 2.0;
    let height = (quad[0].distance(&quad[3]) + quad[1].distance(&quad[2])) / 2.0;
    (width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;
    use crate::domain::RegionId;
    use crate::processors::BoundingBox;
    use image::{Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn page() -> Image {
        let mut img = RgbImage::from_pixel(400, 300, Rgb([255, 255, 255]));
        draw_filled_rect_mut(&mut img, Rect::at(100, 100).of_size(100, 20), Rgb([0, 0, 0]));
        draw_filled_rect_mut(&mut img, Rect::at(300, 50).of_size(20, 100), Rgb([0, 0, 0]));
        Image::from_rgb(img).unwrap()
    }

    fn region(polygon: BoundingBox) -> DetectedRegion {
        DetectedRegion::new(RegionId(7), polygon, 0.9)
    }

    #[test]
    fn test_horizontal_region() {
        let strip = RegionRectifier::default()
            .rectify(&page(), &region(BoundingBox::from_coords(90.0, 95.0, 210.0, 125.0)))
            .unwrap();
        assert_eq!(strip.region_id, RegionId(7));
        assert_eq!(strip.height(), 48);
        assert_eq!(strip.width(), 192);
        // the bar is in the middle, the margin is white
        assert_eq!(strip.image.get_pixel(96, 24), &Rgb([0, 0, 0]));
        assert_eq!(strip.image.get_pixel(2, 2), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_point_order_does_not_matter() {
        let rect = BoundingBox::from_coords(90.0, 95.0, 210.0, 125.0);
        let mut shuffled = rect.points.clone();
        shuffled.rotate_left(2);
        shuffled.swap(0, 1);
        let rectifier = RegionRectifier::default();
        let a = rectifier.rectify(&page(), &region(rect)).unwrap();
        let b = rectifier.rectify(&page(), &region(BoundingBox::new(shuffled))).unwrap();
        assert_eq!(a.image, b.image);
    }

    #[test]
    fn test_vertical_region_is_rotated() {
        let strip = RegionRectifier::default()
            .rectify(&page(), &region(BoundingBox::from_coords(295.0, 40.0, 325.0, 160.0)))
            .unwrap();
        assert_eq!(strip.height(), 48);
        assert_eq!(strip.width(), 192);
        assert_eq!(strip.image.get_pixel(96, 24), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_width_is_clamped() {
        let strip = RegionRectifier::new(48, 100)
            .rectify(&page(), &region(BoundingBox::from_coords(0.0, 0.0, 400.0, 20.0)))
            .unwrap();
        assert_eq!(strip.width(), 100);
    }

    #[test]
    fn test_polygon_with_many_points_uses_min_rect() {
        let polygon = BoundingBox::new(vec![
            Point::new(90.0, 95.0),
            Point::new(150.0, 95.0),
            Point::new(210.0, 95.0),
            Point::new(210.0, 125.0),
            Point::new(150.0, 125.0),
            Point::new(90.0, 125.0),
        ]);
        let strip = RegionRectifier::default().rectify(&page(), &region(polygon)).unwrap();
        assert_eq!(strip.width(), 192);
    }

    #[test]
    fn test_degenerate_regions_fail_with_geometry_error() {
        let rectifier = RegionRectifier::default();
        let cases = [
            BoundingBox::new(vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)]),
            BoundingBox::new(vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 1.0),
                Point::new(2.0, 2.0),
                Point::new(3.0, 3.0),
            ]),
            BoundingBox::from_coords(10.0, 10.0, 10.5, 10.5),
            BoundingBox::from_coords(0.0, 0.0, f32::NAN, 10.0),
        ];
        for polygon in cases {
            let err = rectifier.rectify(&page(), &region(polygon)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Geometry);
        }
    }
}
