//! Geometric utilities for OCR processing.
//!
//! Points and polygons, plus the algorithms the detector and rectifier need:
//! convex hull, minimum-area rectangle, polygon offsetting (unclip), polygon
//! intersection-over-union and quadrilateral corner ordering.

use imageproc::contours::Contour;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::f32::consts::PI;

/// Offset vertices are kept within this multiple of the offset distance.
const MITER_LIMIT: f32 = 4.0;

/// A 2D point with floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X-coordinate of the point.
    pub x: f32,
    /// Y-coordinate of the point.
    pub y: f32,
}

impl Point {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    fn total_cmp(&self, other: &Point) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

/// Cross product of `(b - a) x (c - a)`.
///
/// Positive for a counter-clockwise turn when the y axis points up.
#[inline]
fn cross(a: &Point, b: &Point, c: &Point) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// A polygon represented by its vertices in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// The points that define the polygon.
    pub points: Vec<Point>,
}

impl BoundingBox {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Creates an axis-aligned rectangle from two corners.
    pub fn from_coords(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(vec![
            Point::new(x1, y1),
            Point::new(x2, y1),
            Point::new(x2, y2),
            Point::new(x1, y2),
        ])
    }

    /// Creates a polygon from the border pixels of a contour.
    pub fn from_contour(contour: &Contour<u32>) -> Self {
        let points = contour
            .points
            .iter()
            .map(|p| Point::new(p.x as f32, p.y as f32))
            .collect();
        Self { points }
    }

    /// Shoelace area with sign; positive for counter-clockwise vertices (y up).
    pub fn signed_area(&self) -> f32 {
        if self.points.len() < 3 {
            return 0.0;
        }
        let sum: f32 = self
            .points
            .iter()
            .circular_tuple_windows()
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum();
        sum / 2.0
    }

    /// Area of the polygon.
    pub fn area(&self) -> f32 {
        self.signed_area().abs()
    }

    /// Length of the closed outline.
    pub fn perimeter(&self) -> f32 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.points
            .iter()
            .circular_tuple_windows()
            .map(|(a, b)| a.distance(b))
            .sum()
    }

    pub fn x_min(&self) -> f32 {
        self.points.iter().map(|p| p.x).fold(f32::INFINITY, f32::min)
    }

    pub fn x_max(&self) -> f32 {
        self.points
            .iter()
            .map(|p| p.x)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn y_min(&self) -> f32 {
        self.points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min)
    }

    pub fn y_max(&self) -> f32 {
        self.points
            .iter()
            .map(|p| p.y)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Vertical extent of the polygon.
    pub fn height(&self) -> f32 {
        if self.points.is_empty() {
            0.0
        } else {
            self.y_max() - self.y_min()
        }
    }

    /// True when every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.x.is_finite() && p.y.is_finite())
    }

    /// Area centroid, or the vertex mean for degenerate polygons.
    pub fn centroid(&self) -> Point {
        if self.points.is_empty() {
            return Point::new(0.0, 0.0);
        }
        let area = self.signed_area();
        if area.abs() > f32::EPSILON {
            let (cx, cy) = self.points.iter().circular_tuple_windows().fold(
                (0.0f32, 0.0f32),
                |(cx, cy), (a, b)| {
                    let f = a.x * b.y - b.x * a.y;
                    (cx + (a.x + b.x) * f, cy + (a.y + b.y) * f)
                },
            );
            return Point::new(cx / (6.0 * area), cy / (6.0 * area));
        }
        let n = self.points.len() as f32;
        Point::new(
            self.points.iter().map(|p| p.x).sum::<f32>() / n,
            self.points.iter().map(|p| p.y).sum::<f32>() / n,
        )
    }

    /// Convex hull by Andrew's monotone chain.
    ///
    /// The result has no collinear or duplicate vertices and a positive
    /// [`signed_area`](Self::signed_area). Degenerate inputs give fewer than
    /// three points.
    pub fn convex_hull(&self) -> BoundingBox {
        let mut points = self.points.clone();
        points.sort_by(Point::total_cmp);
        points.dedup();
        if points.len() < 3 {
            return BoundingBox::new(points);
        }

        let mut hull: Vec<Point> = Vec::with_capacity(points.len() * 2);
        for p in points.iter() {
            while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
            {
                hull.pop();
            }
            hull.push(*p);
        }
        let lower_len = hull.len() + 1;
        for p in points.iter().rev().skip(1) {
            while hull.len() >= lower_len
                && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
            {
                hull.pop();
            }
            hull.push(*p);
        }
        hull.pop();
        BoundingBox::new(hull)
    }

    /// Computes the minimum area rectangle enclosing the polygon using
    /// rotating calipers over the convex hull.
    pub fn get_min_area_rect(&self) -> MinAreaRect {
        let hull = self.convex_hull();
        let hull_points = &hull.points;

        if hull_points.len() < 3 {
            let (min_x, max_x) = hull_points
                .iter()
                .map(|p| p.x)
                .minmax_by(f32::total_cmp)
                .into_option()
                .unwrap_or((0.0, 0.0));
            let (min_y, max_y) = hull_points
                .iter()
                .map(|p| p.y)
                .minmax_by(f32::total_cmp)
                .into_option()
                .unwrap_or((0.0, 0.0));
            return MinAreaRect {
                center: Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0),
                width: max_x - min_x,
                height: max_y - min_y,
                angle: 0.0,
            };
        }

        let mut best: Option<(f32, MinAreaRect)> = None;
        for (origin, next) in hull_points.iter().circular_tuple_windows() {
            let edge_length = origin.distance(next);
            if edge_length < f32::EPSILON {
                continue;
            }
            let (nx, ny) = ((next.x - origin.x) / edge_length, (next.y - origin.y) / edge_length);
            let (px, py) = (-ny, nx);

            let mut min_n = f32::MAX;
            let mut max_n = f32::MIN;
            let mut min_p = f32::MAX;
            let mut max_p = f32::MIN;
            for point in hull_points {
                let (dx, dy) = (point.x - origin.x, point.y - origin.y);
                let proj_n = nx * dx + ny * dy;
                let proj_p = px * dx + py * dy;
                min_n = min_n.min(proj_n);
                max_n = max_n.max(proj_n);
                min_p = min_p.min(proj_p);
                max_p = max_p.max(proj_p);
            }

            let (width, height) = (max_n - min_n, max_p - min_p);
            let area = width * height;
            if best.as_ref().is_none_or(|(best_area, _)| area < *best_area) {
                let center_n = (min_n + max_n) / 2.0;
                let center_p = (min_p + max_p) / 2.0;
                best = Some((
                    area,
                    MinAreaRect {
                        center: Point::new(
                            origin.x + center_n * nx + center_p * px,
                            origin.y + center_n * ny + center_p * py,
                        ),
                        width,
                        height,
                        angle: ny.atan2(nx) * 180.0 / PI,
                    },
                ));
            }
        }

        best.map(|(_, rect)| rect).unwrap_or(MinAreaRect {
            center: Point::new(0.0, 0.0),
            width: 0.0,
            height: 0.0,
            angle: 0.0,
        })
    }

    /// Expands the convex hull outward by `distance`, moving every edge along
    /// its normal.
    ///
    /// Returns the hull unchanged for degenerate polygons or a non-positive
    /// distance.
    pub fn offset(&self, distance: f32) -> BoundingBox {
        let hull = self.convex_hull();
        let n = hull.points.len();
        if n < 3 || distance <= 0.0 || !distance.is_finite() {
            return hull;
        }

        // hull is counter-clockwise (y up), so the outward normal of a->b is (dy, -dx)
        let normals: Vec<(f32, f32)> = hull
            .points
            .iter()
            .circular_tuple_windows()
            .map(|(a, b)| {
                let len = a.distance(b).max(f32::EPSILON);
                ((b.y - a.y) / len, -(b.x - a.x) / len)
            })
            .collect();

        let points = (0..n)
            .map(|i| {
                let prev = (i + n - 1) % n;
                let vertex = hull.points[i];
                let (n1x, n1y) = normals[prev];
                let (n2x, n2y) = normals[i];
                // the miter point lies along n1 + n2, scaled so it sits `distance` from both edges
                let (bx, by) = (n1x + n2x, n1y + n2y);
                let dot = bx * n1x + by * n1y;
                if dot <= f32::EPSILON {
                    return Point::new(vertex.x + n2x * distance, vertex.y + n2y * distance);
                }
                let mut scale = distance / dot;
                let length = (bx * bx + by * by).sqrt() * scale;
                if length > MITER_LIMIT * distance {
                    scale *= MITER_LIMIT * distance / length;
                }
                Point::new(vertex.x + bx * scale, vertex.y + by * scale)
            })
            .collect();
        BoundingBox::new(points)
    }

    /// Expands the polygon by `area * unclip_ratio / perimeter`.
    pub fn unclip(&self, unclip_ratio: f32) -> BoundingBox {
        let hull = self.convex_hull();
        let perimeter = hull.perimeter();
        if perimeter <= f32::EPSILON {
            return hull;
        }
        let distance = hull.area() * unclip_ratio / perimeter;
        hull.offset(distance)
    }

    /// Intersection over union of the convex hulls of two polygons.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let a = self.convex_hull();
        let b = other.convex_hull();
        let area_a = a.area();
        let area_b = b.area();
        if a.points.len() < 3 || b.points.len() < 3 {
            return 0.0;
        }
        let intersection = clip_convex(&a.points, &b.points);
        let inter_area = BoundingBox::new(intersection).area();
        let union = area_a + area_b - inter_area;
        if union <= f32::EPSILON {
            0.0
        } else {
            (inter_area / union).clamp(0.0, 1.0)
        }
    }

    /// Lexicographic comparison of the vertex coordinates.
    pub fn total_cmp(&self, other: &BoundingBox) -> Ordering {
        for (a, b) in self.points.iter().zip(other.points.iter()) {
            let ordering = a
                .x
                .total_cmp(&b.x)
                .then_with(|| a.y.total_cmp(&b.y));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        self.points.len().cmp(&other.points.len())
    }
}

/// Sutherland-Hodgman clipping of a convex subject by a convex clip polygon,
/// both counter-clockwise.
fn clip_convex(subject: &[Point], clip: &[Point]) -> Vec<Point> {
    let mut output = subject.to_vec();
    for (edge_start, edge_end) in clip.iter().circular_tuple_windows() {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        let inside = |p: &Point| cross(edge_start, edge_end, p) >= 0.0;
        for (current, next) in input.iter().circular_tuple_windows() {
            let current_in = inside(current);
            let next_in = inside(next);
            if current_in {
                output.push(*current);
            }
            if current_in != next_in
                && let Some(p) = line_intersection(current, next, edge_start, edge_end)
            {
                output.push(p);
            }
        }
    }
    output
}

fn line_intersection(p1: &Point, p2: &Point, q1: &Point, q2: &Point) -> Option<Point> {
    let (rx, ry) = (p2.x - p1.x, p2.y - p1.y);
    let (sx, sy) = (q2.x - q1.x, q2.y - q1.y);
    let denom = rx * sy - ry * sx;
    if denom.abs() < f32::EPSILON {
        return None;
    }
    let t = ((q1.x - p1.x) * sy - (q1.y - p1.y) * sx) / denom;
    Some(Point::new(p1.x + t * rx, p1.y + t * ry))
}

/// Orders the corners of a quadrilateral as top-left, top-right,
/// bottom-right, bottom-left (image coordinates, y down).
///
/// Corners are sorted clockwise around the centroid and rotated so the corner
/// with the smallest `x + y` comes first.
pub fn order_quad_points(points: &[Point; 4]) -> [Point; 4] {
    let cx = points.iter().map(|p| p.x).sum::<f32>() / 4.0;
    let cy = points.iter().map(|p| p.y).sum::<f32>() / 4.0;

    let mut sorted = *points;
    sorted.sort_by(|a, b| {
        let angle_a = (a.y - cy).atan2(a.x - cx);
        let angle_b = (b.y - cy).atan2(b.x - cx);
        angle_a.total_cmp(&angle_b).then_with(|| a.total_cmp(b))
    });

    let start = sorted
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (a.x + a.y).total_cmp(&(b.x + b.y)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    sorted.rotate_left(start);
    sorted
}

/// A rectangle with minimum area that encloses a shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinAreaRect {
    /// The center point of the rectangle.
    pub center: Point,
    /// Extent along the rotated x axis.
    pub width: f32,
    /// Extent along the rotated y axis.
    pub height: f32,
    /// The rotation angle of the rectangle in degrees.
    pub angle: f32,
}

impl MinAreaRect {
    /// Corner points ordered top-left, top-right, bottom-right, bottom-left.
    pub fn get_box_points(&self) -> [Point; 4] {
        let (sin_a, cos_a) = (self.angle * PI / 180.0).sin_cos();
        let (w_2, h_2) = (self.width / 2.0, self.height / 2.0);
        let corner = |x: f32, y: f32| {
            Point::new(
                x * cos_a - y * sin_a + self.center.x,
                x * sin_a + y * cos_a + self.center.y,
            )
        };
        order_quad_points(&[
            corner(-w_2, -h_2),
            corner(w_2, -h_2),
            corner(w_2, h_2),
            corner(-w_2, h_2),
        ])
    }

    /// Gets the length of the shorter side of the rectangle.
    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_area_and_perimeter() {
        let rect = BoundingBox::from_coords(0.0, 0.0, 4.0, 3.0);
        assert!(approx(rect.area(), 12.0));
        assert!(approx(rect.perimeter(), 14.0));
    }

    #[test]
    fn test_convex_hull_drops_interior_and_collinear_points() {
        let polygon = BoundingBox::new(vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 4.0),
            Point::new(0.0, 4.0),
        ]);
        let hull = polygon.convex_hull();
        assert_eq!(hull.points.len(), 4);
        assert!(hull.signed_area() > 0.0);
        assert!(approx(hull.area(), 16.0));
    }

    #[test]
    fn test_collinear_points_have_degenerate_hull() {
        let line = BoundingBox::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
        ]);
        assert!(line.convex_hull().points.len() < 3);
        assert_eq!(line.iou(&line), 0.0);
    }

    #[test]
    fn test_min_area_rect_of_rotated_square() {
        let diamond = BoundingBox::new(vec![
            Point::new(5.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(5.0, 10.0),
            Point::new(0.0, 5.0),
        ]);
        let rect = diamond.get_min_area_rect();
        let side = 50.0f32.sqrt();
        assert!(approx(rect.width, side));
        assert!(approx(rect.height, side));
        assert!(approx(rect.center.x, 5.0) && approx(rect.center.y, 5.0));
    }

    #[test]
    fn test_box_points_are_ordered() {
        let rect = BoundingBox::from_coords(10.0, 20.0, 50.0, 30.0).get_min_area_rect();
        let [tl, tr, br, bl] = rect.get_box_points();
        assert!(approx(tl.x, 10.0) && approx(tl.y, 20.0));
        assert!(approx(tr.x, 50.0) && approx(tr.y, 20.0));
        assert!(approx(br.x, 50.0) && approx(br.y, 30.0));
        assert!(approx(bl.x, 10.0) && approx(bl.y, 30.0));
    }

    #[test]
    fn test_order_quad_points_from_any_rotation() {
        let expected = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 1.0),
            Point::new(9.0, 5.0),
            Point::new(-1.0, 4.0),
        ];
        let shuffled = [expected[2], expected[0], expected[3], expected[1]];
        assert_eq!(order_quad_points(&shuffled), expected);
    }

    #[test]
    fn test_offset_moves_rectangle_edges() {
        let rect = BoundingBox::from_coords(0.0, 0.0, 10.0, 4.0);
        let grown = rect.offset(2.0);
        assert!(approx(grown.x_min(), -2.0));
        assert!(approx(grown.x_max(), 12.0));
        assert!(approx(grown.y_min(), -2.0));
        assert!(approx(grown.y_max(), 6.0));
    }

    #[test]
    fn test_unclip_distance() {
        // area 40, perimeter 28, ratio 1.4 -> distance 2
        let rect = BoundingBox::from_coords(0.0, 0.0, 10.0, 4.0);
        let grown = rect.unclip(1.4);
        assert!(approx(grown.x_max() - grown.x_min(), 14.0));
        assert!(approx(grown.y_max() - grown.y_min(), 8.0));
    }

    #[test]
    fn test_iou() {
        let a = BoundingBox::from_coords(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::from_coords(5.0, 0.0, 15.0, 10.0);
        let c = BoundingBox::from_coords(20.0, 20.0, 30.0, 30.0);
        assert!(approx(a.iou(&a), 1.0));
        assert!(approx(a.iou(&b), 50.0 / 150.0));
        assert!(approx(a.iou(&c), 0.0));
        assert!(approx(a.iou(&b), b.iou(&a)));
    }

    #[test]
    fn test_centroid() {
        let rect = BoundingBox::from_coords(2.0, 4.0, 6.0, 8.0);
        let c = rect.centroid();
        assert!(approx(c.x, 4.0) && approx(c.y, 6.0));

        // clockwise order gives the same centroid
        let mut points = rect.points.clone();
        points.reverse();
        let c = BoundingBox::new(points).centroid();
        assert!(approx(c.x, 4.0) && approx(c.y, 6.0));
    }
}
