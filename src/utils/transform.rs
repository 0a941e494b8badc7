//! Perspective transformation utilities.
//!
//! Maps a quadrilateral of the source image onto an upright rectangle, used
//! to turn detected regions into recognition strips.

use crate::core::OCRError;
use crate::core::constants::MIN_POLYGON_AREA;
use crate::processors::{BoundingBox, Point};
use image::{Rgb, RgbImage};
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};
use rayon::prelude::*;

/// Fill colour for samples that fall outside the source image.
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Calculates the homography mapping four source points onto four
/// destination points.
///
/// Solves the 8x8 linear system for the eight free parameters with `h33 = 1`.
pub fn get_perspective_transform(
    src_points: &[Point; 4],
    dst_points: &[Point; 4],
) -> Result<Matrix3<f64>, OCRError> {
    for (name, points) in [("source", src_points), ("destination", dst_points)] {
        let area = BoundingBox::new(points.to_vec()).area();
        if !(area >= MIN_POLYGON_AREA) {
            return Err(OCRError::geometry(format!(
                "{name} quadrilateral is degenerate (area {area})"
            )));
        }
    }

    let mut a = DMatrix::<f64>::zeros(8, 8);
    let mut b = DVector::<f64>::zeros(8);

    for (i, (src, dst)) in src_points.iter().zip(dst_points.iter()).enumerate() {
        let (sx, sy) = (src.x as f64, src.y as f64);
        let (dx, dy) = (dst.x as f64, dst.y as f64);

        let row_x = [sx, sy, 1.0, 0.0, 0.0, 0.0, -sx * dx, -sy * dx];
        let row_y = [0.0, 0.0, 0.0, sx, sy, 1.0, -sx * dy, -sy * dy];
        for (j, (vx, vy)) in row_x.iter().zip(row_y.iter()).enumerate() {
            a[(i * 2, j)] = *vx;
            a[(i * 2 + 1, j)] = *vy;
        }
        b[i * 2] = dx;
        b[i * 2 + 1] = dy;
    }

    let solution = a
        .lu()
        .solve(&b)
        .filter(|s| s.iter().all(|v| v.is_finite()))
        .ok_or_else(|| {
            OCRError::geometry("cannot solve perspective transform: degenerate quadrilateral")
        })?;

    Ok(Matrix3::new(
        solution[0],
        solution[1],
        solution[2],
        solution[3],
        solution[4],
        solution[5],
        solution[6],
        solution[7],
        1.0,
    ))
}

/// Applies a perspective transformation with inverse mapping and bilinear
/// sampling. Rows are processed in parallel.
pub fn warp_perspective(
    src_image: &RgbImage,
    transform_matrix: &Matrix3<f64>,
    dst_width: u32,
    dst_height: u32,
) -> Result<RgbImage, OCRError> {
    let inv_matrix = transform_matrix
        .try_inverse()
        .ok_or_else(|| OCRError::geometry("cannot invert perspective transform"))?;

    let mut dst_image = RgbImage::from_pixel(dst_width, dst_height, BACKGROUND);
    if dst_width == 0 || dst_height == 0 {
        return Ok(dst_image);
    }
    let (src_width, src_height) = src_image.dimensions();
    let max_x = src_width.saturating_sub(1) as f64;
    let max_y = src_height.saturating_sub(1) as f64;
    let buffer: &mut [u8] = dst_image.as_mut();

    buffer
        .par_chunks_mut((dst_width * 3) as usize)
        .enumerate()
        .for_each(|(dst_y, row_buffer)| {
            for dst_x in 0..dst_width {
                let src_point = inv_matrix * Vector3::new(dst_x as f64, dst_y as f64, 1.0);
                if src_point.z.abs() <= f64::EPSILON {
                    continue;
                }
                let src_x = src_point.x / src_point.z;
                let src_y = src_point.y / src_point.z;
                if src_width == 0
                    || src_height == 0
                    || !(0.0..=max_x).contains(&src_x)
                    || !(0.0..=max_y).contains(&src_y)
                {
                    continue;
                }
                let pixel = bilinear_interpolate(src_image, src_x as f32, src_y as f32);
                let index = (dst_x * 3) as usize;
                row_buffer[index..index + 3].copy_from_slice(&pixel.0);
            }
        });

    Ok(dst_image)
}

/// Performs bilinear interpolation at fractional coordinates inside the image.
pub fn bilinear_interpolate(image: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let x1 = x.floor() as u32;
    let y1 = y.floor() as u32;
    let x2 = (x1 + 1).min(image.width() - 1);
    let y2 = (y1 + 1).min(image.height() - 1);

    let dx = x - x1 as f32;
    let dy = y - y1 as f32;

    let p11 = image.get_pixel(x1, y1);
    let p12 = image.get_pixel(x1, y2);
    let p21 = image.get_pixel(x2, y1);
    let p22 = image.get_pixel(x2, y2);

    let mut result = [0u8; 3];
    for (i, channel) in result.iter_mut().enumerate() {
        let val = (1.0 - dx) * (1.0 - dy) * p11.0[i] as f32
            + dx * (1.0 - dy) * p21.0[i] as f32
            + (1.0 - dx) * dy * p12.0[i] as f32
            + dx * dy * p22.0[i] as f32;
        *channel = val.round().clamp(0.0, 255.0) as u8;
    }
    Rgb(result)
}

/// Warps the quad `[top-left, top-right, bottom-right, bottom-left]` onto a
/// `width x height` image.
pub fn warp_quad_to_rect(
    src_image: &RgbImage,
    quad: &[Point; 4],
    width: u32,
    height: u32,
) -> Result<RgbImage, OCRError> {
    if width == 0 || height == 0 {
        return Err(OCRError::geometry(format!(
            "target size must be non-zero, got {width}x{height}"
        )));
    }
    let (w, h) = (width as f32, height as f32);
    let target = [
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(w, h),
        Point::new(0.0, h),
    ];
    let matrix = get_perspective_transform(quad, &target)?;
    warp_perspective(src_image, &matrix, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x * 10) as u8, (y * 10) as u8, 0]))
    }

    #[test]
    fn test_identity_transform() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ];
        let matrix = get_perspective_transform(&square, &square).unwrap();
        assert!((matrix - Matrix3::identity()).amax() < 1e-9);
    }

    #[test]
    fn test_scaling_transform() {
        let src = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        let dst = [
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ];
        let matrix = get_perspective_transform(&src, &dst).unwrap();
        let p = matrix * Vector3::new(0.5, 0.5, 1.0);
        assert!((p.x / p.z - 1.0).abs() < 1e-9);
        assert!((p.y / p.z - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_collinear_points_fail() {
        let line = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
            Point::new(3.0, 3.0),
        ];
        let err = warp_quad_to_rect(&gradient(4, 4), &line, 4, 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Geometry);
    }

    #[test]
    fn test_warp_crops_subregion() {
        let image = gradient(20, 20);
        let quad = [
            Point::new(5.0, 5.0),
            Point::new(15.0, 5.0),
            Point::new(15.0, 10.0),
            Point::new(5.0, 10.0),
        ];
        let out = warp_quad_to_rect(&image, &quad, 10, 5).unwrap();
        assert_eq!(out.dimensions(), (10, 5));
        assert_eq!(out.get_pixel(0, 0), image.get_pixel(5, 5));
        assert_eq!(out.get_pixel(3, 2), image.get_pixel(8, 7));
    }

    #[test]
    fn test_outside_samples_are_white() {
        let image = RgbImage::new(10, 10);
        let quad = [
            Point::new(-20.0, -20.0),
            Point::new(-10.0, -20.0),
            Point::new(-10.0, -10.0),
            Point::new(-20.0, -10.0),
        ];
        let out = warp_quad_to_rect(&image, &quad, 4, 4).unwrap();
        assert!(out.pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn test_singular_matrix_is_rejected() {
        let matrix = Matrix3::new(1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        assert!(warp_perspective(&RgbImage::new(2, 2), &matrix, 2, 2).is_err());
    }
}
