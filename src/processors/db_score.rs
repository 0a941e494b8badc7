use crate::core::constants::PARALLEL_SCORE_AREA;
use crate::processors::geometry::BoundingBox;
use itertools::Itertools;
use ndarray::ArrayView2;
use rayon::prelude::*;

use super::DBPostProcess;

/// Reusable buffer for even-odd polygon scanlines.
struct ScanlineBuffer {
    crossings: Vec<f32>,
}

impl ScanlineBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            crossings: Vec::with_capacity(capacity),
        }
    }

    /// Sums the heatmap over pixels of row `y` whose centers lie inside the
    /// polygon. Returns the sum and the pixel count.
    fn process_scanline(
        &mut self,
        y: usize,
        bbox: &BoundingBox,
        start_x: usize,
        end_x: usize,
        pred: &ArrayView2<'_, f32>,
    ) -> (f32, usize) {
        let scan_y = y as f32 + 0.5;
        self.crossings.clear();
        for (a, b) in bbox.points.iter().circular_tuple_windows() {
            if (a.y <= scan_y) != (b.y <= scan_y) {
                let t = (scan_y - a.y) / (b.y - a.y);
                self.crossings.push(a.x + t * (b.x - a.x));
            }
        }
        self.crossings.sort_by(f32::total_cmp);

        let mut sum = 0.0;
        let mut count = 0;
        for span in self.crossings.chunks_exact(2) {
            // pixel x is inside when x + 0.5 lies in [left, right]
            let left = ((span[0] - 0.5).ceil().max(0.0) as usize).max(start_x);
            let right = (span[1] - 0.5).floor();
            if right < 0.0 {
                continue;
            }
            let right = (right as usize + 1).min(end_x);
            for x in left..right {
                sum += pred[[y, x]];
                count += 1;
            }
        }
        (sum, count)
    }
}

impl DBPostProcess {
    /// Mean heatmap value over the pixels inside the polygon.
    ///
    /// Large regions are scored with one scanline per rayon task.
    pub(super) fn box_score_fast(&self, pred: &ArrayView2<'_, f32>, bbox: &BoundingBox) -> f32 {
        let (height, width) = pred.dim();
        if bbox.points.len() < 3 || height == 0 || width == 0 {
            return 0.0;
        }

        let (min_x, max_x) = bbox
            .points
            .iter()
            .map(|p| p.x)
            .minmax_by(f32::total_cmp)
            .into_option()
            .unwrap_or((0.0, 0.0));
        let (min_y, max_y) = bbox
            .points
            .iter()
            .map(|p| p.y)
            .minmax_by(f32::total_cmp)
            .into_option()
            .unwrap_or((0.0, 0.0));

        let start_x = min_x.clamp(0.0, width as f32 - 1.0) as usize;
        let end_x = max_x.clamp(0.0, width as f32 - 1.0) as usize + 1;
        let start_y = min_y.clamp(0.0, height as f32 - 1.0) as usize;
        let end_y = max_y.clamp(0.0, height as f32 - 1.0) as usize + 1;
        let capacity = bbox.points.len();

        let (total, pixels) = if (end_y - start_y) * (end_x - start_x) < PARALLEL_SCORE_AREA {
            let mut buffer = ScanlineBuffer::new(capacity);
            (start_y..end_y).fold((0.0, 0), |(sum, count), y| {
                let (s, c) = buffer.process_scanline(y, bbox, start_x, end_x, pred);
                (sum + s, count + c)
            })
        } else {
            (start_y..end_y)
                .into_par_iter()
                .map(|y| ScanlineBuffer::new(capacity).process_scanline(y, bbox, start_x, end_x, pred))
                .reduce(|| (0.0, 0), |(s1, c1), (s2, c2)| (s1 + s2, c1 + c2))
        };

        if pixels > 0 { total / pixels as f32 } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, s};

    #[test]
    fn test_score_counts_only_inside_pixels() {
        let mut pred = Array2::<f32>::zeros((20, 20));
        pred.slice_mut(s![5..10, 5..10]).fill(1.0);
        let post = DBPostProcess::default();

        let inner = BoundingBox::from_coords(5.0, 5.0, 10.0, 10.0);
        assert!((post.box_score_fast(&pred.view(), &inner) - 1.0).abs() < 1e-6);

        // twice as wide: half the pixels are zero
        let wide = BoundingBox::from_coords(5.0, 5.0, 15.0, 10.0);
        assert!((post.box_score_fast(&pred.view(), &wide) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_large_region_uses_same_score() {
        let pred = Array2::<f32>::from_elem((200, 200), 0.25);
        let bbox = BoundingBox::from_coords(0.0, 0.0, 199.0, 199.0);
        let score = DBPostProcess::default().box_score_fast(&pred.view(), &bbox);
        assert!((score - 0.25).abs() < 1e-5);
    }
}
