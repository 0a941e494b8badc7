//! Reading-order sorting of text regions.
//!
//! Regions are grouped into rows top to bottom, then read left to right
//! within each row. The order depends only on geometry: permuting the input
//! or relabeling ids yields the same sequence of polygons.

use crate::processors::BoundingBox;
use std::cmp::Ordering;

struct Placed<'a> {
    index: usize,
    polygon: &'a BoundingBox,
    cx: f32,
    cy: f32,
    height: f32,
}

fn geometry_cmp(a: &Placed<'_>, b: &Placed<'_>) -> Ordering {
    a.polygon
        .total_cmp(b.polygon)
        .then_with(|| a.index.cmp(&b.index))
}

/// Groups polygons into rows in reading order.
///
/// A polygon joins the current row when its centroid y lies within
/// `tolerance * mean row height` of the row's mean centroid y. Returns rows of
/// indices into `polygons`.
pub fn reading_order(polygons: &[&BoundingBox], tolerance: f32) -> Vec<Vec<usize>> {
    let mut placed: Vec<Placed<'_>> = polygons
        .iter()
        .enumerate()
        .map(|(index, polygon)| {
            let c = polygon.centroid();
            Placed {
                index,
                polygon,
                cx: c.x,
                cy: c.y,
                height: polygon.height(),
            }
        })
        .collect();
    placed.sort_by(|a, b| {
        a.cy.total_cmp(&b.cy)
            .then_with(|| a.cx.total_cmp(&b.cx))
            .then_with(|| geometry_cmp(a, b))
    });

    let mut rows: Vec<Vec<Placed<'_>>> = Vec::new();
    for item in placed {
        let joins_row = rows.last().is_some_and(|row| {
            let n = row.len() as f32;
            let mean_cy = row.iter().map(|p| p.cy).sum::<f32>() / n;
            let mean_height = row.iter().map(|p| p.height).sum::<f32>() / n;
            (item.cy - mean_cy).abs() <= tolerance * mean_height
        });
        match rows.last_mut() {
            Some(row) if joins_row => row.push(item),
            _ => rows.push(vec![item]),
        }
    }

    rows.into_iter()
        .map(|mut row| {
            row.sort_by(|a, b| a.cx.total_cmp(&b.cx).then_with(|| geometry_cmp(a, b)));
            row.into_iter().map(|p| p.index).collect()
        })
        .collect()
}
