//! Reading-order reconstruction for detected markers.
//!
//! Markers are grouped into text lines by vertical position, then each line
//! is read right-to-left. Lines are emitted top-to-bottom.

use crate::coords::RawPoint;

/// Groups points into rows and orders them right-to-left, top-to-bottom.
///
/// A point joins the current row when its y is within `group_threshold` of
/// the row's FIRST point. Output is a permutation of the input.
pub fn group_and_sort(points: &[RawPoint], group_threshold: f64) -> Vec<RawPoint> {
    let mut sorted = points.to_vec();
    // Stable: equal-y points keep detection order
    sorted.sort_by_key(|p| p.y);

    let mut rows: Vec<Vec<RawPoint>> = Vec::new();
    for point in sorted {
        match rows.last_mut() {
            Some(row) if ((point.y - row[0].y) as f64).abs() <= group_threshold => {
                row.push(point)
            }
            _ => rows.push(vec![point]),
        }
    }

    for row in &mut rows {
        row.sort_by_key(|p| std::cmp::Reverse(p.x));
    }

    rows.into_iter().flatten().collect()
}
