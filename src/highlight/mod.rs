//! Verse highlight geometry.
//!
//! Converts each page's ordered marker sequence into axis-aligned
//! rectangles, one per text line a verse occupies. A verse's geometry
//! depends on the previous marker on the same page, so a page must be
//! complete before its segments are built.

pub mod rows;

pub use rows::{verse_rows, HighlightRow, LEFT_EDGE, LINE_HEIGHT, RIGHT_EDGE};

use crate::coords::round4;
use crate::dataset::{HighlightSegment, MarkerRecord};

fn clamp_unit(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// Expands a row into a segment: LINE_HEIGHT tall around the row center,
/// x bounds ordered, everything clamped to [0, 1] and rounded.
fn row_to_segment(marker: &MarkerRecord, segment: usize, row: HighlightRow) -> HighlightSegment {
    let y_lo = row.y - LINE_HEIGHT / 2.0;
    let y_hi = row.y + LINE_HEIGHT / 2.0;
    let x_lo = row.x_a.min(row.x_b);
    let x_hi = row.x_a.max(row.x_b);

    HighlightSegment {
        page: marker.page,
        verse: marker.verse,
        segment,
        x_start: round4(clamp_unit(x_lo)),
        y_start: round4(clamp_unit(y_lo)),
        x_end: round4(clamp_unit(x_hi)),
        y_end: round4(clamp_unit(y_hi)),
    }
}

/// Segments for one page's markers, in reading order.
///
/// The first marker is treated as the first verse on the page. A marker
/// whose predecessor belongs to a different page also starts fresh.
pub fn page_segments(markers: &[MarkerRecord]) -> Vec<HighlightSegment> {
    let mut out = Vec::new();

    for (i, marker) in markers.iter().enumerate() {
        let prev = i
            .checked_sub(1)
            .map(|j| &markers[j])
            .filter(|p| p.page == marker.page)
            .map(|p| p.point);

        for (segment, row) in verse_rows(marker.point, prev).into_iter().enumerate() {
            out.push(row_to_segment(marker, segment, row));
        }
    }

    out
}

/// Segments for a whole dataset.
///
/// Markers are grouped by page in order of first appearance, keeping the
/// within-page order, then each page is processed independently.
pub fn build_segments(markers: &[MarkerRecord]) -> Vec<HighlightSegment> {
    let mut groups: Vec<Vec<MarkerRecord>> = Vec::new();
    for marker in markers {
        match groups.iter_mut().find(|g| g[0].page == marker.page) {
            Some(group) => group.push(*marker),
            None => groups.push(vec![*marker]),
        }
    }

    groups.iter().flat_map(|g| page_segments(g)).collect()
}
