//! Per-verse highlight rows.
//!
//! A marker sits at the END of its verse. Text runs right-to-left, so a
//! verse starts just left of the previous verse's marker (or at the right
//! edge of a fresh line) and ends at its own marker.

use crate::coords::NormalizedPoint;

/// Vertical extent of one text line (normalized).
pub const LINE_HEIGHT: f64 = 0.055;
/// Vertical center of the first text line.
pub const TOP_FIRST_LINE_Y: f64 = LINE_HEIGHT / 2.0;
/// Left bound of the text block.
pub const LEFT_EDGE: f64 = 0.05;
/// Right bound of the text block.
pub const RIGHT_EDGE: f64 = 0.95;

/// One line of a verse highlight: vertical center and two x bounds
/// (unordered).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighlightRow {
    pub y: f64,
    pub x_a: f64,
    pub x_b: f64,
}

impl HighlightRow {
    fn new(y: f64, x_a: f64, x_b: f64) -> Self {
        Self { y, x_a, x_b }
    }
}

/// Full-width rows stepping down by one line from `from_y` while still more
/// than half a line above `target_y`. Always terminates: the step is a fixed
/// positive constant.
fn full_width_rows(rows: &mut Vec<HighlightRow>, from_y: f64, target_y: f64) {
    let mut current_y = from_y;
    while current_y < target_y - LINE_HEIGHT / 2.0 {
        rows.push(HighlightRow::new(current_y, LEFT_EDGE, RIGHT_EDGE));
        current_y += LINE_HEIGHT;
    }
}

/// Rows covered by `verse`, given the previous marker on the same page.
///
/// `prev` is `None` for the first verse on a page.
pub fn verse_rows(verse: NormalizedPoint, prev: Option<NormalizedPoint>) -> Vec<HighlightRow> {
    let mut rows = Vec::new();

    let Some(prev) = prev else {
        if verse.y <= TOP_FIRST_LINE_Y + LINE_HEIGHT / 2.0 {
            rows.push(HighlightRow::new(verse.y, verse.x, RIGHT_EDGE));
            return rows;
        }
        // Leave a quarter line at the top for the page frame
        full_width_rows(&mut rows, TOP_FIRST_LINE_Y + LINE_HEIGHT / 4.0, verse.y);
        rows.push(HighlightRow::new(verse.y, verse.x, RIGHT_EDGE));
        return rows;
    };

    if (prev.y - verse.y).abs() < LINE_HEIGHT {
        rows.push(HighlightRow::new(verse.y, verse.x, prev.x));
        return rows;
    }

    // Tail of the previous verse's line, then full lines, then the head of
    // this verse's own line.
    rows.push(HighlightRow::new(prev.y, LEFT_EDGE, prev.x));
    full_width_rows(&mut rows, prev.y + LINE_HEIGHT, verse.y);
    rows.push(HighlightRow::new(verse.y, verse.x, RIGHT_EDGE));
    rows
}
