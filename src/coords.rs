//! Coordinate conversion utilities.
//!
//! Converts raw pixel coordinates (template top-left, as reported by the
//! detectors) to resolution-independent center coordinates (0.0-1.0)
//! within the page frame.

use serde::{Deserialize, Serialize};

use crate::page::PageClass;

/// A point in page pixel space (top-left corner of a matched template).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RawPoint {
    pub x: i32,
    pub y: i32,
}

impl RawPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    pub fn distance_sq(self, other: RawPoint) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

/// A glyph center in normalized page coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    /// 0.0 = left edge, 1.0 = right edge
    pub x: f64,
    /// 0.0 = top edge, 1.0 = bottom edge
    pub y: f64,
}

/// Rounds to 4 decimal digits, the precision of the published datasets.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Converts a raw template top-left coordinate to a normalized glyph center.
///
/// Adds the class half-template offset, then divides by the class page size.
pub fn normalize(class: PageClass, raw: RawPoint) -> NormalizedPoint {
    let (width, height) = class.page_size();
    let offset = class.center_offset() as f64;

    NormalizedPoint {
        x: round4((raw.x as f64 + offset) / width as f64),
        y: round4((raw.y as f64 + offset) / height as f64),
    }
}
