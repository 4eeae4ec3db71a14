//! Dataset types and file formats.
//!
//! This module provides:
//! - Loading of the authoritative page→verse mapping
//! - CSV output of markers and highlight segments
//! - CSV reading of an existing marker dataset
//! - JSON export of detection issues

pub mod csv_reader;
pub mod csv_writer;
pub mod export;
pub mod mapping;

pub use mapping::PageVerses;

use serde::Serialize;

use crate::coords::NormalizedPoint;
use crate::page::{Page, VerseId};

/// One row of the normalized marker dataset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerRecord {
    pub verse: VerseId,
    pub page: Page,
    /// Normalized glyph center; marks the END of the verse.
    pub point: NormalizedPoint,
}

/// One rectangular highlight region belonging to a verse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighlightSegment {
    pub page: Page,
    pub verse: VerseId,
    /// 0-based, top line first
    pub segment: usize,
    pub x_start: f64,
    pub y_start: f64,
    pub x_end: f64,
    pub y_end: f64,
}

/// A page whose detection could not reach the expected marker count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DetectionIssue {
    pub page: Page,
    pub expected: usize,
    pub detected: usize,
}
