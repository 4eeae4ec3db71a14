//! Ordered assignment of verse identities to detected markers.
//!
//! The n-th marker in reading order is the end of the n-th verse on the
//! page. This positional coupling is only trusted when the counts agree;
//! any mismatch is reported as an issue for the page.

use crate::calibration::CalibrationOutcome;
use crate::coords::{normalize, RawPoint};
use crate::dataset::{DetectionIssue, MarkerRecord};
use crate::page::{Page, VerseId};

/// Markers for one page with verse identities attached.
#[derive(Debug, Clone, PartialEq)]
pub struct PageAssignment {
    /// Exactly one record per authoritative verse, in reading order.
    pub markers: Vec<MarkerRecord>,
    /// Number of records whose coordinate was synthesized.
    pub synthesized: usize,
    pub issue: Option<DetectionIssue>,
}

/// Zips verse identities with ordered raw points and normalizes them.
///
/// Surplus points are dropped. Missing points are filled with the last
/// detected point, or raw (0, 0) when nothing was detected, so the record
/// count always equals `verses.len()`.
pub fn assign_verses(page: Page, verses: &[VerseId], outcome: &CalibrationOutcome) -> PageAssignment {
    let points = &outcome.points;
    let expected = verses.len();
    let count_matches = points.len() == expected;

    let issue = (!outcome.exact || !count_matches).then_some(DetectionIssue {
        page,
        expected,
        detected: points.len(),
    });

    let placeholder = points.last().copied().unwrap_or_default();
    let class = page.class();
    let markers = verses
        .iter()
        .enumerate()
        .map(|(i, &verse)| {
            let raw: RawPoint = points.get(i).copied().unwrap_or(placeholder);
            MarkerRecord {
                verse,
                page,
                point: normalize(class, raw),
            }
        })
        .collect();

    PageAssignment {
        markers,
        synthesized: expected.saturating_sub(points.len()),
        issue,
    }
}
