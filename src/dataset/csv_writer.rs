//! CSV writers for the marker and highlight datasets.
//!
//! Both files are rewritten from scratch on every run; rows are expected to
//! arrive grouped by page in reading order.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::dataset::{HighlightSegment, MarkerRecord};

/// Header of `data.csv`.
pub const MARKERS_HEADER: &str = "surah_number,verse_number,page,x,y";

/// Header of `data_verse.csv`.
pub const SEGMENTS_HEADER: &str =
    "page,surah_number,verse_number,segment,x_start,y_start,x_end,y_end";

/// Writes the normalized marker dataset.
///
/// Coordinates use the shortest round-trip float form with a decimal point
/// always present (`0.0`, `1.0`, `0.5103`).
pub fn write_markers(path: &Path, markers: &[MarkerRecord]) -> Result<()> {
    let file = File::create(path).context(format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "{}", MARKERS_HEADER).context("Failed to write CSV header")?;
    for m in markers {
        // Format: surah_number,verse_number,page,x,y
        writeln!(
            out,
            "{},{},{},{:?},{:?}",
            m.verse.surah, m.verse.verse, m.page, m.point.x, m.point.y
        )
        .context("Failed to write marker row")?;
    }

    out.flush().context("Failed to flush marker CSV")?;
    Ok(())
}

/// Writes the verse highlight dataset.
pub fn write_segments(path: &Path, segments: &[HighlightSegment]) -> Result<()> {
    let file = File::create(path).context(format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "{}", SEGMENTS_HEADER).context("Failed to write CSV header")?;
    for s in segments {
        writeln!(
            out,
            "{},{},{},{},{:?},{:?},{:?},{:?}",
            s.page, s.verse.surah, s.verse.verse, s.segment, s.x_start, s.y_start, s.x_end, s.y_end
        )
        .context("Failed to write segment row")?;
    }

    out.flush().context("Failed to flush segment CSV")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::NormalizedPoint;
    use crate::page::{Page, VerseId};
    use tempfile::tempdir;

    #[test]
    fn test_write_markers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let markers = vec![
            MarkerRecord {
                verse: VerseId::new(1, 1),
                page: Page::new(1).unwrap(),
                point: NormalizedPoint { x: 0.5103, y: 0.2114 },
            },
            MarkerRecord {
                verse: VerseId::new(1, 2),
                page: Page::new(1).unwrap(),
                point: NormalizedPoint { x: 0.25, y: 0.0 },
            },
        ];

        write_markers(&path, &markers).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], MARKERS_HEADER);
        assert_eq!(lines[1], "1,1,1,0.5103,0.2114");
        // Whole-number floats keep their decimal point
        assert_eq!(lines[2], "1,2,1,0.25,0.0");
    }

    #[test]
    fn test_segment_edges_keep_decimal_point() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data_verse.csv");
        let segments = vec![HighlightSegment {
            page: Page::new(4).unwrap(),
            verse: VerseId::new(2, 25),
            segment: 0,
            x_start: 0.0,
            y_start: 0.9725,
            x_end: 1.0,
            y_end: 1.0,
        }];

        write_segments(&path, &segments).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().nth(1), Some("4,2,25,0,0.0,0.9725,1.0,1.0"));
    }

    #[test]
    fn test_write_segments() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data_verse.csv");
        let segments = vec![HighlightSegment {
            page: Page::new(3).unwrap(),
            verse: VerseId::new(2, 6),
            segment: 1,
            x_start: 0.05,
            y_start: 0.4725,
            x_end: 0.95,
            y_end: 0.5275,
        }];

        write_segments(&path, &segments).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], SEGMENTS_HEADER);
        assert_eq!(lines[1], "3,2,6,1,0.05,0.4725,0.95,0.5275");
    }
}
