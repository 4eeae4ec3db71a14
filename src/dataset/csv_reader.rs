//! CSV reader for an existing marker dataset.
//!
//! Parses `data.csv` back into marker records so highlight geometry can be
//! regenerated without page images.

use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::coords::NormalizedPoint;
use crate::dataset::MarkerRecord;
use crate::page::{Page, VerseId};

/// Loads marker rows in file order.
///
/// CSV format expected:
/// surah_number,verse_number,page,x,y
///
/// Skips the header row and any malformed rows (with warning log).
pub fn read_markers(path: &Path) -> Result<Vec<MarkerRecord>> {
    let file = File::open(path).context(format!("Failed to open CSV file: {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut markers = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.context("Failed to read line from CSV")?;

        if line_num == 0 || line.trim().is_empty() {
            continue;
        }

        match parse_line(&line) {
            Ok(record) => markers.push(record),
            Err(e) => {
                crate::log(&format!(
                    "Warning: Skipping malformed CSV row {}: {}",
                    line_num + 1,
                    e
                ));
            }
        }
    }

    Ok(markers)
}

fn parse_line(line: &str) -> Result<MarkerRecord> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();

    if parts.len() < 5 {
        return Err(anyhow!("Expected 5 columns, got {}", parts.len()));
    }

    let surah = parts[0].parse::<u16>().context("Invalid surah number")?;
    let verse = parts[1].parse::<u16>().context("Invalid verse number")?;
    let page = Page::new(parts[2].parse::<u16>().context("Invalid page number")?)?;
    let x = parts[3].parse::<f64>().context("Invalid x")?;
    let y = parts[4].parse::<f64>().context("Invalid y")?;

    Ok(MarkerRecord {
        verse: VerseId::new(surah, verse),
        page,
        point: NormalizedPoint { x, y },
    })
}
