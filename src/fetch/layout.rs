use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;

use crate::page::VerseId;

/// Verse counts per surah in the Hafs numbering.
pub const SURAH_VERSE_COUNTS: [u16; 114] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, //
    123, 111, 43, 52, 99, 128, 111, 110, 98, 135, //
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, //
    34, 30, 73, 54, 45, 83, 182, 88, 75, 85, //
    54, 53, 89, 59, 37, 35, 38, 29, 18, 45, //
    60, 49, 62, 55, 78, 96, 29, 22, 24, 13, //
    14, 11, 11, 18, 12, 12, 30, 52, 52, 44, //
    28, 28, 20, 56, 40, 31, 50, 40, 46, 42, //
    29, 19, 36, 25, 22, 17, 19, 26, 30, 20, //
    15, 21, 11, 8, 8, 19, 5, 8, 8, 11, //
    11, 8, 3, 9, 5, 4, 7, 3, 6, 3, //
    5, 4, 5, 6,
];

/// `surah:verse-surah:verse`, whitespace tolerated around the dash.
const RANGE_PATTERN: &str = r"^\s*(\d+):(\d+)\s*-\s*(\d+):(\d+)\s*$";

/// Only the fields we read from a layout page.
#[derive(Debug, Deserialize)]
struct PageLayout {
    #[serde(default)]
    lines: Vec<LayoutLine>,
}

#[derive(Debug, Deserialize)]
struct LayoutLine {
    #[serde(rename = "verseRange", default)]
    verse_range: Option<String>,
}

fn verse_count(surah: u16) -> Result<u16> {
    surah
        .checked_sub(1)
        .and_then(|i| SURAH_VERSE_COUNTS.get(i as usize))
        .copied()
        .ok_or_else(|| anyhow!("Surah {} does not exist", surah))
}

/// Expands one range into verse ids.
///
/// A range that crosses into the next surah runs to the end of the first
/// surah, then from verse 1 of the second.
pub fn expand_verse_range(re: &Regex, range: &str) -> Result<Vec<VerseId>> {
    let caps = re
        .captures(range)
        .ok_or_else(|| anyhow!("Malformed verse range: {:?}", range))?;
    let num = |i: usize| -> Result<u16> {
        caps[i]
            .parse::<u16>()
            .context(format!("Bad number in verse range {:?}", range))
    };
    let (s_surah, s_verse, e_surah, e_verse) = (num(1)?, num(2)?, num(3)?, num(4)?);

    if s_surah == e_surah {
        return Ok((s_verse..=e_verse).map(|v| VerseId::new(s_surah, v)).collect());
    }

    let first_end = verse_count(s_surah)?;
    let mut verses: Vec<VerseId> = (s_verse..=first_end)
        .map(|v| VerseId::new(s_surah, v))
        .collect();
    verses.extend((1..=e_verse).map(|v| VerseId::new(e_surah, v)));
    Ok(verses)
}

/// Ordered, de-duplicated verse list from one layout page document.
pub fn verses_from_layout(json: &str) -> Result<Vec<VerseId>> {
    let layout: PageLayout = serde_json::from_str(json).context("Failed to parse page layout")?;
    let re = Regex::new(RANGE_PATTERN)?;

    let mut seen = HashSet::new();
    let mut verses = Vec::new();
    for range in layout
        .lines
        .iter()
        .filter_map(|line| line.verse_range.as_deref())
        .filter(|r| !r.is_empty())
    {
        for verse in expand_verse_range(&re, range)? {
            if seen.insert(verse) {
                verses.push(verse);
            }
        }
    }
    Ok(verses)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn re() -> Regex {
        Regex::new(RANGE_PATTERN).unwrap()
    }

    #[test]
    fn test_table_totals_6236() {
        let total: u32 = SURAH_VERSE_COUNTS.iter().map(|&c| c as u32).sum();
        assert_eq!(total, 6236);
    }

    #[test]
    fn test_same_surah_range() {
        let verses = expand_verse_range(&re(), "2:6-2:9").unwrap();
        assert_eq!(
            verses,
            vec![
                VerseId::new(2, 6),
                VerseId::new(2, 7),
                VerseId::new(2, 8),
                VerseId::new(2, 9)
            ]
        );
    }

    #[test]
    fn test_cross_surah_range() {
        let verses = expand_verse_range(&re(), "1:6-2:2").unwrap();
        assert_eq!(
            verses,
            vec![
                VerseId::new(1, 6),
                VerseId::new(1, 7),
                VerseId::new(2, 1),
                VerseId::new(2, 2)
            ]
        );
    }

    #[test]
    fn test_malformed_range_is_error() {
        assert!(expand_verse_range(&re(), "2:6").is_err());
        assert!(expand_verse_range(&re(), "115:1-116:2").is_err());
    }

    #[test]
    fn test_layout_dedups_lines_sharing_a_verse() {
        let json = r#"{
            "page": 3,
            "lines": [
                {"line": 1, "type": "text", "verseRange": "2:6-2:7"},
                {"line": 2, "type": "text", "verseRange": "2:7-2:8"},
                {"line": 3, "type": "surah_name"},
                {"line": 4, "type": "text", "verseRange": ""}
            ]
        }"#;

        let verses = verses_from_layout(json).unwrap();
        assert_eq!(
            verses,
            vec![VerseId::new(2, 6), VerseId::new(2, 7), VerseId::new(2, 8)]
        );
    }

    #[test]
    fn test_layout_without_lines_is_empty() {
        assert!(verses_from_layout("{}").unwrap().is_empty());
        assert!(verses_from_layout("not json").is_err());
    }
}
