//! Page and verse identity types.
//!
//! The mushaf has 604 pages in two layout classes. Pages 1-2 are rendered
//! in a smaller frame with a larger marker glyph; every other page shares
//! the standard frame.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of pages in the mushaf.
pub const PAGE_COUNT: u16 = 604;

/// A page number in 1..=604.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Page(u16);

impl Page {
    /// Creates a page, rejecting numbers outside 1..=604.
    pub fn new(number: u16) -> Result<Self> {
        if number == 0 || number > PAGE_COUNT {
            return Err(anyhow!("Page {} is outside 1..={}", number, PAGE_COUNT));
        }
        Ok(Self(number))
    }

    /// Iterates every page in order.
    pub fn all() -> impl Iterator<Item = Page> {
        (1..=PAGE_COUNT).map(Page)
    }

    pub fn number(self) -> u16 {
        self.0
    }

    pub fn class(self) -> PageClass {
        if self.0 <= 2 {
            PageClass::First
        } else {
            PageClass::Standard
        }
    }

    /// Raster file name: zero-padded 3-digit page number.
    pub fn image_file_name(self) -> String {
        format!("{:03}.jpg", self.0)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Layout class of a page. Determines raster and template dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PageClass {
    /// Pages 1-2 (Al-Fatiha and the opening of Al-Baqarah).
    First,
    /// Pages 3-604.
    Standard,
}

impl PageClass {
    /// Page raster size in pixels (width, height).
    pub fn page_size(self) -> (u32, u32) {
        match self {
            Self::First => (486, 738),
            Self::Standard => (645, 1000),
        }
    }

    /// Reference template size in pixels (width, height).
    pub fn template_size(self) -> (u32, u32) {
        match self {
            Self::First => (52, 52),
            Self::Standard => (42, 42),
        }
    }

    /// Offset from template top-left to glyph center, in pixels.
    pub fn center_offset(self) -> u32 {
        match self {
            Self::First => 26,
            Self::Standard => 21,
        }
    }
}

/// A verse identity: (surah, verse). Ordering is canonical mushaf order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VerseId {
    pub surah: u16,
    pub verse: u16,
}

impl VerseId {
    pub fn new(surah: u16, verse: u16) -> Self {
        Self { surah, verse }
    }
}

impl fmt::Display for VerseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.surah, self.verse)
    }
}
