//! Authoritative page→verse mapping.
//!
//! `page_verses.json` maps each decimal page number to its ordered list of
//! `[surah, verse]` pairs. It is ground truth: detection never invents or
//! reorders verse identities.

use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use crate::page::{Page, VerseId};

/// Total verses in the Hafs numbering.
pub const TOTAL_VERSES: usize = 6236;

/// Ordered verse list for every page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageVerses {
    pages: BTreeMap<Page, Vec<VerseId>>,
}

impl PageVerses {
    pub fn new(pages: BTreeMap<Page, Vec<VerseId>>) -> Self {
        Self { pages }
    }

    /// Loads the mapping and checks that every page 1..=604 is present.
    pub fn from_json(path: &Path) -> Result<Self> {
        let file =
            File::open(path).context(format!("Failed to open mapping: {}", path.display()))?;
        let raw: BTreeMap<String, Vec<(u16, u16)>> = serde_json::from_reader(BufReader::new(file))
            .context(format!("Failed to parse mapping: {}", path.display()))?;

        let mut pages = BTreeMap::new();
        for (key, verses) in raw {
            let number: u16 = key
                .parse()
                .context(format!("Invalid page key in mapping: {:?}", key))?;
            let page = Page::new(number)?;
            let verses = verses
                .into_iter()
                .map(|(surah, verse)| VerseId::new(surah, verse))
                .collect();
            pages.insert(page, verses);
        }

        let mapping = Self { pages };
        if let Some(missing) = Page::all().find(|p| !mapping.pages.contains_key(p)) {
            return Err(anyhow!("Mapping has no entry for page {}", missing));
        }
        Ok(mapping)
    }

    /// Writes the mapping in the same format `from_json` reads.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let raw: BTreeMap<String, Vec<(u16, u16)>> = self
            .pages
            .iter()
            .map(|(page, verses)| {
                let pairs = verses.iter().map(|v| (v.surah, v.verse)).collect();
                (page.to_string(), pairs)
            })
            .collect();
        let json = serde_json::to_string(&raw).context("Failed to serialize mapping")?;

        let mut file = File::create(path)
            .context(format!("Failed to create mapping file: {}", path.display()))?;
        file.write_all(json.as_bytes())
            .context("Failed to write mapping")?;
        Ok(())
    }

    /// Verses on `page`, in reading order. Empty if the page is unknown.
    pub fn verses(&self, page: Page) -> &[VerseId] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_verses(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
