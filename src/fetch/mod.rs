//! Acquisition of the authoritative page→verse mapping.
//!
//! Downloads the per-page layout documents of the public mushaf-layout
//! dataset and reduces each to its ordered verse list.

pub mod layout;

use layout::verses_from_layout;

use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::dataset::mapping::TOTAL_VERSES;
use crate::dataset::PageVerses;
use crate::log;
use crate::page::{Page, VerseId, PAGE_COUNT};

const LAYOUT_BASE_URL: &str =
    "https://raw.githubusercontent.com/zonetecde/mushaf-layout/main/mushaf";
const USER_AGENT: &str = "mushaf-markers";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Layout document URL for one page.
pub fn layout_url(page: Page) -> String {
    format!("{}/page-{:03}.json", LAYOUT_BASE_URL, page.number())
}

fn fetch_page(client: &reqwest::blocking::Client, page: Page) -> Result<Vec<VerseId>> {
    let response = client
        .get(layout_url(page))
        .header("User-Agent", USER_AGENT)
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!("HTTP {}", response.status()));
    }

    let body = response.text()?;
    verses_from_layout(&body)
}

/// Fetches every page and writes the mapping to `output`.
///
/// All pages are attempted; if any fail, nothing is written.
pub fn fetch_mapping(output: &Path) -> Result<PageVerses> {
    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    let mut pages = BTreeMap::new();
    let mut failures = 0usize;

    for page in Page::all() {
        match fetch_page(&client, page) {
            Ok(verses) => {
                pages.insert(page, verses);
            }
            Err(e) => {
                failures += 1;
                log(&format!("  Error page {}: {:#}", page, e));
            }
        }
        if page.number() % 100 == 0 {
            log(&format!("Fetched {}/{}...", page, PAGE_COUNT));
        }
    }

    if failures > 0 {
        return Err(anyhow!(
            "{} pages failed to download; mapping not written",
            failures
        ));
    }

    let mapping = PageVerses::new(pages);
    let total = mapping.total_verses();
    log(&format!(
        "Fetched {} pages, {} total verses",
        mapping.page_count(),
        total
    ));
    if total != TOTAL_VERSES {
        log(&format!(
            "WARNING: Expected {} verses, got {}",
            TOTAL_VERSES, total
        ));
    }

    mapping.save_json(output)?;
    log(&format!("Saved to {}", output.display()));
    Ok(mapping)
}
