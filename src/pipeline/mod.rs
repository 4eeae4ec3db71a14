//! Page-parallel marker pipeline.
//!
//! This module provides:
//! - Prerequisite loading (templates, mapping, image directory)
//! - Per-page detection → calibration → assignment → highlight geometry
//! - A worker pool over pages and an ordered fold of per-page results

pub mod assign;
pub mod queue;
pub mod worker;

pub use worker::{process_page, run_pages};

use anyhow::{anyhow, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};

use crate::calibration::config::PipelineConfig;
use crate::dataset::{DetectionIssue, HighlightSegment, MarkerRecord, PageVerses};
use crate::detection::load_rgb;
use crate::page::{Page, PageClass};

/// The two reference glyph templates.
pub struct Templates {
    pub first: RgbImage,
    pub standard: RgbImage,
}

impl Templates {
    /// Loads both templates. A missing template is a fatal prerequisite error.
    pub fn load(first_path: &Path, standard_path: &Path) -> Result<Self> {
        Ok(Self {
            first: load_rgb(first_path)?,
            standard: load_rgb(standard_path)?,
        })
    }

    pub fn for_class(&self, class: PageClass) -> &RgbImage {
        match class {
            PageClass::First => &self.first,
            PageClass::Standard => &self.standard,
        }
    }
}

/// Read-only inputs shared by every page worker.
pub struct PageContext<'a> {
    pub templates: &'a Templates,
    pub mapping: &'a PageVerses,
    pub config: &'a PipelineConfig,
    pub images_dir: PathBuf,
}

/// Everything produced for one page.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub page: Page,
    pub markers: Vec<MarkerRecord>,
    pub segments: Vec<HighlightSegment>,
    pub issue: Option<DetectionIssue>,
}

/// Aggregated output across pages, in page order.
#[derive(Debug, Clone, Default)]
pub struct DatasetReport {
    pub markers: Vec<MarkerRecord>,
    pub segments: Vec<HighlightSegment>,
    pub issues: Vec<DetectionIssue>,
}

impl DatasetReport {
    /// Folds page outcomes (already in page order) into one report.
    pub fn from_outcomes(outcomes: Vec<PageOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(DatasetReport::default(), |mut report, outcome| {
                report.markers.extend(outcome.markers);
                report.segments.extend(outcome.segments);
                report.issues.extend(outcome.issue);
                report
            })
    }
}

/// Fails fast if the page image directory is missing.
pub fn check_images_dir(images_dir: &Path) -> Result<()> {
    if !images_dir.is_dir() {
        return Err(anyhow!(
            "{} not found. Create it with zero-padded page images (001.jpg - 604.jpg).",
            images_dir.display()
        ));
    }
    Ok(())
}

/// Runs detection for every page in the mapping.
pub fn run_detection(ctx: &PageContext, workers: usize) -> DatasetReport {
    let pages: Vec<Page> = Page::all().collect();
    let report = DatasetReport::from_outcomes(run_pages(&pages, ctx, workers));

    if report.issues.is_empty() {
        crate::log(&format!("All {} pages matched perfectly!", pages.len()));
    } else {
        crate::log(&format!(
            "Warning: {} pages had detection issues:",
            report.issues.len()
        ));
        for issue in &report.issues {
            crate::log(&format!(
                "  Page {}: expected {}, detected {}",
                issue.page, issue.expected, issue.detected
            ));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::VerseId;
    use image::{ImageBuffer, Rgb};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    /// Ring glyph on white, like the real marker.
    fn glyph(size: u32) -> RgbImage {
        let c = (size as f32 - 1.0) / 2.0;
        ImageBuffer::from_fn(size, size, |x, y| {
            let d = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2)).sqrt();
            if d > c * 0.55 && d < c * 0.9 {
                Rgb([30, 110, 60])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    fn mapping_with(page: Page, verses: Vec<VerseId>) -> PageVerses {
        let mut pages = BTreeMap::new();
        pages.insert(page, verses);
        PageVerses::new(pages)
    }

    fn templates() -> Templates {
        Templates {
            first: glyph(52),
            standard: glyph(42),
        }
    }

    #[test]
    fn test_process_page_end_to_end() {
        let dir = tempdir().unwrap();
        let tpl = glyph(42);
        let mut raster: RgbImage = ImageBuffer::from_pixel(560, 410, Rgb([255, 255, 255]));
        // Line 1: two markers, line 2: one marker
        for &(x, y) in &[(100, 300), (500, 302), (300, 355)] {
            image::imageops::replace(&mut raster, &tpl, x, y);
        }
        // Lossless bytes under the NNN.jpg name; the loader sniffs the format
        raster
            .save_with_format(dir.path().join("010.jpg"), image::ImageFormat::Png)
            .unwrap();

        let page = Page::new(10).unwrap();
        let verses = vec![VerseId::new(2, 60), VerseId::new(2, 61), VerseId::new(2, 62)];
        let mapping = mapping_with(page, verses.clone());
        let templates = templates();
        let config = PipelineConfig::default();
        let ctx = PageContext {
            templates: &templates,
            mapping: &mapping,
            config: &config,
            images_dir: dir.path().to_path_buf(),
        };

        let outcome = process_page(page, &ctx);

        assert!(outcome.issue.is_none(), "{:?}", outcome.issue);
        assert_eq!(outcome.markers.len(), 3);
        let got: Vec<VerseId> = outcome.markers.iter().map(|m| m.verse).collect();
        assert_eq!(got, verses);
        // Right-most marker on the first line is the first verse
        assert!((outcome.markers[0].point.x - 0.8078).abs() < 0.03); // (500 + 21) / 645
        assert!((outcome.markers[1].point.x - 0.1876).abs() < 0.03); // (100 + 21) / 645
        assert!(outcome.markers[2].point.y > outcome.markers[0].point.y);
        assert!(!outcome.segments.is_empty());
    }

    #[test]
    fn test_missing_raster_still_emits_every_verse() {
        let dir = tempdir().unwrap();
        let page = Page::new(300).unwrap();
        let verses: Vec<VerseId> = (1..=5).map(|v| VerseId::new(20, v)).collect();
        let mapping = mapping_with(page, verses);
        let templates = templates();
        let config = PipelineConfig::default();
        let ctx = PageContext {
            templates: &templates,
            mapping: &mapping,
            config: &config,
            images_dir: dir.path().to_path_buf(),
        };

        let outcome = process_page(page, &ctx);

        assert_eq!(outcome.markers.len(), 5);
        assert_eq!(
            outcome.issue,
            Some(DetectionIssue {
                page,
                expected: 5,
                detected: 0
            })
        );
    }

    #[test]
    fn test_report_fold_preserves_page_order() {
        let page_a = Page::new(1).unwrap();
        let page_b = Page::new(2).unwrap();
        let outcomes = vec![
            PageOutcome {
                page: page_a,
                markers: Vec::new(),
                segments: Vec::new(),
                issue: None,
            },
            PageOutcome {
                page: page_b,
                markers: Vec::new(),
                segments: Vec::new(),
                issue: Some(DetectionIssue {
                    page: page_b,
                    expected: 3,
                    detected: 1,
                }),
            },
        ];

        let report = DatasetReport::from_outcomes(outcomes);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].page, page_b);
    }

    #[test]
    fn test_missing_images_dir_is_fatal() {
        let dir = tempdir().unwrap();
        assert!(check_images_dir(&dir.path().join("images")).is_err());
        assert!(check_images_dir(dir.path()).is_ok());
    }
}
