//! Verse-marker detection on page rasters.
//!
//! This module provides:
//! - Template correlation detection (primary)
//! - Circle-shape detection (fallback)
//! - Reading-order reconstruction shared by both
//! - A per-page detector that the calibrator drives

pub mod circles;
pub mod clustering;
pub mod preprocess;
pub mod template;

pub use preprocess::{load_page_raster, load_rgb, to_gray_bt601};
pub use template::TemplateDetector;

use image::{GrayImage, RgbImage};
use std::cell::OnceCell;

use crate::calibration::config::CircleConfig;
use crate::coords::RawPoint;

/// Something that can produce ordered marker lists for one page.
///
/// The calibrator only sees this trait, so its search policy can be
/// exercised without rasters.
pub trait MarkerSource {
    /// Template correlation detection at `threshold`.
    fn detect_template(&self, threshold: f32) -> Vec<RawPoint>;
    /// Circle fallback detection at `sensitivity`.
    fn detect_circles(&self, sensitivity: u32) -> Vec<RawPoint>;
}

/// Detector for a single page raster.
///
/// Holds the precomputed correlation map. The grayscale page for the circle
/// fallback is only built if the fallback is actually reached.
pub struct PageDetector<'a> {
    raster: Option<RgbImage>,
    template: Option<TemplateDetector>,
    gray: OnceCell<GrayImage>,
    recentre_size: (u32, u32),
    circles: &'a CircleConfig,
}

impl<'a> PageDetector<'a> {
    /// Builds a detector. A `None` raster yields zero detections everywhere.
    ///
    /// `recentre_size` is the template size used to shift circle centers to
    /// template top-left coordinates.
    pub fn new(
        raster: Option<RgbImage>,
        template: &RgbImage,
        recentre_size: (u32, u32),
        circles: &'a CircleConfig,
    ) -> Self {
        let template = raster.as_ref().map(|r| TemplateDetector::new(r, template));
        Self {
            raster,
            template,
            gray: OnceCell::new(),
            recentre_size,
            circles,
        }
    }
}

impl MarkerSource for PageDetector<'_> {
    fn detect_template(&self, threshold: f32) -> Vec<RawPoint> {
        match &self.template {
            Some(detector) => detector.detect(threshold),
            None => Vec::new(),
        }
    }

    fn detect_circles(&self, sensitivity: u32) -> Vec<RawPoint> {
        let Some(raster) = &self.raster else {
            return Vec::new();
        };
        let gray = self.gray.get_or_init(|| to_gray_bt601(raster));
        circles::detect_markers(gray, self.recentre_size, self.circles, sensitivity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn test_missing_raster_detects_nothing() {
        let template: RgbImage = ImageBuffer::from_pixel(4, 4, Rgb([0, 0, 0]));
        let config = CircleConfig::default();
        let detector = PageDetector::new(None, &template, (42, 42), &config);

        assert!(detector.detect_template(0.2).is_empty());
        assert!(detector.detect_circles(25).is_empty());
    }

    #[test]
    fn test_circle_fallback_recovers_count_on_raster() {
        use crate::calibration::config::PipelineConfig;
        use crate::calibration::{calibrate, DetectionMethod};

        // Two dark disks on one text line
        let centers = [(60.0f32, 150.0f32), (140.0, 152.0)];
        let raster: RgbImage = ImageBuffer::from_fn(200, 300, |x, y| {
            let inside = centers.iter().any(|&(cx, cy)| {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                (dx * dx + dy * dy).sqrt() <= 16.0
            });
            if inside { Rgb([30, 30, 30]) } else { Rgb([235, 235, 235]) }
        });
        // A flat template has no variance, so correlation never passes any threshold
        let template: RgbImage = ImageBuffer::from_pixel(42, 42, Rgb([120, 120, 120]));
        let config = PipelineConfig::default();
        let detector = PageDetector::new(Some(raster), &template, (42, 42), &config.circles);

        assert!(detector.detect_template(0.2).is_empty());
        let outcome = calibrate(&detector, 2, 0.2685, &config);

        assert!(outcome.exact);
        assert_eq!(outcome.method, DetectionMethod::Circles { sensitivity: 30 });
        assert_eq!(outcome.points.len(), 2);
        // Right disk first, both recentred by the 21 px half template
        assert!((outcome.points[0].x - 119).abs() <= 2, "{:?}", outcome.points);
        assert!((outcome.points[0].y - 131).abs() <= 2, "{:?}", outcome.points);
        assert!((outcome.points[1].x - 39).abs() <= 2, "{:?}", outcome.points);
        assert!((outcome.points[1].y - 129).abs() <= 2, "{:?}", outcome.points);
    }
}
