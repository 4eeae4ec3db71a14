//! Template correlation marker detection.
//!
//! Computes a normalized correlation-coefficient map between a page raster
//! and the reference marker glyph, then thresholds, suppresses duplicates
//! and orders the surviving locations.

use image::RgbImage;

use crate::coords::RawPoint;
use crate::detection::clustering::group_and_sort;

/// Per-location correlation scores in [-1, 1].
///
/// Location (x, y) scores the template placed with its top-left at (x, y).
#[derive(Debug, Clone)]
pub struct CorrelationMap {
    width: u32,
    height: u32,
    scores: Vec<f32>,
}

impl CorrelationMap {
    #[cfg(test)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[cfg(test)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[cfg(test)]
    pub fn score(&self, x: u32, y: u32) -> f32 {
        self.scores[(y * self.width + x) as usize]
    }

    /// Locations scoring at or above `threshold`, in row-major scan order.
    pub fn locations_above(&self, threshold: f32) -> Vec<RawPoint> {
        let mut out = Vec::new();
        for y in 0..self.height {
            let row = &self.scores[(y * self.width) as usize..((y + 1) * self.width) as usize];
            for (x, &s) in row.iter().enumerate() {
                if s >= threshold {
                    out.push(RawPoint::new(x as i32, y as i32));
                }
            }
        }
        out
    }
}

/// Summed-area table over one channel, with a zero border row/column.
struct Integral {
    stride: usize,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl Integral {
    fn new(img: &RgbImage, channel: usize) -> Self {
        let (w, h) = img.dimensions();
        let stride = w as usize + 1;
        let mut sum = vec![0.0; stride * (h as usize + 1)];
        let mut sum_sq = vec![0.0; stride * (h as usize + 1)];

        for y in 0..h as usize {
            let mut row_sum = 0.0;
            let mut row_sq = 0.0;
            for x in 0..w as usize {
                let v = img.get_pixel(x as u32, y as u32)[channel] as f64;
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + x + 1;
                sum[idx] = sum[idx - stride] + row_sum;
                sum_sq[idx] = sum_sq[idx - stride] + row_sq;
            }
        }

        Self { stride, sum, sum_sq }
    }

    /// (sum, sum of squares) over the `w`×`h` window at (x, y).
    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let s = self.stride;
        let a = y * s + x;
        let b = y * s + x + w;
        let c = (y + h) * s + x;
        let d = (y + h) * s + x + w;
        (
            self.sum[d] - self.sum[b] - self.sum[c] + self.sum[a],
            self.sum_sq[d] - self.sum_sq[b] - self.sum_sq[c] + self.sum_sq[a],
        )
    }
}

/// Computes the normalized correlation-coefficient map over all three
/// channels jointly.
///
/// Returns an empty map when the template does not fit inside the image.
pub fn match_template(image: &RgbImage, template: &RgbImage) -> CorrelationMap {
    let (iw, ih) = image.dimensions();
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 || tw > iw || th > ih {
        return CorrelationMap {
            width: 0,
            height: 0,
            scores: Vec::new(),
        };
    }

    let out_w = iw - tw + 1;
    let out_h = ih - th + 1;
    let n = (tw * th) as f64;

    // Zero-mean template planes; sum(T') == 0 lets the numerator skip the
    // window mean entirely.
    let mut planes: Vec<Vec<f32>> = Vec::with_capacity(3);
    let mut template_norm = 0.0f64;
    for c in 0..3 {
        let mean = template.pixels().map(|p| p[c] as f64).sum::<f64>() / n;
        let plane: Vec<f32> = template.pixels().map(|p| (p[c] as f64 - mean) as f32).collect();
        template_norm += plane.iter().map(|&v| (v as f64) * (v as f64)).sum::<f64>();
        planes.push(plane);
    }

    let integrals: Vec<Integral> = (0..3).map(|c| Integral::new(image, c)).collect();

    // Channel-separated image planes for contiguous row access
    let image_planes: Vec<Vec<f32>> = (0..3)
        .map(|c| image.pixels().map(|p| p[c] as f32).collect())
        .collect();

    let (iw_us, tw_us, th_us) = (iw as usize, tw as usize, th as usize);
    let mut scores = vec![0.0f32; (out_w * out_h) as usize];

    for y in 0..out_h as usize {
        for x in 0..out_w as usize {
            let mut numerator = 0.0f64;
            let mut window_var = 0.0f64;

            for c in 0..3 {
                let img = &image_planes[c];
                let tpl = &planes[c];
                let mut acc = 0.0f32;
                for ty in 0..th_us {
                    let img_row = &img[(y + ty) * iw_us + x..(y + ty) * iw_us + x + tw_us];
                    let tpl_row = &tpl[ty * tw_us..(ty + 1) * tw_us];
                    acc += img_row
                        .iter()
                        .zip(tpl_row)
                        .map(|(&a, &b)| a * b)
                        .sum::<f32>();
                }
                numerator += acc as f64;

                let (s, sq) = integrals[c].window(x, y, tw_us, th_us);
                window_var += (sq - s * s / n).max(0.0);
            }

            let denom = (window_var * template_norm).sqrt();
            scores[y * out_w as usize + x] = if denom > f64::EPSILON {
                (numerator / denom).clamp(-1.0, 1.0) as f32
            } else {
                0.0
            };
        }
    }

    CorrelationMap {
        width: out_w,
        height: out_h,
        scores,
    }
}

/// Greedy distance suppression.
///
/// Visits candidates in order and keeps one only if it is at least
/// `min_distance` away from every point kept so far.
pub fn suppress_near_duplicates(candidates: &[RawPoint], min_distance: u32) -> Vec<RawPoint> {
    let min_sq = (min_distance as i64) * (min_distance as i64);
    let mut kept: Vec<RawPoint> = Vec::new();

    for &candidate in candidates {
        if kept.iter().all(|k| k.distance_sq(candidate) >= min_sq) {
            kept.push(candidate);
        }
    }

    kept
}

/// Marker detector bound to one page's correlation map.
///
/// The map is computed once; each threshold is a cheap re-scan.
pub struct TemplateDetector {
    map: CorrelationMap,
    template_size: (u32, u32),
}

impl TemplateDetector {
    pub fn new(page: &RgbImage, template: &RgbImage) -> Self {
        Self {
            map: match_template(page, template),
            template_size: template.dimensions(),
        }
    }

    /// Ordered markers (raw pixel space) at correlation threshold `threshold`.
    pub fn detect(&self, threshold: f32) -> Vec<RawPoint> {
        let (tw, th) = self.template_size;
        let candidates = self.map.locations_above(threshold);
        let distinct = suppress_near_duplicates(&candidates, tw.max(th));
        group_and_sort(&distinct, th as f64 / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    /// A ring-shaped glyph on white, roughly what the verse marker looks like.
    fn glyph(size: u32) -> RgbImage {
        let c = (size as f32 - 1.0) / 2.0;
        ImageBuffer::from_fn(size, size, |x, y| {
            let d = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2)).sqrt();
            if d > c * 0.55 && d < c * 0.9 {
                Rgb([20, 90, 40])
            } else {
                Rgb([250, 250, 245])
            }
        })
    }

    fn page_with_glyphs(w: u32, h: u32, tpl: &RgbImage, at: &[(u32, u32)]) -> RgbImage {
        let mut page: RgbImage = ImageBuffer::from_pixel(w, h, Rgb([250, 250, 245]));
        for &(ox, oy) in at {
            image::imageops::replace(&mut page, tpl, ox as i64, oy as i64);
        }
        page
    }

    #[test]
    fn test_exact_match_scores_one() {
        let tpl = glyph(12);
        let page = page_with_glyphs(40, 30, &tpl, &[(10, 7)]);
        let map = match_template(&page, &tpl);

        assert_eq!(map.width(), 29);
        assert_eq!(map.height(), 19);
        assert!((map.score(10, 7) - 1.0).abs() < 1e-4);
        assert!(map.score(0, 0) < 0.5);
    }

    #[test]
    fn test_flat_window_scores_zero() {
        let tpl = glyph(8);
        let page: RgbImage = ImageBuffer::from_pixel(20, 20, Rgb([128, 128, 128]));
        let map = match_template(&page, &tpl);
        assert_eq!(map.score(5, 5), 0.0);
    }

    #[test]
    fn test_template_larger_than_image() {
        let tpl = glyph(16);
        let page: RgbImage = ImageBuffer::new(10, 10);
        let map = match_template(&page, &tpl);
        assert_eq!(map.width(), 0);
        assert!(map.locations_above(0.0).is_empty());
    }

    #[test]
    fn test_suppression_collapses_clusters() {
        let candidates = vec![
            RawPoint::new(10, 10),
            RawPoint::new(11, 10),
            RawPoint::new(10, 11),
            RawPoint::new(60, 10),
            RawPoint::new(61, 11),
        ];
        let kept = suppress_near_duplicates(&candidates, 42);
        assert_eq!(kept, vec![RawPoint::new(10, 10), RawPoint::new(60, 10)]);
    }

    #[test]
    fn test_suppression_distance_is_inclusive() {
        let candidates = vec![RawPoint::new(0, 0), RawPoint::new(42, 0)];
        assert_eq!(suppress_near_duplicates(&candidates, 42).len(), 2);
    }

    #[test]
    fn test_detector_finds_glyphs_in_reading_order() {
        let tpl = glyph(12);
        // Two lines: right glyph first on each line
        let page = page_with_glyphs(120, 80, &tpl, &[(10, 10), (80, 12), (40, 50)]);
        let detector = TemplateDetector::new(&page, &tpl);

        let found = detector.detect(0.99);
        assert_eq!(
            found,
            vec![RawPoint::new(80, 12), RawPoint::new(10, 10), RawPoint::new(40, 50)]
        );
    }

    #[test]
    fn test_higher_threshold_never_finds_more() {
        let tpl = glyph(12);
        let page = page_with_glyphs(120, 80, &tpl, &[(10, 10), (80, 12), (40, 50)]);
        let detector = TemplateDetector::new(&page, &tpl);

        assert!(detector.detect(0.99).len() <= detector.detect(0.3).len());
    }
}
