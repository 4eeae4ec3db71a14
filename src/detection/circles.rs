//! Circle-shape fallback detection.
//!
//! Edge pixels vote along their gradient direction at every radius in the
//! configured band. Verse markers are round, so votes from their outline
//! converge on the glyph center. Used only when template correlation
//! cannot reach the expected marker count.

use image::GrayImage;

use crate::calibration::config::CircleConfig;
use crate::coords::RawPoint;
use crate::detection::clustering::group_and_sort;

/// Gaussian sigma used by `imageproc::edges::canny`.
const EDGE_SIGMA: f32 = 1.4;

/// A detected circle in page pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
}

/// Runs gradient-voting circle detection on a grayscale page.
///
/// `sensitivity` is the minimum accumulator votes for a center and the
/// minimum edge support for its radius. Lower values find more circles.
pub fn find_circles(gray: &GrayImage, config: &CircleConfig, sensitivity: u32) -> Vec<Circle> {
    let (w, h) = gray.dimensions();
    if w < 3 || h < 3 || config.max_radius < config.min_radius {
        return Vec::new();
    }

    let edges = imageproc::edges::canny(gray, config.edge_threshold / 2.0, config.edge_threshold);
    // Gradient directions from the same smoothing canny applies; raw 3x3
    // Sobel on a rasterized outline scatters the votes.
    let smoothed = imageproc::filter::gaussian_blur_f32(gray, EDGE_SIGMA);
    let gx = imageproc::gradients::horizontal_sobel(&smoothed);
    let gy = imageproc::gradients::vertical_sobel(&smoothed);

    let stride = w as usize;
    let mut accum = vec![0u32; stride * h as usize];
    let mut edge_points: Vec<(i32, i32)> = Vec::new();

    for (x, y, px) in edges.enumerate_pixels() {
        if px[0] == 0 {
            continue;
        }
        edge_points.push((x as i32, y as i32));

        let dx = gx.get_pixel(x, y)[0] as f32;
        let dy = gy.get_pixel(x, y)[0] as f32;
        let mag = (dx * dx + dy * dy).sqrt();
        if mag < 1e-3 {
            continue;
        }
        let (ux, uy) = (dx / mag, dy / mag);

        for r in config.min_radius..=config.max_radius {
            let r = r as f32;
            for sign in [1.0f32, -1.0] {
                let vx = (x as f32 + sign * ux * r).round();
                let vy = (y as f32 + sign * uy * r).round();
                if vx >= 0.0 && vy >= 0.0 && vx < w as f32 && vy < h as f32 {
                    accum[vy as usize * stride + vx as usize] += 1;
                }
            }
        }
    }

    // Local maxima: strictly above left/up, at least right/down
    let mut centers: Vec<(usize, usize, u32)> = Vec::new();
    for y in 1..h as usize - 1 {
        for x in 1..stride - 1 {
            let idx = y * stride + x;
            let v = accum[idx];
            if v > sensitivity
                && v > accum[idx - 1]
                && v >= accum[idx + 1]
                && v > accum[idx - stride]
                && v >= accum[idx + stride]
            {
                centers.push((x, y, v));
            }
        }
    }
    centers.sort_by(|a, b| b.2.cmp(&a.2));

    let min_dist_sq = config.min_distance * config.min_distance;
    let r_min_sq = (config.min_radius * config.min_radius) as f32;
    let r_max_sq = (config.max_radius * config.max_radius) as f32;
    let band = (config.max_radius - config.min_radius + 1) as usize;
    let mut circles: Vec<Circle> = Vec::new();

    for (x, y, _) in centers {
        let (cx, cy) = (x as f32, y as f32);
        let too_close = circles.iter().any(|c| {
            let dx = c.cx - cx;
            let dy = c.cy - cy;
            dx * dx + dy * dy < min_dist_sq
        });
        if too_close {
            continue;
        }

        // Radius with the most supporting edge pixels
        let mut support = vec![0u32; band];
        for &(ex, ey) in &edge_points {
            let dx = ex as f32 - cx;
            let dy = ey as f32 - cy;
            let d_sq = dx * dx + dy * dy;
            if d_sq < r_min_sq || d_sq > r_max_sq {
                continue;
            }
            let r = d_sq.sqrt().round() as u32;
            if (config.min_radius..=config.max_radius).contains(&r) {
                support[(r - config.min_radius) as usize] += 1;
            }
        }
        let Some((best, &count)) = support.iter().enumerate().max_by_key(|&(i, c)| (*c, i))
        else {
            continue;
        };
        if count <= sensitivity {
            continue;
        }

        circles.push(Circle {
            cx,
            cy,
            radius: (config.min_radius + best as u32) as f32,
        });
    }

    circles
}

/// Fallback marker detector: circles filtered to the text block, recentred
/// to template top-left coordinates and ordered for reading.
pub fn detect_markers(
    gray: &GrayImage,
    template_size: (u32, u32),
    config: &CircleConfig,
    sensitivity: u32,
) -> Vec<RawPoint> {
    let height = gray.height() as f32;
    let (tw, th) = template_size;
    let top = config.top_margin as f32;
    let bottom = height - config.bottom_margin as f32;
    let r_range = config.min_radius as f32..=config.max_radius as f32;

    let good: Vec<RawPoint> = find_circles(gray, config, sensitivity)
        .into_iter()
        .filter(|c| c.cy > top && c.cy < bottom && r_range.contains(&c.radius))
        .map(|c| RawPoint::new(c.cx as i32 - (tw / 2) as i32, c.cy as i32 - (th / 2) as i32))
        .collect();

    group_and_sort(&good, th as f64 / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn draw_disks(w: u32, h: u32, centers: &[(f32, f32)], radius: f32) -> GrayImage {
        ImageBuffer::from_fn(w, h, |x, y| {
            let inside = centers.iter().any(|&(cx, cy)| {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                (dx * dx + dy * dy).sqrt() <= radius
            });
            if inside { Luma([30u8]) } else { Luma([235u8]) }
        })
    }

    #[test]
    fn test_finds_single_disk() {
        let config = CircleConfig::default();
        let img = draw_disks(120, 120, &[(60.0, 60.0)], 16.0);

        let circles = find_circles(&img, &config, 30);

        assert!(!circles.is_empty());
        let best = circles[0];
        assert!((best.cx - 60.0).abs() <= 2.0, "cx = {}", best.cx);
        assert!((best.cy - 60.0).abs() <= 2.0, "cy = {}", best.cy);
        assert!((best.radius - 16.0).abs() <= 2.0, "r = {}", best.radius);
    }

    #[test]
    fn test_disk_found_at_every_configured_sensitivity() {
        let config = CircleConfig::default();
        let img = draw_disks(120, 120, &[(60.0, 60.0)], 16.0);

        for &sensitivity in &config.sensitivities {
            let circles = find_circles(&img, &config, sensitivity);
            assert_eq!(circles.len(), 1, "sensitivity {}", sensitivity);
            assert!((circles[0].cy - 60.0).abs() <= 1.0, "cy = {}", circles[0].cy);
        }
    }

    #[test]
    fn test_blank_image_has_no_circles() {
        let config = CircleConfig::default();
        let img: GrayImage = ImageBuffer::from_pixel(100, 100, Luma([200]));
        assert!(find_circles(&img, &config, 25).is_empty());
    }

    #[test]
    fn test_margins_exclude_frame_circles() {
        let config = CircleConfig::default();
        // One disk inside the top margin, one inside the text block
        let img = draw_disks(200, 300, &[(100.0, 25.0), (100.0, 150.0)], 16.0);

        let markers = detect_markers(&img, (42, 42), &config, 30);

        assert_eq!(markers.len(), 1);
        // Recentred by template half size
        assert!((markers[0].x - 79).abs() <= 2);
        assert!((markers[0].y - 129).abs() <= 2);
    }

    #[test]
    fn test_small_blobs_outside_radius_band() {
        let config = CircleConfig::default();
        let img = draw_disks(120, 120, &[(60.0, 60.0)], 4.0);
        assert!(detect_markers(&img, (42, 42), &config, 30).is_empty());
    }
}
