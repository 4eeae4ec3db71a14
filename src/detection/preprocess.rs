use anyhow::{Context, Result};
use image::{GrayImage, ImageBuffer, ImageReader, Luma, RgbImage};
use std::path::Path;

/// Loads a raster as 8-bit RGB.
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    let img = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .context(format!("Failed to open image: {}", path.display()))?
        .decode()
        .context(format!("Failed to decode image: {}", path.display()))?;
    Ok(img.to_rgb8())
}

/// Loads a page raster, treating an unreadable file as "no raster".
///
/// A missing page image is not fatal: the page simply yields zero
/// detections and surfaces as a count mismatch.
pub fn load_page_raster(path: &Path) -> Option<RgbImage> {
    match load_rgb(path) {
        Ok(img) => Some(img),
        Err(e) => {
            crate::log(&format!("Warning: {:#}", e));
            None
        }
    }
}

/// Converts RGB to grayscale using the ITU-R BT.601 luma formula.
///
/// Y = 0.299*R + 0.587*G + 0.114*B, rounded to the nearest integer.
pub fn to_gray_bt601(img: &RgbImage) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let r = pixel[0] as f32;
        let g = pixel[1] as f32;
        let b = pixel[2] as f32;
        let luma = (0.299 * r + 0.587 * g + 0.114 * b).round().clamp(0.0, 255.0);
        output.put_pixel(x, y, Luma([luma as u8]));
    }

    output
}
