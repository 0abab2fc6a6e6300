//! Image preprocessing.
//!
//! Decodes, resizes and converts images into the CHW float layout the model
//! consumes. Pixel values are scaled to `[0, 1]`; the same scheme is used by
//! the training loader and the inference CLI, so exported models always see
//! the normalization they were trained with.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};

use leaf_core::{Error, Result};

/// Resizes an image to `width` x `height` and converts it to a flat CHW
/// `Vec<f32>` scaled to `[0, 1]`.
pub fn image_to_chw(image: &DynamicImage, width: u32, height: u32) -> Vec<f32> {
    let rgb = image
        .resize_exact(width, height, FilterType::Triangle)
        .to_rgb8();

    let (w, h) = (width as usize, height as usize);
    let mut chw = vec![0.0f32; 3 * h * w];

    for y in 0..h {
        for x in 0..w {
            let pixel = rgb.get_pixel(x as u32, y as u32);
            chw[y * w + x] = pixel[0] as f32 / 255.0;
            chw[h * w + y * w + x] = pixel[1] as f32 / 255.0;
            chw[2 * h * w + y * w + x] = pixel[2] as f32 / 255.0;
        }
    }

    chw
}

/// Loads an image from disk and preprocesses it.
pub fn load_chw(path: &Path, width: u32, height: u32) -> Result<Vec<f32>> {
    let image = ImageReader::open(path)
        .map_err(|e| Error::Image(format!("Failed to open {}: {e}", path.display())))?
        .decode()
        .map_err(|e| Error::Image(format!("Failed to decode {}: {e}", path.display())))?;

    Ok(image_to_chw(&image, width, height))
}
