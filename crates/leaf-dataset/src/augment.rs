//! Stochastic augmentation for the training split.
//!
//! Every transform re-samples its parameters per call, so an image seen in
//! two epochs goes through two independent augmentations. The validation
//! split never passes through this pipeline.

use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};
use rand::Rng;

use leaf_core::AugmentationSection;

/// Augmentation pipeline configured from the `[augmentation]` section.
#[derive(Debug, Clone)]
pub struct AugmentationPipeline {
    config: AugmentationSection,
}

impl AugmentationPipeline {
    /// Creates a pipeline with the given configuration.
    pub fn new(config: AugmentationSection) -> Self {
        Self { config }
    }

    /// Applies one randomly sampled augmentation pass to an image.
    pub fn augment(&self, image: &DynamicImage) -> DynamicImage {
        let mut rng = rand::thread_rng();
        let mut augmented = image.to_rgb8();

        if self.config.horizontal_flip && rng.gen_bool(0.5) {
            augmented = image::imageops::flip_horizontal(&augmented);
        }

        if self.config.rotation_range > 0.0 {
            let max_degrees = self.config.rotation_range * 360.0;
            let angle = rng.gen_range(-max_degrees..=max_degrees);
            if angle.abs() > 0.1 {
                augmented = rotate(&augmented, angle);
            }
        }

        if self.config.zoom_range > 0.0 {
            let factor = rng.gen_range(1.0..=1.0 + self.config.zoom_range);
            augmented = zoom(&augmented, factor, &mut rng);
        }

        if self.config.brightness_range != (1.0, 1.0) {
            let factor =
                rng.gen_range(self.config.brightness_range.0..=self.config.brightness_range.1);
            augmented = adjust_brightness(&augmented, factor);
        }

        if self.config.contrast_range != (1.0, 1.0) {
            let factor =
                rng.gen_range(self.config.contrast_range.0..=self.config.contrast_range.1);
            augmented = adjust_contrast(&augmented, factor);
        }

        DynamicImage::ImageRgb8(augmented)
    }
}

/// Rotates an image about its center by `angle` degrees, sampling the
/// nearest source pixel and clamping to the image border.
fn rotate(image: &RgbImage, angle: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let (sin, cos) = angle.to_radians().sin_cos();

    ImageBuffer::from_fn(width, height, |x, y| {
        // Inverse mapping into the source image.
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let src_x = (cos * dx + sin * dy + cx).round();
        let src_y = (-sin * dx + cos * dy + cy).round();

        let src_x = src_x.clamp(0.0, (width - 1) as f32) as u32;
        let src_y = src_y.clamp(0.0, (height - 1) as f32) as u32;
        *image.get_pixel(src_x, src_y)
    })
}

/// Zooms into an image by cropping a `1/factor` window at a random offset
/// and resizing it back to the original dimensions.
fn zoom(image: &RgbImage, factor: f32, rng: &mut impl Rng) -> RgbImage {
    let (width, height) = image.dimensions();

    let crop_width = (width as f32 / factor) as u32;
    let crop_height = (height as f32 / factor) as u32;

    if crop_width == 0 || crop_height == 0 || crop_width >= width || crop_height >= height {
        return image.clone();
    }

    let x = rng.gen_range(0..=(width - crop_width));
    let y = rng.gen_range(0..=(height - crop_height));

    let cropped = DynamicImage::ImageRgb8(image.clone()).crop_imm(x, y, crop_width, crop_height);
    cropped
        .resize_exact(width, height, image::imageops::FilterType::Triangle)
        .to_rgb8()
}

/// Scales pixel intensities by `factor`.
fn adjust_brightness(image: &RgbImage, factor: f32) -> RgbImage {
    let (width, height) = image.dimensions();

    ImageBuffer::from_fn(width, height, |x, y| {
        let pixel = image.get_pixel(x, y);
        Rgb([
            (pixel[0] as f32 * factor).clamp(0.0, 255.0) as u8,
            (pixel[1] as f32 * factor).clamp(0.0, 255.0) as u8,
            (pixel[2] as f32 * factor).clamp(0.0, 255.0) as u8,
        ])
    })
}

/// Stretches intensities around the image mean by `factor`.
fn adjust_contrast(image: &RgbImage, factor: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    let total_pixels = (width * height) as f32;

    let mut sum = 0.0;
    for pixel in image.pixels() {
        sum += (pixel[0] as f32 + pixel[1] as f32 + pixel[2] as f32) / 3.0;
    }
    let mean = sum / total_pixels;

    ImageBuffer::from_fn(width, height, |x, y| {
        let pixel = image.get_pixel(x, y);
        Rgb([
            (mean + factor * (pixel[0] as f32 - mean)).clamp(0.0, 255.0) as u8,
            (mean + factor * (pixel[1] as f32 - mean)).clamp(0.0, 255.0) as u8,
            (mean + factor * (pixel[2] as f32 - mean)).clamp(0.0, 255.0) as u8,
        ])
    })
}
