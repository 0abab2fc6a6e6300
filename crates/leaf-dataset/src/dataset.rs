//! Burn dataset integration.
//!
//! `LeafDataset` lazily decodes images on demand; the training variant runs
//! every sample through the augmentation pipeline on each access, so
//! augmentations are re-sampled per epoch rather than cached. `LeafBatcher`
//! stacks preprocessed items into batched tensors.

use std::path::PathBuf;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;

use leaf_core::ImageSample;

use crate::augment::AugmentationPipeline;
use crate::preprocess;

/// A single preprocessed sample ready for batching.
#[derive(Clone, Debug)]
pub struct LeafItem {
    /// Image data as a flattened CHW float array `[3 * H * W]`, in `[0, 1]`
    pub image: Vec<f32>,
    /// Class label
    pub label: usize,
    /// Source path, kept for debugging
    pub path: PathBuf,
}

/// Lazily-decoding dataset over organized image samples.
#[derive(Debug, Clone)]
pub struct LeafDataset {
    samples: Vec<ImageSample>,
    width: u32,
    height: u32,
    augmentation: Option<AugmentationPipeline>,
}

impl LeafDataset {
    /// Creates a dataset; pass an augmentation pipeline for the training
    /// split only.
    pub fn new(
        samples: Vec<ImageSample>,
        width: u32,
        height: u32,
        augmentation: Option<AugmentationPipeline>,
    ) -> Self {
        Self {
            samples,
            width,
            height,
            augmentation,
        }
    }

    /// The raw samples backing this dataset.
    pub fn samples(&self) -> &[ImageSample] {
        &self.samples
    }

    /// Target spatial size as (width, height).
    pub fn image_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Per-class sample counts.
    pub fn class_distribution(&self, num_classes: usize) -> Vec<usize> {
        let mut counts = vec![0usize; num_classes];
        for sample in &self.samples {
            if sample.label < num_classes {
                counts[sample.label] += 1;
            }
        }
        counts
    }
}

impl Dataset<LeafItem> for LeafDataset {
    fn get(&self, index: usize) -> Option<LeafItem> {
        let sample = self.samples.get(index)?;

        // A decode failure is a hard failure for the batch; skipping images
        // here would silently shrink the dataset.
        let image = image::open(&sample.path)
            .unwrap_or_else(|e| panic!("Failed to decode image {}: {e}", sample.path.display()));

        let image = match &self.augmentation {
            Some(pipeline) => pipeline.augment(&image),
            None => image,
        };

        Some(LeafItem {
            image: preprocess::image_to_chw(&image, self.width, self.height),
            label: sample.label,
            path: sample.path.clone(),
        })
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// A batch of images and integer labels.
#[derive(Clone, Debug)]
pub struct LeafBatch<B: Backend> {
    /// Images with shape `[batch_size, 3, height, width]`
    pub images: Tensor<B, 4>,
    /// Labels with shape `[batch_size]`
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher stacking preprocessed items into tensors on a device.
#[derive(Clone, Debug)]
pub struct LeafBatcher<B: Backend> {
    device: B::Device,
    width: usize,
    height: usize,
}

impl<B: Backend> LeafBatcher<B> {
    /// Creates a batcher for the given device and image size.
    pub fn new(device: B::Device, width: u32, height: u32) -> Self {
        Self {
            device,
            width: width as usize,
            height: height as usize,
        }
    }
}

impl<B: Backend> Batcher<LeafItem, LeafBatch<B>> for LeafBatcher<B> {
    fn batch(&self, items: Vec<LeafItem>) -> LeafBatch<B> {
        let batch_size = items.len();

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.clone()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, 3, self.height, self.width]),
            &self.device,
        );

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(targets_data, [batch_size]),
            &self.device,
        );

        LeafBatch { images, targets }
    }
}
