//! Organized-dataset loader.
//!
//! Reads a directory of per-class image folders, derives the class list from
//! the sorted subdirectory names, splits samples deterministically and wires
//! up the training/validation datasets.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use leaf_core::{ImageSample, PipelineConfig, Result};

use crate::augment::AugmentationPipeline;
use crate::dataset::LeafDataset;
use crate::organize::ALLOWED_EXTENSIONS;
use crate::split::stratified_split;

/// The loaded dataset: both splits plus the ordered class names. The class
/// list is threaded explicitly; label `i` always means `class_names[i]`.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub train: LeafDataset,
    pub val: LeafDataset,
    pub class_names: Vec<String>,
}

impl LoadedDataset {
    /// Number of classes.
    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Combined statistics over both splits.
    pub fn stats(&self) -> DatasetStats {
        let k = self.num_classes();
        let train_counts = self.train.class_distribution(k);
        let val_counts = self.val.class_distribution(k);

        let class_counts: Vec<usize> = train_counts
            .iter()
            .zip(&val_counts)
            .map(|(t, v)| t + v)
            .collect();

        DatasetStats {
            total_samples: class_counts.iter().sum(),
            num_classes: k,
            class_counts,
            class_names: self.class_names.clone(),
        }
    }
}

/// Per-class statistics of a loaded dataset.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub total_samples: usize,
    pub num_classes: usize,
    pub class_counts: Vec<usize>,
    pub class_names: Vec<String>,
}

impl DatasetStats {
    /// Logs the class distribution.
    pub fn log(&self) {
        info!(
            "Dataset: {} samples across {} classes",
            self.total_samples, self.num_classes
        );
        for (name, count) in self.class_names.iter().zip(&self.class_counts) {
            info!("  {:40} {:5}", name, count);
        }
    }
}

/// Loads the organized dataset named by the configuration.
///
/// Returns `Ok(None)` when the data directory is missing or holds no class
/// subdirectories; the caller treats that as a fatal precondition.
pub fn load_dataset(config: &PipelineConfig) -> Result<Option<LoadedDataset>> {
    let data_dir = &config.paths.data_dir;

    if !data_dir.exists() {
        warn!("Data directory not found: {}", data_dir.display());
        return Ok(None);
    }

    let class_names = discover_classes(data_dir)?;
    if class_names.is_empty() {
        warn!("No class folders found in {}", data_dir.display());
        return Ok(None);
    }

    info!(
        "Auto-detected {} classes: {:?}",
        class_names.len(),
        class_names
    );

    let mut samples = Vec::new();
    for (label, class_name) in class_names.iter().enumerate() {
        let class_dir = data_dir.join(class_name);
        for path in list_class_images(&class_dir)? {
            samples.push(ImageSample::new(path, label, class_name.clone()));
        }
    }

    let split = stratified_split(
        samples,
        config.training.validation_split,
        config.training.seed,
    );

    info!(
        "Split: {} training / {} validation samples",
        split.train.len(),
        split.val.len()
    );

    let width = config.model.width() as u32;
    let height = config.model.height() as u32;

    let train = LeafDataset::new(
        split.train,
        width,
        height,
        Some(AugmentationPipeline::new(config.augmentation.clone())),
    );
    let val = LeafDataset::new(split.val, width, height, None);

    Ok(Some(LoadedDataset {
        train,
        val,
        class_names,
    }))
}

/// Lists the immediate subdirectory names of the data directory in
/// lexicographic order; this order defines the label indices.
fn discover_classes(data_dir: &Path) -> Result<Vec<String>> {
    let mut class_names = Vec::new();

    for entry in fs::read_dir(data_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                class_names.push(name.to_string());
            }
        }
    }

    class_names.sort();
    Ok(class_names)
}

/// Lists image files directly inside a class directory.
fn list_class_images(class_dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    let mut images = Vec::new();

    for entry in fs::read_dir(class_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let allowed = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let ext = e.to_lowercase();
                ALLOWED_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false);

        if allowed {
            images.push(path);
        }
    }

    images.sort();
    Ok(images)
}
