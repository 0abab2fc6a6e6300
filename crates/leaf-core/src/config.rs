//! Pipeline configuration.
//!
//! The configuration is a nested TOML document deserialized into typed
//! structs and validated eagerly at load time, so a malformed or incomplete
//! file fails before any expensive work starts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level pipeline configuration, loaded once per run and treated as
/// immutable for the run's duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Model configuration
    pub model: ModelSection,
    /// Training hyperparameters
    pub training: TrainingSection,
    /// Augmentation ranges for the training split
    pub augmentation: AugmentationSection,
    /// Fine-tuning phase configuration
    pub fine_tuning: FineTuningSection,
    /// Input/output paths
    pub paths: PathsSection,
}

impl PipelineConfig {
    /// Loads and validates a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config {}: {e}", path.display())))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config {}: {e}", path.display())))?;

        config.validate()?;
        Ok(config)
    }

    /// Validates all sections, failing fast on out-of-range values.
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        self.training.validate()?;
        self.augmentation.validate()?;
        self.fine_tuning.validate()?;
        Ok(())
    }
}

/// Model section: backbone resolution, width multiplier, weights and head
/// dropout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSection {
    /// Input shape as [height, width, channels]
    pub input_shape: [usize; 3],
    /// Backbone width multiplier
    pub alpha: f64,
    /// Pretrained backbone weights: a record file path, or "random" for
    /// random initialization
    pub weights: String,
    /// Dropout rate of the classification head
    pub dropout: f64,
}

impl ModelSection {
    /// Path to the pretrained backbone record, if one is configured.
    pub fn pretrained_weights(&self) -> Option<PathBuf> {
        match self.weights.as_str() {
            "" | "random" | "none" => None,
            path => Some(PathBuf::from(path)),
        }
    }

    /// Input height in pixels.
    pub fn height(&self) -> usize {
        self.input_shape[0]
    }

    /// Input width in pixels.
    pub fn width(&self) -> usize {
        self.input_shape[1]
    }

    fn validate(&self) -> Result<()> {
        if self.input_shape[2] != 3 {
            return Err(Error::Config(format!(
                "model.input_shape expects 3 channels, got {}",
                self.input_shape[2]
            )));
        }
        // The backbone downsamples by a factor of 32.
        if self.input_shape[0] < 32 || self.input_shape[1] < 32 {
            return Err(Error::Config(
                "model.input_shape spatial dimensions must be at least 32".to_string(),
            ));
        }
        if self.alpha <= 0.0 {
            return Err(Error::Config(format!(
                "model.alpha must be positive, got {}",
                self.alpha
            )));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(Error::Config(format!(
                "model.dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }
}

/// Training section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSection {
    /// Batch size
    pub batch_size: usize,
    /// Fraction of each class held out for validation
    pub validation_split: f64,
    /// Number of initial-phase epochs
    pub epochs: usize,
    /// Initial-phase learning rate
    pub learning_rate: f64,
    /// Seed for the deterministic split shuffle and epoch shuffling
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Early stopping patience in epochs; `None` disables early stopping
    #[serde(default = "default_patience")]
    pub early_stopping_patience: Option<usize>,
    /// Worker threads for the data loader
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
}

fn default_seed() -> u64 {
    123
}

fn default_patience() -> Option<usize> {
    Some(3)
}

fn default_num_workers() -> usize {
    4
}

impl TrainingSection {
    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("training.batch_size must be greater than 0".to_string()));
        }
        if self.epochs == 0 {
            return Err(Error::Config("training.epochs must be greater than 0".to_string()));
        }
        if self.learning_rate <= 0.0 {
            return Err(Error::Config(format!(
                "training.learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.validation_split) || self.validation_split == 0.0 {
            return Err(Error::Config(format!(
                "training.validation_split must be in (0, 1), got {}",
                self.validation_split
            )));
        }
        if self.num_workers == 0 {
            return Err(Error::Config("training.num_workers must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Augmentation section. Ranges follow the conventions of the original
/// pipeline: rotation and zoom are fractional ranges, brightness and
/// contrast are multiplicative factor intervals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentationSection {
    /// Rotation range as a fraction of a full turn (0.1 = +/- 36 degrees)
    pub rotation_range: f32,
    /// Zoom range as a fraction (0.1 = up to 10% zoom-in)
    pub zoom_range: f32,
    /// Brightness factor interval
    #[serde(default = "default_jitter_range")]
    pub brightness_range: (f32, f32),
    /// Contrast factor interval
    #[serde(default = "default_jitter_range")]
    pub contrast_range: (f32, f32),
    /// Horizontal flip with 50% probability
    #[serde(default = "default_true")]
    pub horizontal_flip: bool,
}

fn default_jitter_range() -> (f32, f32) {
    (0.9, 1.1)
}

fn default_true() -> bool {
    true
}

impl AugmentationSection {
    fn validate(&self) -> Result<()> {
        if self.rotation_range < 0.0 || self.rotation_range > 0.5 {
            return Err(Error::Config(format!(
                "augmentation.rotation_range must be in [0, 0.5], got {}",
                self.rotation_range
            )));
        }
        if self.zoom_range < 0.0 || self.zoom_range >= 1.0 {
            return Err(Error::Config(format!(
                "augmentation.zoom_range must be in [0, 1), got {}",
                self.zoom_range
            )));
        }
        for (name, range) in [
            ("brightness_range", self.brightness_range),
            ("contrast_range", self.contrast_range),
        ] {
            if range.0 <= 0.0 || range.1 < range.0 {
                return Err(Error::Config(format!(
                    "augmentation.{name} must be a non-empty positive interval, got {range:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Fine-tuning section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FineTuningSection {
    /// Whether the fine-tuning phase runs at all
    pub enabled: bool,
    /// Backbone layer index below which layers stay frozen
    pub unfreeze_from_layer: usize,
    /// Fine-tuning learning rate (lower than the initial phase)
    pub learning_rate: f64,
    /// Number of additional fine-tuning epochs
    pub epochs: usize,
}

impl FineTuningSection {
    fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.learning_rate <= 0.0 {
            return Err(Error::Config(format!(
                "fine_tuning.learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.epochs == 0 {
            return Err(Error::Config(
                "fine_tuning.epochs must be greater than 0 when fine-tuning is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

/// Paths section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsSection {
    /// Organized dataset directory (one subdirectory per class)
    pub data_dir: PathBuf,
    /// Directory receiving the exported artifacts
    pub output_dir: PathBuf,
}
