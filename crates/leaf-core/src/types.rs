//! Core type definitions shared across the pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An image file with its label and class name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSample {
    /// Path to the image file
    pub path: PathBuf,
    /// Class label (index into the sorted class-name list)
    pub label: usize,
    /// Class name (e.g., "Mandua_blast")
    pub class_name: String,
}

impl ImageSample {
    /// Creates a new image sample.
    pub fn new(path: PathBuf, label: usize, class_name: impl Into<String>) -> Self {
        Self {
            path,
            label,
            class_name: class_name.into(),
        }
    }
}

/// Data split type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataSplit {
    /// Training data (augmented)
    Train,
    /// Validation data
    Validation,
}

impl std::fmt::Display for DataSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSplit::Train => write!(f, "train"),
            DataSplit::Validation => write!(f, "validation"),
        }
    }
}

/// Image dimensions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageDimensions {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of channels (3 for RGB)
    pub channels: u32,
}

impl ImageDimensions {
    /// Creates new image dimensions.
    pub fn new(width: u32, height: u32, channels: u32) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    /// Standard ImageNet dimensions (224x224x3).
    pub fn imagenet() -> Self {
        Self::new(224, 224, 3)
    }

    /// Total number of values per image.
    pub fn total_pixels(&self) -> u32 {
        self.width * self.height * self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_sample() {
        let sample = ImageSample::new(PathBuf::from("test.jpg"), 0, "Mandua_blast");
        assert_eq!(sample.label, 0);
        assert_eq!(sample.class_name, "Mandua_blast");
    }

    #[test]
    fn test_data_split_display() {
        assert_eq!(DataSplit::Train.to_string(), "train");
        assert_eq!(DataSplit::Validation.to_string(), "validation");
    }

    #[test]
    fn test_image_dimensions() {
        let dims = ImageDimensions::imagenet();
        assert_eq!(dims.width, 224);
        assert_eq!(dims.height, 224);
        assert_eq!(dims.channels, 3);
        assert_eq!(dims.total_pixels(), 224 * 224 * 3);
    }
}
