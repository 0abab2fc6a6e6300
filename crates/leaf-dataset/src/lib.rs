//! Dataset handling for the leaf disease training pipeline.
//!
//! This crate covers the data path from a raw, messy photo dump to batched
//! training tensors:
//!
//! - `organize`: copies class-bearing leaf folders of a raw tree into a flat
//!   `{Crop}_{Disease}` directory layout
//! - `loader`: discovers classes and samples in an organized directory
//! - `split`: deterministic per-class train/validation splitting
//! - `augment`: stochastic augmentation for the training split
//! - `preprocess`: decode, resize and normalize into CHW float data
//! - `dataset`: Burn `Dataset`/`Batcher` integration

pub mod augment;
pub mod dataset;
pub mod loader;
pub mod organize;
pub mod preprocess;
pub mod split;

pub use augment::AugmentationPipeline;
pub use dataset::{LeafBatch, LeafBatcher, LeafDataset, LeafItem};
pub use loader::{load_dataset, DatasetStats, LoadedDataset};
pub use organize::{
    derive_class_label, organize, sanitize_name, ClassLabel, LabelError, OrganizeOptions,
    OrganizeOutcome, OrganizeStats,
};
pub use split::stratified_split;
