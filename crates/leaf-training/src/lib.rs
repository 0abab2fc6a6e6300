//! Training infrastructure for the leaf disease pipeline.
//!
//! - `class_weights`: imbalance correction factors for the loss
//! - `trainer`: the epoch loop with checkpointing and early stopping
//! - `finetune`: the optional partially-unfrozen second phase
//! - `export`: full-precision and quantized artifacts plus the label file
//! - `pipeline`: the end-to-end driver tying everything together

pub mod class_weights;
pub mod export;
pub mod finetune;
pub mod pipeline;
pub mod trainer;

pub use class_weights::compute_class_weights;
pub use export::{export_model, write_labels, ExportPaths};
pub use finetune::run_fine_tuning;
pub use pipeline::{run, RunSummary};
pub use trainer::{fit, FitOptions, TrainingState};
