//! Fine-tuning phase.
//!
//! Unfreezes the top of the backbone and continues training at a lower
//! learning rate from the epoch where the initial phase stopped, reusing
//! the same checkpoint/early-stop state and class weights.

use std::path::Path;

use burn::tensor::backend::AutodiffBackend;
use tracing::info;

use leaf_core::{PipelineConfig, Result};
use leaf_dataset::LeafDataset;
use leaf_model::LeafClassifier;

use crate::trainer::{fit, FitOptions, TrainingState};

/// Runs the fine-tuning phase and returns the updated model.
pub fn run_fine_tuning<B: AutodiffBackend>(
    model: LeafClassifier<B>,
    train: &LeafDataset,
    val: &LeafDataset,
    class_weights: Option<&[f32]>,
    config: &PipelineConfig,
    state: &mut TrainingState,
    device: &B::Device,
    checkpoint_dir: &Path,
) -> Result<LeafClassifier<B>> {
    let fine_tuning = &config.fine_tuning;
    let total_layers = model.backbone_layers();
    let boundary = fine_tuning.unfreeze_from_layer.min(total_layers);

    info!(
        "Starting fine-tuning: backbone layers {}..{} trainable, learning rate {}",
        boundary, total_layers, fine_tuning.learning_rate
    );

    let model = model.unfreeze_backbone_from(boundary);

    let opts = FitOptions {
        epochs: fine_tuning.epochs,
        initial_epoch: state.epoch,
        batch_size: config.training.batch_size,
        learning_rate: fine_tuning.learning_rate,
        patience: config.training.early_stopping_patience,
        num_workers: config.training.num_workers,
        seed: config.training.seed,
        checkpoint_dir: checkpoint_dir.to_path_buf(),
    };

    fit(model, train, val, class_weights, &opts, state, device)
}
