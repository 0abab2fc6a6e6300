//! End-to-end training driver.
//!
//! Runs the whole pipeline against a loaded configuration: load data,
//! compute class weights, train the frozen-backbone model, optionally
//! fine-tune, and export the artifacts. Missing training data is the only
//! fatal precondition; class-weight failures degrade to uniform weighting.

use std::fs;

use burn::module::AutodiffModule;
use burn::tensor::backend::AutodiffBackend;
use tracing::{error, info};

use leaf_core::{Error, PipelineConfig, Result};
use leaf_dataset::load_dataset;
use leaf_model::LeafClassifier;

use crate::class_weights::compute_class_weights;
use crate::export::{export_model, ExportPaths};
use crate::finetune::run_fine_tuning;
use crate::trainer::{fit, FitOptions, TrainingState};

/// Summary of a completed pipeline run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Ordered class names (index = label)
    pub class_names: Vec<String>,
    /// Best validation accuracy across all phases
    pub best_val_accuracy: f64,
    /// Whether the fine-tuning phase ran
    pub fine_tuned: bool,
    /// Exported artifact paths
    pub exports: ExportPaths,
}

/// Runs the full pipeline: load, weight, train, fine-tune and export.
pub fn run<B: AutodiffBackend>(config: &PipelineConfig, device: &B::Device) -> Result<RunSummary> {
    info!("Initializing training pipeline");

    let Some(loaded) = load_dataset(config)? else {
        error!(
            "Training data not found. Please check {}",
            config.paths.data_dir.display()
        );
        return Err(Error::Dataset(format!(
            "No training data in {}",
            config.paths.data_dir.display()
        )));
    };

    loaded.stats().log();
    let num_classes = loaded.num_classes();
    info!("Classes found: {}", num_classes);

    let class_weights = compute_class_weights(loaded.train.samples(), num_classes);

    let model = LeafClassifier::<B>::new(&config.model, num_classes, device)?;

    let output_dir = &config.paths.output_dir;
    fs::create_dir_all(output_dir)?;

    let mut state = TrainingState::default();
    let opts = FitOptions {
        epochs: config.training.epochs,
        initial_epoch: 0,
        batch_size: config.training.batch_size,
        learning_rate: config.training.learning_rate,
        patience: config.training.early_stopping_patience,
        num_workers: config.training.num_workers,
        seed: config.training.seed,
        checkpoint_dir: output_dir.clone(),
    };

    info!("Starting initial training...");
    let model = fit(
        model,
        &loaded.train,
        &loaded.val,
        class_weights.as_deref(),
        &opts,
        &mut state,
        device,
    )?;

    let fine_tuned = config.fine_tuning.enabled;
    let model = if fine_tuned {
        run_fine_tuning(
            model,
            &loaded.train,
            &loaded.val,
            class_weights.as_deref(),
            config,
            &mut state,
            device,
            output_dir,
        )?
    } else {
        info!("Fine-tuning disabled; exporting after initial training");
        model
    };

    info!("Exporting model to {}...", output_dir.display());
    let exports = export_model(&model.valid(), &loaded.class_names, output_dir)?;
    state.save(&output_dir.join("history.json"))?;

    Ok(RunSummary {
        class_names: loaded.class_names,
        best_val_accuracy: state.best_val_acc,
        fine_tuned,
        exports,
    })
}
