//! Training loop.
//!
//! A custom epoch loop over Burn data loaders: weighted cross-entropy, Adam
//! updates, a validation pass per epoch, best-weights checkpointing on
//! validation accuracy and patience-based early stopping on validation loss
//! that restores the best-seen weights when it triggers.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    data::dataset::Dataset,
    module::{AutodiffModule, Module},
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    record::CompactRecorder,
    tensor::{backend::AutodiffBackend, backend::Backend, ElementConversion, Int, Tensor},
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::info;

use leaf_core::logging::TrainingLogger;
use leaf_core::{Error, Result};
use leaf_dataset::{LeafBatch, LeafBatcher, LeafDataset};
use leaf_model::LeafClassifier;

/// Options for one training phase.
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Epochs to run in this phase
    pub epochs: usize,
    /// Epoch counter offset (fine-tuning continues where the initial phase
    /// stopped)
    pub initial_epoch: usize,
    /// Batch size
    pub batch_size: usize,
    /// Learning rate for this phase
    pub learning_rate: f64,
    /// Early stopping patience; `None` disables early stopping
    pub patience: Option<usize>,
    /// Data loader worker threads
    pub num_workers: usize,
    /// Shuffle seed
    pub seed: u64,
    /// Directory receiving the best-model checkpoint
    pub checkpoint_dir: PathBuf,
}

/// Per-epoch metric history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub train_loss: Vec<f64>,
    pub train_accuracy: Vec<f64>,
    pub val_loss: Vec<f64>,
    pub val_accuracy: Vec<f64>,
}

/// Training state threaded through both phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingState {
    /// Next epoch index (== number of epochs run so far)
    pub epoch: usize,
    /// Best validation loss seen in the current phase
    pub best_val_loss: f64,
    /// Best validation accuracy seen across all phases
    pub best_val_acc: f64,
    /// Epochs without validation loss improvement
    pub patience_counter: usize,
    /// Metric history across all phases
    pub history: TrainingHistory,
}

impl Default for TrainingState {
    fn default() -> Self {
        Self {
            epoch: 0,
            best_val_loss: f64::INFINITY,
            best_val_acc: 0.0,
            patience_counter: 0,
            history: TrainingHistory::default(),
        }
    }
}

impl TrainingState {
    /// Resets the early-stop monitor at the start of a phase. The accuracy
    /// checkpoint monitor intentionally carries across phases, so the
    /// fine-tuning phase only overwrites the checkpoint when it actually
    /// improves on the initial phase.
    fn begin_phase(&mut self) {
        self.best_val_loss = f64::INFINITY;
        self.patience_counter = 0;
    }

    /// Records one epoch of metrics.
    fn push_epoch(&mut self, train_loss: f64, train_acc: f64, val_loss: f64, val_acc: f64) {
        self.history.train_loss.push(train_loss);
        self.history.train_accuracy.push(train_acc);
        self.history.val_loss.push(val_loss);
        self.history.val_accuracy.push(val_acc);
    }

    /// Persists the state with its history as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        #[derive(Serialize)]
        struct HistoryFile<'a> {
            saved_at: String,
            #[serde(flatten)]
            state: &'a TrainingState,
        }

        let file = HistoryFile {
            saved_at: chrono::Utc::now().to_rfc3339(),
            state: self,
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Runs one training phase and returns the resulting model.
pub fn fit<B: AutodiffBackend>(
    mut model: LeafClassifier<B>,
    train: &LeafDataset,
    val: &LeafDataset,
    class_weights: Option<&[f32]>,
    opts: &FitOptions,
    state: &mut TrainingState,
    device: &B::Device,
) -> Result<LeafClassifier<B>> {
    state.begin_phase();

    let (width, height) = train.image_size();
    let num_batches = (train.len() + opts.batch_size - 1) / opts.batch_size;

    let train_loader = DataLoaderBuilder::new(LeafBatcher::<B>::new(
        device.clone(),
        width,
        height,
    ))
    .batch_size(opts.batch_size)
    .shuffle(opts.seed)
    .num_workers(opts.num_workers)
    .build(train.clone());

    let val_loader = DataLoaderBuilder::new(LeafBatcher::<B::InnerBackend>::new(
        device.clone(),
        width,
        height,
    ))
    .batch_size(opts.batch_size)
    .num_workers(opts.num_workers)
    .build(val.clone());

    let loss_config = CrossEntropyLossConfig::new().with_weights(class_weights.map(|w| w.to_vec()));
    let loss_fn = loss_config.init(device);

    let mut optimizer = AdamConfig::new().init();

    let mut logger = TrainingLogger::new(opts.initial_epoch + opts.epochs);
    let mut best_loss_model: Option<LeafClassifier<B>> = None;

    for epoch in opts.initial_epoch..opts.initial_epoch + opts.epochs {
        logger.start_epoch(epoch);

        let mut epoch_loss = 0.0f64;
        let mut batches = 0usize;
        let mut correct = 0usize;
        let mut seen = 0usize;

        let progress = ProgressBar::new(num_batches as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        for batch in train_loader.iter() {
            let output = model.forward(batch.images);
            let loss = loss_fn.forward(output.clone(), batch.targets.clone());

            let loss_value: f64 = loss.clone().into_scalar().elem();
            epoch_loss += loss_value;
            batches += 1;

            let predictions: Tensor<B, 1, Int> = output.argmax(1).squeeze(1);
            let batch_correct: i64 = predictions
                .equal(batch.targets.clone())
                .int()
                .sum()
                .into_scalar()
                .elem();
            correct += batch_correct as usize;
            seen += batch.targets.dims()[0];

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(opts.learning_rate, model, grads);

            progress.inc(1);
        }
        progress.finish_and_clear();

        let train_loss = epoch_loss / batches.max(1) as f64;
        let train_acc = correct as f64 / seen.max(1) as f64;

        let (val_loss, val_acc) = evaluate(&model.valid(), &val_loader, device);

        state.push_epoch(train_loss, train_acc, val_loss, val_acc);
        state.epoch = epoch + 1;

        if val_acc > state.best_val_acc {
            state.best_val_acc = val_acc;
            logger.log_new_best(val_acc);
            save_checkpoint(&model, &opts.checkpoint_dir)?;
        }

        if val_loss < state.best_val_loss {
            state.best_val_loss = val_loss;
            state.patience_counter = 0;
            best_loss_model = Some(model.clone());
        } else {
            state.patience_counter += 1;
        }

        logger.end_epoch(train_loss, train_acc, val_loss, val_acc);

        if let Some(patience) = opts.patience {
            if state.patience_counter >= patience {
                logger.log_early_stop(patience);
                if let Some(best) = best_loss_model.take() {
                    model = best;
                }
                break;
            }
        }
    }

    logger.log_complete(state.best_val_acc);
    Ok(model)
}

/// Evaluates a model over a validation loader, returning (loss, accuracy).
fn evaluate<B: Backend>(
    model: &LeafClassifier<B>,
    loader: &Arc<dyn DataLoader<LeafBatch<B>>>,
    device: &B::Device,
) -> (f64, f64) {
    let loss_fn = CrossEntropyLossConfig::new().init(device);

    let mut total_loss = 0.0f64;
    let mut batches = 0usize;
    let mut correct = 0usize;
    let mut seen = 0usize;

    for batch in loader.iter() {
        let output = model.forward(batch.images);
        let loss = loss_fn.forward(output.clone(), batch.targets.clone());

        total_loss += loss.into_scalar().elem::<f64>();
        batches += 1;

        let predictions: Tensor<B, 1, Int> = output.argmax(1).squeeze(1);
        let batch_correct: i64 = predictions
            .equal(batch.targets.clone())
            .int()
            .sum()
            .into_scalar()
            .elem();
        correct += batch_correct as usize;
        seen += batch.targets.dims()[0];
    }

    let loss = total_loss / batches.max(1) as f64;
    let accuracy = correct as f64 / seen.max(1) as f64;
    (loss, accuracy)
}

/// Writes the current best model into the checkpoint directory.
fn save_checkpoint<B: AutodiffBackend>(
    model: &LeafClassifier<B>,
    checkpoint_dir: &Path,
) -> Result<()> {
    fs::create_dir_all(checkpoint_dir)?;
    let path = checkpoint_dir.join("best_model");

    model
        .valid()
        .save_file(path, &CompactRecorder::new())
        .map_err(|e| Error::Training(format!("Failed to save checkpoint: {e}")))?;

    info!("Checkpoint saved to {}", checkpoint_dir.join("best_model.mpk").display());
    Ok(())
}
