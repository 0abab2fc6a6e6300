//! Training CLI.
//!
//! Loads the pipeline configuration, applies command-line overrides and
//! drives the full run: load data, train, optionally fine-tune, export.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use leaf_core::logging::init_logging;
use leaf_core::{default_device, PipelineConfig, TrainingBackend};
use leaf_training::pipeline::run;

/// Train the leaf disease classifier and export the deployment artifacts.
#[derive(Parser, Debug)]
#[command(
    name = "train",
    about = "Train a leaf disease classifier",
    long_about = "Fine-tunes a pretrained backbone on an organized leaf image dataset, \
                  then exports a full-precision model, a quantized deployment model \
                  and the label file."
)]
struct Args {
    /// Path to the pipeline configuration file (TOML)
    #[arg(short, long, value_name = "FILE", default_value = "configs/config.toml")]
    config: PathBuf,

    /// Override the output directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Override the number of initial-phase epochs
    #[arg(short, long, value_name = "N")]
    epochs: Option<usize>,

    /// Override the learning rate
    #[arg(short, long, value_name = "LR")]
    lr: Option<f64>,

    /// Override the batch size
    #[arg(short, long, value_name = "SIZE")]
    batch_size: Option<usize>,

    /// Validate the configuration and exit without training
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    info!("Leaf disease classification - training tool");

    let mut config =
        PipelineConfig::load(&args.config).context("Failed to load configuration file")?;
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid configuration")?;

    print_config_summary(&config);

    if args.dry_run {
        info!("Configuration validated successfully (dry run)");
        return Ok(());
    }

    let device = default_device();
    let summary = run::<TrainingBackend>(&config, &device)?;

    info!("");
    info!("Run summary:");
    info!("  Classes: {}", summary.class_names.len());
    info!(
        "  Best validation accuracy: {:.2}%",
        summary.best_val_accuracy * 100.0
    );
    info!("  Fine-tuned: {}", summary.fine_tuned);
    info!("  Quantized model: {}", summary.exports.quantized.display());
    info!("  Labels: {}", summary.exports.labels.display());

    Ok(())
}

fn apply_overrides(config: &mut PipelineConfig, args: &Args) {
    if let Some(epochs) = args.epochs {
        config.training.epochs = epochs;
    }
    if let Some(lr) = args.lr {
        config.training.learning_rate = lr;
    }
    if let Some(batch_size) = args.batch_size {
        config.training.batch_size = batch_size;
    }
    if let Some(ref output) = args.output {
        config.paths.output_dir = output.clone();
    }
}

fn print_config_summary(config: &PipelineConfig) {
    info!("");
    info!("Configuration summary:");
    info!(
        "  Input shape: {}x{}x{}",
        config.model.input_shape[0], config.model.input_shape[1], config.model.input_shape[2]
    );
    info!("  Alpha: {}", config.model.alpha);
    info!("  Weights: {}", config.model.weights);
    info!("  Dropout: {}", config.model.dropout);
    info!("  Batch size: {}", config.training.batch_size);
    info!("  Validation split: {}", config.training.validation_split);
    info!("  Epochs: {}", config.training.epochs);
    info!("  Learning rate: {}", config.training.learning_rate);
    info!("  Fine-tuning: {}", config.fine_tuning.enabled);
    if config.fine_tuning.enabled {
        info!(
            "    Unfreeze from layer: {}",
            config.fine_tuning.unfreeze_from_layer
        );
        info!("    Learning rate: {}", config.fine_tuning.learning_rate);
        info!("    Epochs: {}", config.fine_tuning.epochs);
    }
    info!("  Data dir: {}", config.paths.data_dir.display());
    info!("  Output dir: {}", config.paths.output_dir.display());
    info!("");
}
