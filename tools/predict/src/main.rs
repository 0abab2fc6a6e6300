//! Standalone inference check over the exported quantized model.
//!
//! Loads `model.bin` and `labels.txt`, runs one image through the same
//! resize + [0, 1] normalization used during training, and prints the top-3
//! predicted labels with percentage confidence. Any failure prints an error
//! message instead of a structured exit code.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::module::Module;
use burn::record::{BinFileRecorder, HalfPrecisionSettings};
use burn::tensor::Tensor;
use clap::Parser;

use leaf_core::{default_device, DefaultBackend, ModelSection};
use leaf_dataset::preprocess::load_chw;
use leaf_model::LeafClassifier;

/// Run the exported quantized model on a single image.
#[derive(Parser, Debug)]
#[command(name = "predict", about = "Classify one leaf image with an exported model")]
struct Args {
    /// Path to the quantized model record (model.bin)
    model: PathBuf,

    /// Path to the label file (labels.txt)
    labels: PathBuf,

    /// Path to the image to classify
    image: PathBuf,

    /// Width multiplier the model was built with
    #[arg(long, default_value = "1.0")]
    alpha: f64,

    /// Square input resolution the model was trained at
    #[arg(long, default_value = "224")]
    image_size: usize,
}

fn main() {
    if let Err(e) = run(Args::parse()) {
        println!("ERROR: {e}");
    }
}

fn run(args: Args) -> Result<()> {
    println!("Loading model: {}...", args.model.display());

    let labels: Vec<String> = fs::read_to_string(&args.labels)
        .with_context(|| format!("Failed to read labels from {}", args.labels.display()))?
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    if labels.is_empty() {
        anyhow::bail!("Label file {} is empty", args.labels.display());
    }

    let device = default_device();
    let section = ModelSection {
        input_shape: [args.image_size, args.image_size, 3],
        alpha: args.alpha,
        weights: "random".to_string(),
        dropout: 0.0,
    };

    let model = LeafClassifier::<DefaultBackend>::new(&section, labels.len(), &device)?;

    // The recorder appends its own extension.
    let record_path = args.model.with_extension("");
    let model = model
        .load_file(
            record_path,
            &BinFileRecorder::<HalfPrecisionSettings>::new(),
            &device,
        )
        .map_err(|e| {
            anyhow::anyhow!("Failed to load model {}: {e}", args.model.display())
        })?;

    println!("Processing image: {}...", args.image.display());
    let size = args.image_size as u32;
    let chw = load_chw(&args.image, size, size)?;

    let tensor: Tensor<DefaultBackend, 1> = Tensor::from_floats(chw.as_slice(), &device);
    let tensor: Tensor<DefaultBackend, 4> =
        tensor.reshape([1, 3, args.image_size, args.image_size]);

    let probs = model.predict(tensor);
    let probs: Vec<f32> = probs
        .into_data()
        .to_vec()
        .map_err(|e| anyhow::anyhow!("Failed to read predictions: {e:?}"))?;

    let mut indexed: Vec<(usize, f32)> = probs.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    println!();
    println!("{}", "=".repeat(30));
    println!("PREDICTION RESULTS");
    println!("{}", "=".repeat(30));
    for (idx, prob) in indexed.iter().take(3) {
        let name = labels.get(*idx).map(String::as_str).unwrap_or("Unknown");
        println!("{}: {:.2}%", name, prob * 100.0);
    }
    println!("{}", "=".repeat(30));

    Ok(())
}
