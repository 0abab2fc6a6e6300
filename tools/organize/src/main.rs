//! Dataset organizer CLI.
//!
//! Walks a raw photo tree and copies class-bearing leaf folders into a flat
//! `{Crop}_{Disease}` layout consumable by the training tool.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use leaf_core::logging::init_logging;
use leaf_dataset::{organize, OrganizeOptions, OrganizeOutcome};

/// Organize a raw leaf photo tree into per-class folders.
#[derive(Parser, Debug)]
#[command(name = "organize", about = "Organize a raw image tree into {Crop}_{Disease} class folders")]
struct Args {
    /// Raw source directory to scan
    #[arg(short, long, default_value = "data")]
    source: PathBuf,

    /// Destination directory for the organized dataset
    #[arg(short, long, default_value = "data_processed")]
    dest: PathBuf,

    /// Minimum image count for a folder to qualify as a class (exclusive)
    #[arg(long, default_value = "10")]
    min_count: usize,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let options = OrganizeOptions {
        min_image_count: args.min_count,
        ..OrganizeOptions::default()
    };

    match organize(&args.source, &args.dest, &options)? {
        OrganizeOutcome::SkippedExisting => {
            info!("Nothing to do: destination already exists");
        }
        OrganizeOutcome::Organized(stats) => {
            info!(
                "Done: {} classes, {} images copied, {} leaves skipped, {} copy failures",
                stats.class_counts.len(),
                stats.images_copied,
                stats.leaves_skipped,
                stats.copy_failures
            );
            for (class, count) in &stats.class_counts {
                info!("  {:40} {:5}", class, count);
            }
        }
    }

    Ok(())
}
