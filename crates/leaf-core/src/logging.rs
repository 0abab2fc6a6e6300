//! Logging setup and training progress reporting.
//!
//! Structured logging via the `tracing` crate: timestamped leveled lines on
//! standard output, initialized once per binary.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

/// Initializes the process-wide logging subscriber.
///
/// `verbose` lowers the filter to debug; the `RUST_LOG` environment variable
/// still takes precedence when set.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logger: {e}")))?;

    Ok(())
}

/// Per-epoch progress reporter for training phases.
pub struct TrainingLogger {
    epoch: usize,
    total_epochs: usize,
    epoch_start: std::time::Instant,
    phase_start: std::time::Instant,
}

impl TrainingLogger {
    /// Creates a reporter for a phase spanning `total_epochs` epochs.
    pub fn new(total_epochs: usize) -> Self {
        Self {
            epoch: 0,
            total_epochs,
            epoch_start: std::time::Instant::now(),
            phase_start: std::time::Instant::now(),
        }
    }

    /// Marks the start of an epoch.
    pub fn start_epoch(&mut self, epoch: usize) {
        self.epoch = epoch;
        self.epoch_start = std::time::Instant::now();
        tracing::info!("Epoch {}/{} started", epoch + 1, self.total_epochs);
    }

    /// Reports the metrics of a finished epoch.
    pub fn end_epoch(&self, train_loss: f64, train_acc: f64, val_loss: f64, val_acc: f64) {
        let epoch_time = self.epoch_start.elapsed();
        tracing::info!(
            "Epoch {}/{} completed in {:.1}s | loss: {:.4} | acc: {:.2}% | val_loss: {:.4} | val_acc: {:.2}%",
            self.epoch + 1,
            self.total_epochs,
            epoch_time.as_secs_f64(),
            train_loss,
            train_acc * 100.0,
            val_loss,
            val_acc * 100.0
        );
    }

    /// Reports a new best validation accuracy.
    pub fn log_new_best(&self, accuracy: f64) {
        tracing::info!("New best model, val accuracy {:.2}%", accuracy * 100.0);
    }

    /// Reports that early stopping triggered.
    pub fn log_early_stop(&self, patience: usize) {
        tracing::warn!(
            "Early stopping triggered after {} epochs without val loss improvement",
            patience
        );
    }

    /// Reports completion of the phase.
    pub fn log_complete(&self, best_accuracy: f64) {
        tracing::info!(
            "Phase complete in {:.1}s | best val accuracy: {:.2}%",
            self.phase_start.elapsed().as_secs_f64(),
            best_accuracy * 100.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_logger_epoch_tracking() {
        let mut logger = TrainingLogger::new(5);
        logger.start_epoch(2);
        assert_eq!(logger.epoch, 2);
        // Reporting must not panic without an initialized subscriber.
        logger.end_epoch(0.5, 0.8, 0.6, 0.75);
    }
}
