//! Class-imbalance weights.
//!
//! Balanced weighting scales each class inversely to its frequency:
//! `weight_c = total / (num_classes * count_c)`. Weight computation is a
//! quality improvement, not a correctness requirement, so any failure here
//! degrades to uniform weighting instead of aborting the run.

use tracing::{info, warn};

use leaf_core::ImageSample;

/// Computes balanced class weights over the training samples.
///
/// Returns `None` (uniform weighting) when the weights cannot be computed,
/// e.g. no samples, a class with zero samples, or an out-of-range label.
pub fn compute_class_weights(samples: &[ImageSample], num_classes: usize) -> Option<Vec<f32>> {
    info!("Computing class weights...");

    if num_classes == 0 || samples.is_empty() {
        warn!("Could not compute class weights: no samples. Using equal weights.");
        return None;
    }

    let mut counts = vec![0usize; num_classes];
    for sample in samples {
        if sample.label >= num_classes {
            warn!(
                "Could not compute class weights: label {} out of range. Using equal weights.",
                sample.label
            );
            return None;
        }
        counts[sample.label] += 1;
    }

    if counts.iter().any(|&c| c == 0) {
        warn!("Could not compute class weights: empty class. Using equal weights.");
        return None;
    }

    let total = samples.len() as f32;
    let weights = counts
        .iter()
        .map(|&count| total / (num_classes as f32 * count as f32))
        .collect();

    Some(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn samples_with_counts(counts: &[usize]) -> Vec<ImageSample> {
        let mut samples = Vec::new();
        for (label, &count) in counts.iter().enumerate() {
            for i in 0..count {
                samples.push(ImageSample::new(
                    PathBuf::from(format!("{label}/{i}.jpg")),
                    label,
                    format!("Class_{label}"),
                ));
            }
        }
        samples
    }

    #[test]
    fn test_balanced_classes_weight_one() {
        let weights = compute_class_weights(&samples_with_counts(&[10, 10]), 2).unwrap();
        assert!(weights.iter().all(|w| (w - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_weights_inverse_to_frequency() {
        let weights = compute_class_weights(&samples_with_counts(&[30, 10, 20]), 3).unwrap();

        assert!(weights.iter().all(|w| w.is_finite() && *w > 0.0));
        // The least frequent class has the largest weight.
        assert!(weights[1] > weights[2]);
        assert!(weights[2] > weights[0]);
    }

    #[test]
    fn test_weight_formula() {
        // total = 60, k = 3: weight_c = 60 / (3 * count_c)
        let weights = compute_class_weights(&samples_with_counts(&[30, 10, 20]), 3).unwrap();
        assert!((weights[0] - 60.0 / 90.0).abs() < 1e-6);
        assert!((weights[1] - 60.0 / 30.0).abs() < 1e-6);
        assert!((weights[2] - 60.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_samples_is_none() {
        assert!(compute_class_weights(&[], 3).is_none());
    }

    #[test]
    fn test_empty_class_is_none() {
        assert!(compute_class_weights(&samples_with_counts(&[5, 0, 5]), 3).is_none());
    }

    #[test]
    fn test_out_of_range_label_is_none() {
        let samples = vec![ImageSample::new(PathBuf::from("x.jpg"), 7, "X")];
        assert!(compute_class_weights(&samples, 2).is_none());
    }
}
