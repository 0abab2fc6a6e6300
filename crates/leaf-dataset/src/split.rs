//! Deterministic train/validation splitting.
//!
//! The split is stratified: each class contributes the configured fraction
//! to validation. A fixed seed drives the shuffle, so repeated runs against
//! unchanged data reproduce identical splits.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use leaf_core::ImageSample;

/// The two halves of a split.
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub train: Vec<ImageSample>,
    pub val: Vec<ImageSample>,
}

/// Splits samples per class into train and validation sets.
///
/// `validation_split` is the fraction of each class held out; the count is
/// rounded up but always leaves at least one training sample per class.
pub fn stratified_split(
    samples: Vec<ImageSample>,
    validation_split: f64,
    seed: u64,
) -> SplitOutcome {
    let mut by_class: BTreeMap<usize, Vec<ImageSample>> = BTreeMap::new();
    for sample in samples {
        by_class.entry(sample.label).or_default().push(sample);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut val = Vec::new();

    for (_, mut class_samples) in by_class {
        class_samples.shuffle(&mut rng);

        let n = class_samples.len();
        let n_val = ((n as f64 * validation_split).ceil() as usize).min(n.saturating_sub(1));

        for (i, sample) in class_samples.into_iter().enumerate() {
            if i < n_val {
                val.push(sample);
            } else {
                train.push(sample);
            }
        }
    }

    SplitOutcome { train, val }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn make_samples(per_class: usize, num_classes: usize) -> Vec<ImageSample> {
        let mut samples = Vec::new();
        for class in 0..num_classes {
            for i in 0..per_class {
                samples.push(ImageSample::new(
                    PathBuf::from(format!("class_{class}/img_{i}.jpg")),
                    class,
                    format!("Class_{class}"),
                ));
            }
        }
        samples
    }

    #[test]
    fn test_split_sizes() {
        let outcome = stratified_split(make_samples(100, 3), 0.2, 42);
        assert_eq!(outcome.val.len(), 60);
        assert_eq!(outcome.train.len(), 240);
    }

    #[test]
    fn test_split_is_stratified() {
        let outcome = stratified_split(make_samples(50, 4), 0.2, 42);
        for class in 0..4 {
            let val_count = outcome.val.iter().filter(|s| s.label == class).count();
            assert_eq!(val_count, 10, "class {class} not stratified");
        }
    }

    #[test]
    fn test_split_is_reproducible() {
        let a = stratified_split(make_samples(30, 2), 0.25, 7);
        let b = stratified_split(make_samples(30, 2), 0.25, 7);

        let paths = |samples: &[ImageSample]| -> Vec<PathBuf> {
            samples.iter().map(|s| s.path.clone()).collect()
        };
        assert_eq!(paths(&a.train), paths(&b.train));
        assert_eq!(paths(&a.val), paths(&b.val));
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = stratified_split(make_samples(30, 2), 0.25, 7);
        let b = stratified_split(make_samples(30, 2), 0.25, 8);

        let paths = |samples: &[ImageSample]| -> Vec<PathBuf> {
            samples.iter().map(|s| s.path.clone()).collect()
        };
        assert_ne!(paths(&a.train), paths(&b.train));
    }

    #[test]
    fn test_tiny_class_keeps_a_training_sample() {
        let outcome = stratified_split(make_samples(1, 1), 0.5, 42);
        assert_eq!(outcome.train.len(), 1);
        assert_eq!(outcome.val.len(), 0);
    }

    #[test]
    fn test_no_samples_lost() {
        let outcome = stratified_split(make_samples(33, 5), 0.3, 42);
        assert_eq!(outcome.train.len() + outcome.val.len(), 33 * 5);
    }
}
