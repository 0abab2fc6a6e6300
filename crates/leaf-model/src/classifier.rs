//! Leaf disease classifier.
//!
//! Pretrained, frozen feature extractor followed by global average pooling,
//! dropout and a dense layer sized to the detected class count.

use burn::{
    module::Module,
    nn::{
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig,
    },
    record::CompactRecorder,
    tensor::{activation::softmax, backend::Backend, Tensor},
};

use leaf_core::{Error, ModelSection, Result};

use crate::backbone::MobileNetV2Backbone;

/// Classifier: backbone -> global average pooling -> dropout -> dense head.
#[derive(Module, Debug)]
pub struct LeafClassifier<B: Backend> {
    backbone: MobileNetV2Backbone<B>,
    pool: AdaptiveAvgPool2d,
    dropout: Dropout,
    fc: Linear<B>,
    num_classes: usize,
}

impl<B: Backend> LeafClassifier<B> {
    /// Builds the classifier from the model configuration.
    ///
    /// When `model.weights` names a record file, the backbone is initialized
    /// from it; a missing or incompatible record is a hard error. The
    /// backbone starts frozen either way; only the head trains during the
    /// initial phase.
    pub fn new(section: &ModelSection, num_classes: usize, device: &B::Device) -> Result<Self> {
        let backbone = MobileNetV2Backbone::new(section.alpha, device);

        let backbone = match section.pretrained_weights() {
            Some(path) => {
                // The recorder appends its own extension.
                let record_path = path.with_extension("");
                backbone
                    .load_file(record_path, &CompactRecorder::new(), device)
                    .map_err(|e| {
                        Error::Model(format!(
                            "Failed to load pretrained backbone weights from {}: {e}",
                            path.display()
                        ))
                    })?
            }
            None => backbone,
        };

        let backbone = backbone.no_grad();

        let pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let dropout = DropoutConfig::new(section.dropout).init();
        let fc = LinearConfig::new(backbone.out_channels(), num_classes).init(device);

        Ok(Self {
            backbone,
            pool,
            dropout,
            fc,
            num_classes,
        })
    }

    /// Forward pass producing logits of shape `[batch, num_classes]`.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.backbone.forward(input);
        let x = self.pool.forward(x);

        let [batch, channels, _, _] = x.dims();
        let x = x.reshape([batch, channels]);

        let x = self.dropout.forward(x);
        self.fc.forward(x)
    }

    /// Forward pass with softmax, producing a probability simplex per row.
    pub fn predict(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.forward(input), 1)
    }

    /// Number of output classes.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Number of freezable backbone layers.
    pub fn backbone_layers(&self) -> usize {
        self.backbone.num_layers()
    }

    /// Transitions to the fine-tuning phase: backbone layers from
    /// `boundary` upward become trainable, everything below stays frozen.
    pub fn unfreeze_backbone_from(self, boundary: usize) -> Self {
        Self {
            backbone: self.backbone.with_trainable_suffix(boundary),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leaf_core::DefaultBackend;

    fn section(alpha: f64, weights: &str) -> ModelSection {
        ModelSection {
            input_shape: [32, 32, 3],
            alpha,
            weights: weights.to_string(),
            dropout: 0.2,
        }
    }

    #[test]
    fn test_output_shape() {
        let device = Default::default();
        let model =
            LeafClassifier::<DefaultBackend>::new(&section(0.25, "random"), 5, &device).unwrap();

        let input = Tensor::<DefaultBackend, 4>::zeros([2, 3, 32, 32], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 5]);
        assert_eq!(model.num_classes(), 5);
    }

    #[test]
    fn test_predict_is_probability_simplex() {
        let device = Default::default();
        let model =
            LeafClassifier::<DefaultBackend>::new(&section(0.25, "random"), 4, &device).unwrap();

        let input = Tensor::<DefaultBackend, 4>::ones([1, 3, 32, 32], &device);
        let probs: Vec<f32> = model.predict(input).into_data().to_vec().unwrap();

        assert_eq!(probs.len(), 4);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_missing_pretrained_weights_error() {
        let device = Default::default();
        let result = LeafClassifier::<DefaultBackend>::new(
            &section(0.25, "/nonexistent/backbone.mpk"),
            3,
            &device,
        );
        assert!(matches!(result, Err(Error::Model(_))));
    }

    #[test]
    fn test_pretrained_roundtrip() {
        let device = Default::default();
        let dir = tempfile::tempdir().unwrap();
        let weights_path = dir.path().join("backbone");

        let backbone = MobileNetV2Backbone::<DefaultBackend>::new(0.25, &device);
        backbone
            .save_file(weights_path.clone(), &CompactRecorder::new())
            .unwrap();

        let weights_str = dir.path().join("backbone.mpk").display().to_string();
        let model =
            LeafClassifier::<DefaultBackend>::new(&section(0.25, &weights_str), 3, &device)
                .unwrap();

        let input = Tensor::<DefaultBackend, 4>::zeros([1, 3, 32, 32], &device);
        assert_eq!(model.forward(input).dims(), [1, 3]);
    }

    #[test]
    fn test_unfreeze_preserves_behavior_shape() {
        let device = Default::default();
        let model =
            LeafClassifier::<DefaultBackend>::new(&section(0.25, "random"), 3, &device).unwrap();
        let layers = model.backbone_layers();
        let model = model.unfreeze_backbone_from(layers - 3);

        let input = Tensor::<DefaultBackend, 4>::zeros([1, 3, 32, 32], &device);
        assert_eq!(model.forward(input).dims(), [1, 3]);
    }
}
