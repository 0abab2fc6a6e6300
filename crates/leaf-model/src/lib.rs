//! Model architecture for leaf disease classification.
//!
//! A MobileNetV2-style feature extractor with a small classification head.
//! The backbone supports a width multiplier, optional pretrained weights and
//! per-layer freezing for transfer learning.

pub mod backbone;
pub mod classifier;

pub use backbone::MobileNetV2Backbone;
pub use classifier::LeafClassifier;
