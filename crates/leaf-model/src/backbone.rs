//! MobileNetV2-style feature extractor.
//!
//! Inverted residual blocks with linear bottlenecks, parameterized by a
//! width multiplier. Channel counts are rounded to multiples of 8 as in the
//! published architecture, so pretrained records line up across tools.

use burn::{
    module::{Module, ModuleMapper, ParamId},
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d,
    },
    tensor::{activation, backend::Backend, Tensor},
};

/// Inverted residual settings: (expand ratio, channels, repeats, stride).
const BLOCK_SETTINGS: [(usize, usize, usize, usize); 7] = [
    (1, 16, 1, 1),
    (6, 24, 2, 2),
    (6, 32, 3, 2),
    (6, 64, 4, 2),
    (6, 96, 3, 1),
    (6, 160, 3, 2),
    (6, 320, 1, 1),
];

/// Rounds a width-scaled channel count to a multiple of 8, never shrinking
/// by more than 10%.
fn scaled_channels(channels: usize, alpha: f64) -> usize {
    let v = channels as f64 * alpha;
    let rounded = (((v + 4.0) / 8.0).floor() * 8.0).max(8.0);
    let rounded = if rounded < 0.9 * v { rounded + 8.0 } else { rounded };
    rounded as usize
}

fn relu6<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 4> {
    activation::relu(x).clamp_max(6.0)
}

/// Convolution followed by batch normalization, without bias or activation.
#[derive(Module, Debug)]
pub struct ConvNorm<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B, 2>,
}

impl<B: Backend> ConvNorm<B> {
    fn new(
        in_channels: usize,
        out_channels: usize,
        kernel: usize,
        stride: usize,
        groups: usize,
        device: &B::Device,
    ) -> Self {
        let padding = kernel / 2;
        let conv = Conv2dConfig::new([in_channels, out_channels], [kernel, kernel])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(padding, padding))
            .with_groups(groups)
            .with_bias(false)
            .init(device);
        let bn = BatchNormConfig::new(out_channels).init(device);

        Self { conv, bn }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.bn.forward(self.conv.forward(x))
    }
}

/// Inverted residual block: pointwise expansion, depthwise convolution and
/// a linear projection, with a skip connection when shapes allow it.
#[derive(Module, Debug)]
pub struct InvertedResidual<B: Backend> {
    expand: Option<ConvNorm<B>>,
    depthwise: ConvNorm<B>,
    project: ConvNorm<B>,
    use_residual: bool,
}

impl<B: Backend> InvertedResidual<B> {
    fn new(
        in_channels: usize,
        out_channels: usize,
        stride: usize,
        expand_ratio: usize,
        device: &B::Device,
    ) -> Self {
        let hidden = in_channels * expand_ratio;

        let expand = if expand_ratio != 1 {
            Some(ConvNorm::new(in_channels, hidden, 1, 1, 1, device))
        } else {
            None
        };
        let depthwise = ConvNorm::new(hidden, hidden, 3, stride, hidden, device);
        let project = ConvNorm::new(hidden, out_channels, 1, 1, 1, device);

        Self {
            expand,
            depthwise,
            project,
            use_residual: stride == 1 && in_channels == out_channels,
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = x.clone();

        let out = match &self.expand {
            Some(expand) => relu6(expand.forward(x)),
            None => x,
        };
        let out = relu6(self.depthwise.forward(out));
        let out = self.project.forward(out);

        if self.use_residual {
            out.add(identity)
        } else {
            out
        }
    }
}

/// The feature extractor: stem, 17 inverted residual blocks and a 1x1 head
/// convolution. Output is a `[batch, channels, H/32, W/32]` feature map.
#[derive(Module, Debug)]
pub struct MobileNetV2Backbone<B: Backend> {
    stem: ConvNorm<B>,
    blocks: Vec<InvertedResidual<B>>,
    head: ConvNorm<B>,
    out_channels: usize,
}

impl<B: Backend> MobileNetV2Backbone<B> {
    /// Builds a randomly initialized backbone at the given width multiplier.
    pub fn new(alpha: f64, device: &B::Device) -> Self {
        let stem_channels = scaled_channels(32, alpha);
        let stem = ConvNorm::new(3, stem_channels, 3, 2, 1, device);

        let mut blocks = Vec::new();
        let mut in_channels = stem_channels;
        for (expand_ratio, channels, repeats, first_stride) in BLOCK_SETTINGS {
            let out_channels = scaled_channels(channels, alpha);
            for i in 0..repeats {
                let stride = if i == 0 { first_stride } else { 1 };
                blocks.push(InvertedResidual::new(
                    in_channels,
                    out_channels,
                    stride,
                    expand_ratio,
                    device,
                ));
                in_channels = out_channels;
            }
        }

        let head_channels = if alpha > 1.0 {
            scaled_channels(1280, alpha)
        } else {
            1280
        };
        let head = ConvNorm::new(in_channels, head_channels, 1, 1, 1, device);

        Self {
            stem,
            blocks,
            head,
            out_channels: head_channels,
        }
    }

    /// Forward pass producing the final feature map.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = relu6(self.stem.forward(input));
        for block in &self.blocks {
            x = block.forward(x);
        }
        relu6(self.head.forward(x))
    }

    /// Channels of the output feature map.
    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    /// Number of freezable layers: the stem, each block and the head conv.
    pub fn num_layers(&self) -> usize {
        self.blocks.len() + 2
    }

    /// Marks layers with index below `boundary` frozen and the rest
    /// trainable. Layer indices: stem = 0, blocks = 1..=N, head = N + 1.
    pub fn with_trainable_suffix(self, boundary: usize) -> Self {
        let head_index = self.blocks.len() + 1;
        let Self {
            stem,
            blocks,
            head,
            out_channels,
        } = self;

        let stem = if boundary > 0 {
            stem.no_grad()
        } else {
            mark_trainable(stem)
        };

        let blocks = blocks
            .into_iter()
            .enumerate()
            .map(|(i, block)| {
                if i + 1 < boundary {
                    block.no_grad()
                } else {
                    mark_trainable(block)
                }
            })
            .collect();

        let head = if head_index < boundary {
            head.no_grad()
        } else {
            mark_trainable(head)
        };

        Self {
            stem,
            blocks,
            head,
            out_channels,
        }
    }
}

/// Marks every float parameter of a module as requiring gradients, the
/// inverse of `Module::no_grad`.
fn mark_trainable<B: Backend, M: Module<B>>(module: M) -> M {
    struct MarkTrainable;

    impl<B: Backend> ModuleMapper<B> for MarkTrainable {
        fn map_float<const D: usize>(
            &mut self,
            _id: ParamId,
            tensor: Tensor<B, D>,
        ) -> Tensor<B, D> {
            tensor.require_grad()
        }
    }

    module.map(&mut MarkTrainable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use leaf_core::DefaultBackend;

    #[test]
    fn test_scaled_channels() {
        assert_eq!(scaled_channels(32, 1.0), 32);
        assert_eq!(scaled_channels(32, 0.5), 16);
        assert_eq!(scaled_channels(32, 0.25), 8);
        assert_eq!(scaled_channels(16, 0.25), 8);
        assert_eq!(scaled_channels(1280, 1.4), 1792);
    }

    #[test]
    fn test_backbone_output_shape() {
        let device = Default::default();
        let backbone = MobileNetV2Backbone::<DefaultBackend>::new(0.25, &device);

        let input = Tensor::<DefaultBackend, 4>::zeros([1, 3, 32, 32], &device);
        let output = backbone.forward(input);

        let dims = output.dims();
        assert_eq!(dims[0], 1);
        assert_eq!(dims[1], backbone.out_channels());
        // 32x downsampling.
        assert_eq!(dims[2], 1);
        assert_eq!(dims[3], 1);
    }

    #[test]
    fn test_layer_count() {
        let device = Default::default();
        let backbone = MobileNetV2Backbone::<DefaultBackend>::new(0.25, &device);
        // Stem + 17 blocks + head conv.
        assert_eq!(backbone.num_layers(), 19);
    }

    #[test]
    fn test_head_channels_not_scaled_down() {
        let device = Default::default();
        let backbone = MobileNetV2Backbone::<DefaultBackend>::new(0.5, &device);
        assert_eq!(backbone.out_channels(), 1280);
    }

    #[test]
    fn test_trainable_suffix_preserves_shape() {
        let device = Default::default();
        let backbone = MobileNetV2Backbone::<DefaultBackend>::new(0.25, &device);
        let unfrozen = backbone.with_trainable_suffix(10);

        let input = Tensor::<DefaultBackend, 4>::zeros([1, 3, 32, 32], &device);
        let output = unfrozen.forward(input);
        assert_eq!(output.dims()[1], unfrozen.out_channels());
    }
}
