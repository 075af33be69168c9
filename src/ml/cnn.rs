// ============================================================
// Layer 5 — Convolutional Classifier
// ============================================================
// images [N, 3, 32, 32]
//   → Conv 5x5 valid → norm → ReLU   [N,  32, 28, 28]
//   → Conv 5x5 valid → norm → ReLU   [N,  64, 24, 24]
//   → Conv 5x5 valid → norm → ReLU   [N, 128, 20, 20]
//   → flatten                        [N, 51200]
//   → Linear → norm → ReLU           [N, 1000]
//   → Linear → norm → ReLU           [N, 1000]
//   → Linear                         [N, 10] logits
//
// Every valid 5x5 convolution trims 4 pixels off each side
// length. No pooling, no padding, stride 1.
//
// Reference: Burn Book §3 (Conv2d)

use anyhow::{ensure, Result};
use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        Initializer, Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::classifier::{zero_conv_bias, zero_linear_bias, ImageClassifier};
use crate::ml::norm::batch_moments_norm;

const STANDARD_NORMAL: Initializer = Initializer::Normal { mean: 0.0, std: 1.0 };

#[derive(Config, Debug)]
pub struct CnnConfig {
    pub image_size: usize,
    pub in_channels: usize,
    pub conv_channels: Vec<usize>,
    pub hidden_sizes: Vec<usize>,
    pub num_classes: usize,
    #[config(default = 5)]
    pub kernel_size: usize,
}

impl CnnConfig {
    /// Side length left after every valid convolution
    pub fn output_side(&self) -> Option<usize> {
        let shrink = self.conv_channels.len() * (self.kernel_size - 1);
        self.image_size.checked_sub(shrink).filter(|&s| s > 0)
    }

    /// Width of the flattened convolution output
    pub fn flattened_size(&self) -> Option<usize> {
        let side = self.output_side()?;
        let channels = *self.conv_channels.last().unwrap_or(&self.in_channels);
        Some(side * side * channels)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Cnn<B>> {
        ensure!(self.kernel_size > 0, "Kernel size must be positive");
        let Some(flat) = self.flattened_size() else {
            anyhow::bail!(
                "Images of side {} are too small for {} convolutions of size {}",
                self.image_size,
                self.conv_channels.len(),
                self.kernel_size
            );
        };

        let mut channels = vec![self.in_channels];
        channels.extend(&self.conv_channels);
        let convs = channels
            .windows(2)
            .map(|c| {
                let conv = Conv2dConfig::new([c[0], c[1]], [self.kernel_size, self.kernel_size])
                    .with_padding(PaddingConfig2d::Valid)
                    .with_initializer(STANDARD_NORMAL)
                    .init(device);
                zero_conv_bias(conv, device)
            })
            .collect();

        let mut widths = vec![flat];
        widths.extend(&self.hidden_sizes);
        let hidden = widths
            .windows(2)
            .map(|w| linear(w[0], w[1], device))
            .collect();
        let last = *widths.last().unwrap_or(&flat);
        let output = linear(last, self.num_classes, device);

        Ok(Cnn { convs, hidden, output })
    }
}

fn linear<B: Backend>(d_in: usize, d_out: usize, device: &B::Device) -> Linear<B> {
    let layer = LinearConfig::new(d_in, d_out)
        .with_initializer(STANDARD_NORMAL)
        .init(device);
    zero_linear_bias(layer, device)
}

#[derive(Module, Debug)]
pub struct Cnn<B: Backend> {
    pub convs: Vec<Conv2d<B>>,
    pub hidden: Vec<Linear<B>>,
    pub output: Linear<B>,
}

impl<B: Backend> ImageClassifier<B> for Cnn<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = images;
        for conv in &self.convs {
            x = relu(batch_moments_norm(conv.forward(x)));
        }

        let mut x = x.flatten::<2>(1, 3);
        for layer in &self.hidden {
            x = relu(batch_moments_norm(layer.forward(x)));
        }
        self.output.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_default_geometry_matches_cifar() {
        let cfg = CnnConfig::new(32, 3, vec![32, 64, 128], vec![1000, 1000], 10);
        assert_eq!(cfg.output_side(), Some(20));
        assert_eq!(cfg.flattened_size(), Some(20 * 20 * 128));
    }

    #[test]
    fn test_small_network_forward_shape() {
        let device = Default::default();
        let cfg = CnnConfig::new(12, 3, vec![4, 6], vec![16], 10);
        let model = cfg.init::<TestBackend>(&device).unwrap();
        assert_eq!(model.convs.len(), 2);

        let images = Tensor::<TestBackend, 4>::random(
            [3, 3, 12, 12],
            burn::tensor::Distribution::Uniform(0.0, 1.0),
            &device,
        );
        assert_eq!(model.forward(images).dims(), [3, 10]);
    }

    #[test]
    fn test_image_too_small_is_an_error() {
        let device = Default::default();
        let cfg = CnnConfig::new(8, 3, vec![4, 4], vec![16], 10);
        assert!(cfg.init::<TestBackend>(&device).is_err());
    }
}
