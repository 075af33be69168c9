// ============================================================
// Layer 5 — Fully-Connected Classifier
// ============================================================
// images [N, 3, 32, 32]
//   → flatten            [N, 3072]
//   → Linear → norm → ReLU   (one block per hidden size)
//   → Linear             [N, 10] logits
//
// Weights start from a standard normal N(0, 1) and biases at
// zero. The batch-moment normalisation after every hidden layer
// keeps those large initial weights from blowing up.

use burn::{
    nn::{Initializer, Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::classifier::{zero_linear_bias, ImageClassifier};
use crate::ml::norm::batch_moments_norm;

#[derive(Config, Debug)]
pub struct MlpConfig {
    pub input_size: usize,
    pub hidden_sizes: Vec<usize>,
    pub num_classes: usize,
}

impl MlpConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Mlp<B> {
        let mut widths = vec![self.input_size];
        widths.extend(&self.hidden_sizes);

        let hidden = widths
            .windows(2)
            .map(|w| normal_linear(w[0], w[1], device))
            .collect();
        let last = *widths.last().unwrap_or(&self.input_size);
        let output = normal_linear(last, self.num_classes, device);

        Mlp { hidden, output }
    }
}

fn normal_linear<B: Backend>(d_in: usize, d_out: usize, device: &B::Device) -> Linear<B> {
    let layer = LinearConfig::new(d_in, d_out)
        .with_initializer(Initializer::Normal { mean: 0.0, std: 1.0 })
        .init(device);
    zero_linear_bias(layer, device)
}

#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    pub hidden: Vec<Linear<B>>,
    pub output: Linear<B>,
}

impl<B: Backend> ImageClassifier<B> for Mlp<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = images.flatten::<2>(1, 3);
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
    fn test_forward_shape() {
        let device = Default::default();
        let model = MlpConfig::new(3 * 4 * 4, vec![8, 6], 10).init::<TestBackend>(&device);
        assert_eq!(model.hidden.len(), 2);

        let images = Tensor::<TestBackend, 4>::random(
            [5, 3, 4, 4],
            burn::tensor::Distribution::Uniform(0.0, 1.0),
            &device,
        );
        assert_eq!(model.forward(images).dims(), [5, 10]);
    }
}
