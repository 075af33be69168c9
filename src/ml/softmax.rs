// ============================================================
// Layer 5 — Softmax Regression Baseline
// ============================================================
// The warm-up classifier: one linear layer from flattened
// pixels straight to class logits, every weight and bias
// starting at zero. Trained with plain SGD.

use burn::{
    nn::{Initializer, Linear, LinearConfig},
    prelude::*,
};

use crate::ml::classifier::ImageClassifier;

#[derive(Config, Debug)]
pub struct SoftmaxConfig {
    pub input_size: usize,
    pub num_classes: usize,
}

impl SoftmaxConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SoftmaxClassifier<B> {
        let linear = LinearConfig::new(self.input_size, self.num_classes)
            .with_initializer(Initializer::Zeros)
            .init(device);
        SoftmaxClassifier { linear }
    }
}

#[derive(Module, Debug)]
pub struct SoftmaxClassifier<B: Backend> {
    pub linear: Linear<B>,
}

impl<B: Backend> ImageClassifier<B> for SoftmaxClassifier<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        self.linear.forward(images.flatten::<2>(1, 3))
    }
}
