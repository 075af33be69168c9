// ============================================================
// Layer 5 — Image Classifier Abstraction
// ============================================================
// The three CIFAR-10 networks (MLP, CNN, softmax baseline)
// share one training loop. This module holds what they have
// in common:
//
//   ImageClassifier      images [N, 3, 32, 32] → logits [N, 10]
//   ClassifierKind       which architecture a checkpoint holds
//   cross_entropy        mean softmax cross-entropy of a batch
//   count_correct        how many argmax predictions hit the label
//   predict_labels       argmax per row
//   zero_linear_bias     start a layer's bias at zero
//
// Reference: Rust Book §10 (Traits)
//            Burn Book §3 (Modules)

use burn::{
    module::Param,
    nn::{conv::Conv2d, loss::CrossEntropyLossConfig, Linear},
    prelude::*,
};
use serde::{Deserialize, Serialize};

// ─── ImageClassifier ──────────────────────────────────────────────────────────
pub trait ImageClassifier<B: Backend> {
    /// images: [batch, channels, height, width] → logits: [batch, classes]
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2>;
}

// ─── ClassifierKind ───────────────────────────────────────────────────────────
/// The architectures the `classify` exercise can train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    Mlp,
    Cnn,
    Softmax,
}

impl ClassifierKind {
    pub fn name(&self) -> &'static str {
        match self {
            ClassifierKind::Mlp => "mlp",
            ClassifierKind::Cnn => "cnn",
            ClassifierKind::Softmax => "softmax",
        }
    }
}

// ─── Batch scoring ────────────────────────────────────────────────────────────
/// Mean softmax cross-entropy over the batch — shape [1]
pub fn cross_entropy<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, labels)
}

/// Number of rows whose argmax equals the label
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> usize {
    // argmax(1) returns shape [batch, 1] — flatten to [batch]
    // before comparing with labels which is [batch]
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    let correct: i64 = predicted
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    correct as usize
}

/// Argmax class index for every row
pub fn predict_labels<B: Backend>(logits: Tensor<B, 2>) -> anyhow::Result<Vec<usize>> {
    let predicted = logits
        .argmax(1)
        .flatten::<1>(0, 1)
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|e| anyhow::anyhow!("Cannot read predictions: {e:?}"))?;
    Ok(predicted.into_iter().map(|p| p as usize).collect())
}

// ─── Bias initialisation ──────────────────────────────────────────────────────
// Burn initialises biases with the layer's weight initializer;
// the classifiers want N(0, 1) weights but zero biases.

pub fn zero_linear_bias<B: Backend>(mut layer: Linear<B>, device: &B::Device) -> Linear<B> {
    if let Some(bias) = &layer.bias {
        let dims = bias.val().dims();
        layer.bias = Some(Param::from_tensor(Tensor::zeros(dims, device)));
    }
    layer
}

pub fn zero_conv_bias<B: Backend>(mut layer: Conv2d<B>, device: &B::Device) -> Conv2d<B> {
    if let Some(bias) = &layer.bias {
        let dims = bias.val().dims();
        layer.bias = Some(Param::from_tensor(Tensor::zeros(dims, device)));
    }
    layer
}
