// ============================================================
// Layer 3 — Sample Domain Types
// ============================================================
// The plain records each exercise trains on. None of these
// carry framework types; conversion to tensors happens in the
// data layer's batchers.
//
// Using #[derive(Debug, Clone)] gives us:
//   - Debug: lets us print the struct with {:?}
//   - Clone: Burn's Dataset::get hands out owned copies
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// One row of the wine quality table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WineSample {
    /// Physico-chemical measurements, in CSV column order
    pub features: Vec<f64>,

    /// Quality score (the last CSV column)
    pub quality: f64,
}

impl WineSample {
    pub fn new(features: Vec<f64>, quality: f64) -> Self {
        Self { features, quality }
    }
}

/// One CIFAR-10 style image.
///
/// Pixels are stored channel-major (all red, then all green,
/// then all blue), which is both the on-disk layout of the
/// binary release and the [C, H, W] layout convolutions expect.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledImage {
    pub pixels: Vec<u8>,
    pub label: u8,
}

impl LabeledImage {
    pub fn new(pixels: Vec<u8>, label: u8) -> Self {
        Self { pixels, label }
    }
}

/// A source/target pair of token id sequences.
///
/// The target already carries its `<s>` and `</s>` markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentencePair {
    pub source: Vec<u32>,
    pub target: Vec<u32>,
}

impl SentencePair {
    pub fn new(source: Vec<u32>, target: Vec<u32>) -> Self {
        Self { source, target }
    }
}
