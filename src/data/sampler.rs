// ============================================================
// Layer 4 — Mini-batch Sampler
// ============================================================
// Picks the training batch for one classifier iteration:
//
//   1. Shuffle the full index array 0..len
//   2. Keep the first `batch_size` indices
//
// A fresh shuffle per iteration means a sample can appear in
// consecutive batches and some samples may never be seen;
// there is no epoch bookkeeping and no stratification.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.
//
// Reference: rand crate documentation

use rand::{seq::SliceRandom, Rng};

/// Shuffle `0..len` and return the first `batch_size` indices.
/// Returns fewer than `batch_size` if the dataset is smaller.
pub fn shuffled_prefix<R: Rng + ?Sized>(len: usize, batch_size: usize, rng: &mut R) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..len).collect();
    indices.shuffle(rng);
    indices.truncate(batch_size);
    indices
}
