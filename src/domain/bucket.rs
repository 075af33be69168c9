// ============================================================
// Layer 3 — Length Buckets
// ============================================================
// A bucket is a fixed (encoder_size, decoder_size) pairing.
// Every sentence pair is placed in the smallest bucket that can
// hold both of its sides, so a batch drawn from one bucket only
// needs padding up to that bucket's lengths.
//
// Example with buckets [(19,19), (28,28)]:
//   source 12 tokens, target 21 tokens → bucket 1 (28,28)
//   source 30 tokens                  → no bucket, pair dropped
//
// Bucket sampling during training is proportional to bucket
// size: the cumulative "scale" maps a uniform draw in [0, 1)
// onto a bucket index.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// The bucket table used by the translator unless overridden.
pub const DEFAULT_BUCKETS: [(usize, usize); 6] =
    [(19, 19), (28, 28), (33, 33), (40, 43), (50, 53), (60, 63)];

/// One (encoder_size, decoder_size) pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub encoder_size: usize,
    pub decoder_size: usize,
}

impl Bucket {
    pub fn new(encoder_size: usize, decoder_size: usize) -> Self {
        Self { encoder_size, decoder_size }
    }

    /// True if a pair of the given lengths fits without truncation
    pub fn fits(&self, source_len: usize, target_len: usize) -> bool {
        source_len <= self.encoder_size && target_len <= self.decoder_size
    }
}

/// Build the default bucket table
pub fn default_buckets() -> Vec<Bucket> {
    DEFAULT_BUCKETS
        .iter()
        .map(|&(e, d)| Bucket::new(e, d))
        .collect()
}

/// Index of the first bucket that fits both lengths.
/// Returns None when the pair is longer than every bucket.
pub fn assign_bucket(buckets: &[Bucket], source_len: usize, target_len: usize) -> Option<usize> {
    buckets.iter().position(|b| b.fits(source_len, target_len))
}

/// Index of the first bucket whose encoder side covers `source_len`.
/// Used at inference time when there is no target yet.
pub fn find_encoder_bucket(buckets: &[Bucket], source_len: usize) -> Option<usize> {
    buckets.iter().position(|b| b.encoder_size >= source_len)
}

/// Longest source sentence any bucket accepts
pub fn max_encoder_size(buckets: &[Bucket]) -> usize {
    buckets.iter().map(|b| b.encoder_size).max().unwrap_or(0)
}

// ─── BucketScale ──────────────────────────────────────────────────────────────
/// Cumulative, normalised bucket sizes.
///
/// scale[i] = (size[0] + ... + size[i]) / total
///
/// so the last entry is always 1.0 and the sequence never decreases.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketScale {
    scale: Vec<f64>,
}

impl BucketScale {
    /// Build the scale from per-bucket sample counts.
    /// Fails if every bucket is empty, since nothing could be sampled.
    pub fn from_sizes(sizes: &[usize]) -> Result<Self> {
        let total: usize = sizes.iter().sum();
        ensure!(total > 0, "All buckets are empty; no training pairs fit any bucket");

        let mut running = 0usize;
        let scale = sizes
            .iter()
            .map(|&s| {
                running += s;
                running as f64 / total as f64
            })
            .collect();
        Ok(Self { scale })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.scale
    }

    /// Map a uniform draw `r` in [0, 1) to the smallest bucket
    /// index whose cumulative scale is strictly greater than r.
    pub fn pick(&self, r: f64) -> usize {
        self.scale
            .iter()
            .position(|&s| s > r)
            .unwrap_or(self.scale.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_picks_first_fitting_bucket() {
        let buckets = default_buckets();
        assert_eq!(assign_bucket(&buckets, 5, 5), Some(0));
        assert_eq!(assign_bucket(&buckets, 19, 19), Some(0));
        assert_eq!(assign_bucket(&buckets, 12, 21), Some(1));
        assert_eq!(assign_bucket(&buckets, 40, 43), Some(3));
        assert_eq!(assign_bucket(&buckets, 41, 10), Some(4));
    }

    #[test]
    fn test_assign_drops_overlong_pairs() {
        let buckets = default_buckets();
        assert_eq!(assign_bucket(&buckets, 61, 3), None);
        assert_eq!(assign_bucket(&buckets, 3, 64), None);
    }

    #[test]
    fn test_find_encoder_bucket() {
        let buckets = default_buckets();
        assert_eq!(find_encoder_bucket(&buckets, 0), Some(0));
        assert_eq!(find_encoder_bucket(&buckets, 20), Some(1));
        assert_eq!(find_encoder_bucket(&buckets, 60), Some(5));
        assert_eq!(find_encoder_bucket(&buckets, 61), None);
        assert_eq!(max_encoder_size(&buckets), 60);
    }

    #[test]
    fn test_scale_is_cumulative_and_ends_at_one() {
        let scale = BucketScale::from_sizes(&[1, 0, 3]).unwrap();
        assert_eq!(scale.as_slice(), &[0.25, 0.25, 1.0]);
        assert!(scale.as_slice().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_pick_never_selects_empty_bucket() {
        let scale = BucketScale::from_sizes(&[1, 0, 3]).unwrap();
        assert_eq!(scale.pick(0.0), 0);
        assert_eq!(scale.pick(0.24), 0);
        // 0.25 is not strictly greater than 0.25, so bucket 1 is skipped
        assert_eq!(scale.pick(0.25), 2);
        assert_eq!(scale.pick(0.999), 2);
    }

    #[test]
    fn test_empty_scale_is_an_error() {
        assert!(BucketScale::from_sizes(&[0, 0]).is_err());
    }
}
