// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Splits an ordered sample list into (train, test) at a fixed
// count: the first `train_count` samples train the model and
// everything after them is held out.
//
// Unlike a shuffled split this is fully deterministic, so the
// reported errors can be compared between runs.
//
// Reference: Rust Book §8 (Vectors)

use anyhow::{ensure, Result};

/// Split `samples` into (first `train_count`, rest).
///
/// # Errors
/// Fails if there are fewer than `train_count` samples, or if
/// `train_count` is zero (an LP over no rows is meaningless).
///
/// # Example
/// ```ignore
/// let (train, test) = split_at_count(all_samples, 1500)?;
/// ```
pub fn split_at_count<T>(mut samples: Vec<T>, train_count: usize) -> Result<(Vec<T>, Vec<T>)> {
    ensure!(train_count > 0, "Training split must contain at least one sample");
    ensure!(
        samples.len() >= train_count,
        "Requested {} training samples but the dataset only has {}",
        train_count,
        samples.len()
    );

    // split_off(n) removes elements [n..] from the Vec and returns them
    let test = samples.split_off(train_count);

    tracing::debug!(
        "Dataset split: {} training, {} test",
        samples.len(),
        test.len()
    );

    Ok((samples, test))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..1599).collect();
        let (train, test) = split_at_count(items, 1500).unwrap();
        assert_eq!(train.len(), 1500);
        assert_eq!(test.len(), 99);
    }

    #[test]
    fn test_order_is_preserved() {
        let items: Vec<usize> = (0..5).collect();
        let (train, test) = split_at_count(items, 3).unwrap();
        assert_eq!(train, vec![0, 1, 2]);
        assert_eq!(test, vec![3, 4]);
    }

    #[test]
    fn test_full_training_split() {
        let items: Vec<usize> = (0..10).collect();
        let (train, test) = split_at_count(items, 10).unwrap();
        assert_eq!(train.len(), 10);
        assert!(test.is_empty());
    }

    #[test]
    fn test_too_few_samples() {
        let items: Vec<usize> = (0..10).collect();
        assert!(split_at_count(items, 11).is_err());
    }

    #[test]
    fn test_zero_training_samples() {
        let items: Vec<usize> = (0..10).collect();
        assert!(split_at_count(items, 0).is_err());
    }
}
