// ============================================================
// Layer 3 — CIFAR-10 Labels
// ============================================================
// The ten classes in CIFAR-10 label-byte order.

pub const NUM_LABELS: usize = 10;

pub const CIFAR10_LABELS: [&str; NUM_LABELS] = [
    "airplane",
    "automobile",
    "bird",
    "cat",
    "deer",
    "dog",
    "frog",
    "horse",
    "ship",
    "truck",
];

/// Name of a label index, or None if it is out of range
pub fn label_name(index: usize) -> Option<&'static str> {
    CIFAR10_LABELS.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_names() {
        assert_eq!(label_name(0), Some("airplane"));
        assert_eq!(label_name(9), Some("truck"));
        assert_eq!(label_name(10), None);
    }
}
