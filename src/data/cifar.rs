// ============================================================
// Layer 4 — CIFAR-10 Binary Loader
// ============================================================
// Reads the binary release of CIFAR-10 ("cifar-10-batches-bin").
//
// File layout:
//   data_batch_1.bin ... data_batch_5.bin   ← 50,000 training images
//   test_batch.bin                          ← 10,000 test images
//
// Each file is a flat sequence of 3073-byte records:
//   byte 0        label (0..=9)
//   bytes 1..1025 red channel,   32x32 row-major
//   next 1024     green channel, 32x32 row-major
//   next 1024     blue channel,  32x32 row-major
//
// The channel-major layout is kept as-is in LabeledImage; it is
// exactly the [C, H, W] order Burn's Conv2d expects.
//
// Reference: https://www.cs.toronto.edu/~kriz/cifar.html
//            Rust Book §9 (Error Handling)

use anyhow::{ensure, Context, Result};
use burn::data::dataset::Dataset;
use std::{fs, path::PathBuf};

use crate::domain::labels::NUM_LABELS;
use crate::domain::sample::LabeledImage;
use crate::domain::traits::DatasetSource;

pub const IMAGE_SIZE: usize = 32;
pub const CHANNELS: usize = 3;
pub const PIXELS_PER_IMAGE: usize = CHANNELS * IMAGE_SIZE * IMAGE_SIZE;
const RECORD_LEN: usize = PIXELS_PER_IMAGE + 1;

const TRAIN_FILES: [&str; 5] = [
    "data_batch_1.bin",
    "data_batch_2.bin",
    "data_batch_3.bin",
    "data_batch_4.bin",
    "data_batch_5.bin",
];
const TEST_FILES: [&str; 1] = ["test_batch.bin"];

/// Which half of CIFAR-10 to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CifarSplit {
    Train,
    Test,
}

impl CifarSplit {
    fn files(&self) -> &'static [&'static str] {
        match self {
            CifarSplit::Train => &TRAIN_FILES,
            CifarSplit::Test => &TEST_FILES,
        }
    }
}

/// Loads one split of CIFAR-10 from a directory of binary batches.
pub struct CifarLoader {
    dir: PathBuf,
    split: CifarSplit,
}

impl CifarLoader {
    pub fn new(dir: impl Into<PathBuf>, split: CifarSplit) -> Self {
        Self { dir: dir.into(), split }
    }
}

impl DatasetSource for CifarLoader {
    type Item = LabeledImage;

    fn load_all(&self) -> Result<Vec<LabeledImage>> {
        let mut images = Vec::new();
        for name in self.split.files() {
            let path = self.dir.join(name);
            let bytes = fs::read(&path).with_context(|| {
                format!(
                    "Cannot read CIFAR-10 batch '{}'. Expected the binary release \
                     (cifar-10-batches-bin) in this directory.",
                    path.display()
                )
            })?;
            let batch = parse_records(&bytes)
                .with_context(|| format!("Malformed CIFAR-10 batch '{}'", path.display()))?;
            tracing::debug!("Read {} images from '{}'", batch.len(), path.display());
            images.extend(batch);
        }

        tracing::info!("Loaded {} {:?} images", images.len(), self.split);
        Ok(images)
    }
}

/// Decode a buffer of 3073-byte records
pub fn parse_records(bytes: &[u8]) -> Result<Vec<LabeledImage>> {
    ensure!(
        bytes.len() % RECORD_LEN == 0,
        "File length {} is not a multiple of the {}-byte record size",
        bytes.len(),
        RECORD_LEN
    );

    bytes
        .chunks_exact(RECORD_LEN)
        .enumerate()
        .map(|(i, record)| {
            let label = record[0];
            ensure!(
                (label as usize) < NUM_LABELS,
                "Record {i} has label {label}, expected 0..{NUM_LABELS}"
            );
            Ok(LabeledImage::new(record[1..].to_vec(), label))
        })
        .collect()
}

// ─── CifarDataset ─────────────────────────────────────────────────────────────
/// In-memory image dataset. Pixels stay as u8 until batching,
/// which keeps the 50,000-image training set at ~150 MB.
pub struct CifarDataset {
    images: Vec<LabeledImage>,
}

impl CifarDataset {
    pub fn new(images: Vec<LabeledImage>) -> Self {
        Self { images }
    }

    /// Copy out the samples at the given indices, in the order given
    pub fn select(&self, indices: &[usize]) -> Vec<LabeledImage> {
        indices
            .iter()
            .filter_map(|&i| self.images.get(i).cloned())
            .collect()
    }

    pub fn as_slice(&self) -> &[LabeledImage] {
        &self.images
    }
}

impl Dataset<LabeledImage> for CifarDataset {
    fn get(&self, index: usize) -> Option<LabeledImage> {
        self.images.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.images.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: u8, fill: u8) -> Vec<u8> {
        let mut r = vec![label];
        r.extend(std::iter::repeat(fill).take(PIXELS_PER_IMAGE));
        r
    }

    #[test]
    fn test_parse_two_records() {
        let mut bytes = record(3, 7);
        bytes.extend(record(9, 200));
        let images = parse_records(&bytes).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].label, 3);
        assert_eq!(images[1].label, 9);
        assert_eq!(images[1].pixels.len(), PIXELS_PER_IMAGE);
        assert!(images[1].pixels.iter().all(|&p| p == 200));
    }

    #[test]
    fn test_truncated_file_is_rejected() {
        let mut bytes = record(1, 0);
        bytes.pop();
        assert!(parse_records(&bytes).is_err());
    }

    #[test]
    fn test_out_of_range_label_is_rejected() {
        assert!(parse_records(&record(10, 0)).is_err());
    }

    #[test]
    fn test_loader_reads_test_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = record(0, 1);
        bytes.extend(record(4, 2));
        fs::write(dir.path().join("test_batch.bin"), bytes).unwrap();

        let images = CifarLoader::new(dir.path(), CifarSplit::Test).load_all().unwrap();
        assert_eq!(images.len(), 2);

        let dataset = CifarDataset::new(images);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.get(1).map(|i| i.label), Some(4));
        assert_eq!(dataset.select(&[1, 0])[0].label, 4);
    }

    #[test]
    fn test_loader_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CifarLoader::new(dir.path(), CifarSplit::Train).load_all().is_err());
    }
}
