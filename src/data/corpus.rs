// ============================================================
// Layer 4 — Parallel Corpus
// ============================================================
// Reads and writes the translator's text files and groups
// sentence pairs into length buckets.
//
// Files in the data directory:
//   train.enc / train.dec          ← raw sentences, one per line
//   test.enc  / test.dec
//   train_ids.enc / train_ids.dec  ← space-separated token ids
//   test_ids.enc  / test_ids.dec
//
// Line i of the .enc file and line i of the .dec file form
// one SentencePair. Decoder id lines carry their own <s> and
// </s> markers, so nothing is added when reading them back.
//
// Reference: Rust Book §12 (Reading Files)
//            Rust Book §13 (Iterators)

use anyhow::{ensure, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::bucket::{assign_bucket, Bucket, BucketScale};
use crate::domain::sample::SentencePair;
use crate::domain::traits::DatasetSource;
use crate::domain::vocab::Side;

/// Path of a raw split file, e.g. `train.enc`
pub fn raw_path(dir: &Path, split: &str, side: Side) -> PathBuf {
    dir.join(format!("{split}.{}", side.extension()))
}

/// Path of an id split file, e.g. `train_ids.enc`
pub fn ids_path(dir: &Path, split: &str, side: Side) -> PathBuf {
    dir.join(format!("{split}_ids.{}", side.extension()))
}

/// Read a text file into its lines
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Write one line of space-separated ids per sentence
pub fn write_id_file(path: &Path, lines: &[Vec<u32>]) -> Result<()> {
    let mut out = String::new();
    for ids in lines {
        let line: Vec<String> = ids.iter().map(u32::to_string).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    fs::write(path, out).with_context(|| format!("Cannot write '{}'", path.display()))?;
    tracing::debug!("Wrote {} id lines to '{}'", lines.len(), path.display());
    Ok(())
}

/// Parse an id file back into one Vec per line
pub fn read_id_file(path: &Path) -> Result<Vec<Vec<u32>>> {
    read_lines(path)?
        .iter()
        .enumerate()
        .map(|(n, line)| {
            line.split_whitespace()
                .map(|tok| {
                    tok.parse::<u32>().with_context(|| {
                        format!("'{}' line {}: bad token id '{tok}'", path.display(), n + 1)
                    })
                })
                .collect()
        })
        .collect()
}

// ─── ParallelCorpus ───────────────────────────────────────────────────────────
/// One split of the parallel id files.
pub struct ParallelCorpus {
    encoder_path: PathBuf,
    decoder_path: PathBuf,
}

impl ParallelCorpus {
    /// The `<split>_ids.enc` / `<split>_ids.dec` pair in `dir`
    pub fn new(dir: &Path, split: &str) -> Self {
        Self {
            encoder_path: ids_path(dir, split, Side::Encoder),
            decoder_path: ids_path(dir, split, Side::Decoder),
        }
    }
}

impl DatasetSource for ParallelCorpus {
    type Item = SentencePair;

    fn load_all(&self) -> Result<Vec<SentencePair>> {
        let sources = read_id_file(&self.encoder_path)?;
        let targets = read_id_file(&self.decoder_path)?;
        ensure!(
            sources.len() == targets.len(),
            "'{}' has {} lines but '{}' has {}",
            self.encoder_path.display(),
            sources.len(),
            self.decoder_path.display(),
            targets.len()
        );
        Ok(sources
            .into_iter()
            .zip(targets)
            .map(|(s, t)| SentencePair::new(s, t))
            .collect())
    }
}

// ─── BucketedData ─────────────────────────────────────────────────────────────
/// Sentence pairs grouped by the first bucket that holds them.
#[derive(Debug, Clone)]
pub struct BucketedData {
    buckets: Vec<Bucket>,
    data: Vec<Vec<SentencePair>>,
    dropped: usize,
}

impl BucketedData {
    /// Place every pair in its bucket; pairs longer than every
    /// bucket are counted and dropped.
    pub fn from_pairs(pairs: Vec<SentencePair>, buckets: &[Bucket]) -> Self {
        let mut data: Vec<Vec<SentencePair>> = vec![Vec::new(); buckets.len()];
        let mut dropped = 0;

        for (n, pair) in pairs.into_iter().enumerate() {
            if n > 0 && n % 10_000 == 0 {
                tracing::debug!("Bucketing pair number {n}");
            }
            match assign_bucket(buckets, pair.source.len(), pair.target.len()) {
                Some(b) => data[b].push(pair),
                None => dropped += 1,
            }
        }

        Self { buckets: buckets.to_vec(), data, dropped }
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn bucket(&self, index: usize) -> &[SentencePair] {
        &self.data[index]
    }

    /// Number of pairs in each bucket
    pub fn sizes(&self) -> Vec<usize> {
        self.data.iter().map(Vec::len).collect()
    }

    /// Pairs that fit no bucket
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Cumulative sampling scale over the bucket sizes
    pub fn scale(&self) -> Result<BucketScale> {
        BucketScale::from_sizes(&self.sizes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_file_round_trip_keeps_empty_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x_ids.enc");
        let lines = vec![vec![4, 5, 6], vec![], vec![7]];
        write_id_file(&path, &lines).unwrap();
        assert_eq!(read_id_file(&path).unwrap(), lines);
    }

    #[test]
    fn test_bad_id_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad_ids.enc");
        fs::write(&path, "4 five 6\n").unwrap();
        let err = read_id_file(&path).unwrap_err().to_string();
        assert!(err.contains("line 1"));
    }

    #[test]
    fn test_corpus_zips_both_sides() {
        let dir = tempfile::tempdir().unwrap();
        write_id_file(&ids_path(dir.path(), "train", Side::Encoder), &[vec![4], vec![5, 6]]).unwrap();
        write_id_file(&ids_path(dir.path(), "train", Side::Decoder), &[vec![2, 7, 3], vec![2, 3]]).unwrap();

        let pairs = ParallelCorpus::new(dir.path(), "train").load_all().unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1], SentencePair::new(vec![5, 6], vec![2, 3]));
    }

    #[test]
    fn test_corpus_rejects_mismatched_line_counts() {
        let dir = tempfile::tempdir().unwrap();
        write_id_file(&ids_path(dir.path(), "test", Side::Encoder), &[vec![4], vec![5]]).unwrap();
        write_id_file(&ids_path(dir.path(), "test", Side::Decoder), &[vec![2, 3]]).unwrap();
        assert!(ParallelCorpus::new(dir.path(), "test").load_all().is_err());
    }

    #[test]
    fn test_bucketing_uses_first_fit_and_drops_overlong() {
        let buckets = vec![Bucket::new(3, 4), Bucket::new(6, 8)];
        let pairs = vec![
            SentencePair::new(vec![4; 3], vec![5; 4]),  // bucket 0
            SentencePair::new(vec![4; 2], vec![5; 6]),  // bucket 1
            SentencePair::new(vec![4; 7], vec![5; 2]),  // dropped
        ];
        let data = BucketedData::from_pairs(pairs, &buckets);
        assert_eq!(data.sizes(), vec![1, 1]);
        assert_eq!(data.dropped(), 1);
        assert_eq!(data.scale().unwrap().as_slice(), &[0.5, 1.0]);
    }
}
