// ============================================================
// Layer 4 — Sequence Batcher
// ============================================================
// Builds one training (or decoding) batch for a bucket.
//
// For every sampled pair:
//   encoder: pad with <pad> up to encoder_size, then reverse
//            [a, b, c] → [a, b, c, pad, pad] → [pad, pad, c, b, a]
//   decoder: pad with <pad> up to decoder_size (not reversed)
//
// The batch is then stored time-major, i.e. one row per time
// step holding that step's token for every example:
//
//   encoder_inputs[t][b]   t in 0..encoder_size
//   decoder_inputs[t][b]   t in 0..decoder_size
//   decoder_masks[t][b]    1.0 if step t predicts a real token
//
// The target at step t is the decoder token at t+1, so the mask
// is 0 on the last step (nothing follows) and wherever the next
// token is <pad>.
//
// SeqBatcher turns a SeqBatch into batch-major tensors for the
// model, adding the shifted targets.
//
// Reference: Burn Book §4 (Batcher)

use anyhow::{ensure, Result};
use burn::prelude::*;
use rand::{seq::SliceRandom, Rng};

use crate::domain::bucket::Bucket;
use crate::domain::sample::SentencePair;
use crate::domain::vocab::PAD_ID;

// ─── SeqBatch ─────────────────────────────────────────────────────────────────
/// A time-major batch for one bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct SeqBatch {
    pub bucket: Bucket,
    pub encoder_inputs: Vec<Vec<u32>>,
    pub decoder_inputs: Vec<Vec<u32>>,
    pub decoder_masks: Vec<Vec<f32>>,
}

impl SeqBatch {
    pub fn batch_size(&self) -> usize {
        self.encoder_inputs.first().map(Vec::len).unwrap_or(0)
    }

    /// Check every dimension against the bucket.
    pub fn validate(&self) -> Result<()> {
        let Bucket { encoder_size, decoder_size } = self.bucket;
        ensure!(
            self.encoder_inputs.len() == encoder_size,
            "Encoder length must equal the one in bucket, {} != {}",
            self.encoder_inputs.len(),
            encoder_size
        );
        ensure!(
            self.decoder_inputs.len() == decoder_size,
            "Decoder length must equal the one in bucket, {} != {}",
            self.decoder_inputs.len(),
            decoder_size
        );
        ensure!(
            self.decoder_masks.len() == decoder_size,
            "Weights length must equal the one in bucket, {} != {}",
            self.decoder_masks.len(),
            decoder_size
        );
        let batch = self.batch_size();
        ensure!(
            self.encoder_inputs.iter().all(|row| row.len() == batch)
                && self.decoder_inputs.iter().all(|row| row.len() == batch)
                && self.decoder_masks.iter().all(|row| row.len() == batch),
            "Every time step must hold {batch} examples"
        );
        Ok(())
    }
}

/// Sample `batch_size` pairs with replacement and build their batch.
pub fn get_batch<R: Rng + ?Sized>(
    pairs: &[SentencePair],
    bucket: Bucket,
    batch_size: usize,
    rng: &mut R,
) -> Result<SeqBatch> {
    ensure!(!pairs.is_empty(), "Cannot sample a batch from an empty bucket");
    ensure!(batch_size > 0, "Batch size must be positive");

    let sampled: Vec<&SentencePair> = (0..batch_size)
        .filter_map(|_| pairs.choose(rng))
        .collect();
    build_batch(&sampled, bucket)
}

/// A batch of one source sentence with an empty decoder side,
/// as used for greedy decoding.
pub fn single_batch(source: &[u32], bucket: Bucket) -> Result<SeqBatch> {
    let pair = SentencePair::new(source.to_vec(), Vec::new());
    build_batch(&[&pair], bucket)
}

fn build_batch(pairs: &[&SentencePair], bucket: Bucket) -> Result<SeqBatch> {
    let Bucket { encoder_size, decoder_size } = bucket;

    let mut encoders = Vec::with_capacity(pairs.len());
    let mut decoders = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let mut enc = pad_input(&pair.source, encoder_size)?;
        enc.reverse();
        encoders.push(enc);
        decoders.push(pad_input(&pair.target, decoder_size)?);
    }

    let encoder_inputs = reshape_batch(&encoders, encoder_size);
    let decoder_inputs = reshape_batch(&decoders, decoder_size);

    let decoder_masks = (0..decoder_size)
        .map(|t| {
            decoders
                .iter()
                .map(|dec| {
                    if t + 1 < decoder_size && dec[t + 1] != PAD_ID {
                        1.0
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect();

    let batch = SeqBatch { bucket, encoder_inputs, decoder_inputs, decoder_masks };
    batch.validate()?;
    Ok(batch)
}

fn pad_input(ids: &[u32], size: usize) -> Result<Vec<u32>> {
    ensure!(
        ids.len() <= size,
        "Sequence of length {} does not fit bucket size {}",
        ids.len(),
        size
    );
    let mut out = ids.to_vec();
    out.resize(size, PAD_ID);
    Ok(out)
}

/// Batch-major rows → time-major rows
fn reshape_batch(inputs: &[Vec<u32>], size: usize) -> Vec<Vec<u32>> {
    (0..size)
        .map(|t| inputs.iter().map(|row| row[t]).collect())
        .collect()
}

// ─── SeqBatcher ───────────────────────────────────────────────────────────────
/// Batch-major tensors for the seq2seq model.
#[derive(Debug, Clone)]
pub struct SeqTensors<B: Backend> {
    /// [batch, encoder_size]
    pub encoder_inputs: Tensor<B, 2, Int>,
    /// [batch, decoder_size]
    pub decoder_inputs: Tensor<B, 2, Int>,
    /// Decoder inputs shifted left by one, <pad> appended — [batch, decoder_size]
    pub targets: Tensor<B, 2, Int>,
    /// [batch, decoder_size]
    pub masks: Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct SeqBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SeqBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    pub fn to_tensors(&self, batch: &SeqBatch) -> SeqTensors<B> {
        let targets: Vec<Vec<u32>> = (0..batch.decoder_inputs.len())
            .map(|t| match batch.decoder_inputs.get(t + 1) {
                Some(next) => next.clone(),
                None => vec![PAD_ID; batch.batch_size()],
            })
            .collect();

        let masks: Vec<f32> = transpose(&batch.decoder_masks);
        let [b, t] = [batch.batch_size(), batch.decoder_masks.len()];

        SeqTensors {
            encoder_inputs: self.int_tensor(&batch.encoder_inputs),
            decoder_inputs: self.int_tensor(&batch.decoder_inputs),
            targets: self.int_tensor(&targets),
            masks: Tensor::<B, 2>::from_data(TensorData::new(masks, [b, t]), &self.device),
        }
    }

    /// Time-major rows → [batch, time] int tensor
    fn int_tensor(&self, rows: &[Vec<u32>]) -> Tensor<B, 2, Int> {
        let steps = rows.len();
        let batch = rows.first().map(Vec::len).unwrap_or(0);
        let flat: Vec<i32> = transpose(rows).into_iter().map(|id| id as i32).collect();
        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device).reshape([batch, steps])
    }
}

/// Flatten time-major rows into batch-major order
fn transpose<T: Copy>(rows: &[Vec<T>]) -> Vec<T> {
    let batch = rows.first().map(Vec::len).unwrap_or(0);
    (0..batch)
        .flat_map(|b| rows.iter().map(move |row| row[b]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use rand::{rngs::StdRng, SeedableRng};

    fn pair(src: &[u32], tgt: &[u32]) -> SentencePair {
        SentencePair::new(src.to_vec(), tgt.to_vec())
    }

    #[test]
    fn test_encoder_is_padded_then_reversed() {
        let batch = build_batch(&[&pair(&[5, 6, 7], &[2, 8, 3])], Bucket::new(5, 4)).unwrap();
        let enc: Vec<u32> = batch.encoder_inputs.iter().map(|row| row[0]).collect();
        assert_eq!(enc, vec![0, 0, 7, 6, 5]);
        let dec: Vec<u32> = batch.decoder_inputs.iter().map(|row| row[0]).collect();
        assert_eq!(dec, vec![2, 8, 3, 0]);
    }

    #[test]
    fn test_mask_zero_on_padding_targets_and_last_step() {
        let (a, b) = (pair(&[5], &[2, 8, 3]), pair(&[5], &[2, 8, 9, 10, 3]));
        let batch = build_batch(&[&a, &b], Bucket::new(2, 5)).unwrap();
        let col = |b: usize| -> Vec<f32> { batch.decoder_masks.iter().map(|row| row[b]).collect() };
        assert_eq!(col(0), vec![1.0, 1.0, 0.0, 0.0, 0.0]);
        assert_eq!(col(1), vec![1.0, 1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_batch_matches_bucket_dimensions() {
        let pairs = vec![pair(&[4, 5], &[2, 6, 3]), pair(&[7], &[2, 3])];
        let bucket = Bucket::new(4, 6);
        let mut rng = StdRng::seed_from_u64(3);
        let batch = get_batch(&pairs, bucket, 8, &mut rng).unwrap();

        assert_eq!(batch.encoder_inputs.len(), 4);
        assert_eq!(batch.decoder_inputs.len(), 6);
        assert_eq!(batch.decoder_masks.len(), 6);
        assert_eq!(batch.batch_size(), 8);
        assert!(batch.validate().is_ok());
    }

    #[test]
    fn test_overlong_pair_is_rejected() {
        assert!(build_batch(&[&pair(&[1, 2, 3], &[2, 3])], Bucket::new(2, 5)).is_err());
        assert!(get_batch(&[], Bucket::new(2, 2), 4, &mut StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn test_validate_catches_wrong_lengths() {
        let mut batch = single_batch(&[4, 5], Bucket::new(3, 3)).unwrap();
        batch.decoder_masks.pop();
        assert!(batch.validate().is_err());
    }

    #[test]
    fn test_tensors_are_batch_major_with_shifted_targets() {
        let (a, b) = (pair(&[5, 6], &[2, 8, 3]), pair(&[7], &[2, 3]));
        let batch = build_batch(&[&a, &b], Bucket::new(3, 4)).unwrap();
        let tensors = SeqBatcher::<NdArray>::new(Default::default()).to_tensors(&batch);

        assert_eq!(tensors.encoder_inputs.dims(), [2, 3]);
        assert_eq!(tensors.decoder_inputs.dims(), [2, 4]);
        assert_eq!(tensors.masks.dims(), [2, 4]);

        let enc = tensors.encoder_inputs.into_data().to_vec::<i64>().unwrap();
        assert_eq!(enc, vec![0, 6, 5, 0, 0, 7]);
        let targets = tensors.targets.into_data().to_vec::<i64>().unwrap();
        assert_eq!(targets, vec![8, 3, 0, 0, 3, 0, 0, 0]);
        let masks = tensors.masks.into_data().to_vec::<f32>().unwrap();
        assert_eq!(masks, vec![1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
    }
}
