// ============================================================
// Layer 5 — Translator Training Driver
// ============================================================
// Trains the Seq2Seq model one bucket-sampled batch at a time.
//
// Per iteration:
//   1. Draw r in [0, 1) and pick the bucket from the scale
//      (buckets with more pairs are picked more often)
//   2. Sample batch_size pairs from that bucket with replacement
//   3. Forward pass → masked sequence loss
//   4. Backward pass → SGD step with gradient norm clipping
//   5. iteration += 1
//   6. Every checkpoint_every: wipe the checkpoint directory,
//      save the model and the global step
//   7. Every print_every: print the average loss over the
//      window and the time it took, then reset the window
//
// The loop runs from the restored global step up to
// max_iteration, so an interrupted run continues where the
// last checkpoint left it.
//
// Reference: Sutskever et al. (2014) Sequence to Sequence Learning
//            Pascanu et al. (2013) gradient norm clipping

use anyhow::{ensure, Result};
use burn::{
    grad_clipping::GradientClippingConfig,
    optim::{GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Instant;

use crate::data::{corpus::BucketedData, seq_batcher::{get_batch, SeqBatcher}};
use crate::infra::{checkpoint::CheckpointManager, metrics::{LossRow, MetricsLogger}};
use crate::ml::seq2seq::{masked_sequence_loss, Seq2Seq};

#[derive(Debug, Clone)]
pub struct NmtSettings {
    pub max_iteration: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub max_grad_norm: f32,
    pub checkpoint_every: usize,
    pub print_every: usize,
    pub seed: u64,
}

impl Default for NmtSettings {
    fn default() -> Self {
        Self {
            max_iteration: 31401,
            batch_size: 256,
            learning_rate: 0.5,
            max_grad_norm: 5.0,
            checkpoint_every: 100,
            print_every: 1000,
            seed: 42,
        }
    }
}

/// Train from `start_step` until `settings.max_iteration`.
pub fn train_translator<B: AutodiffBackend>(
    mut model: Seq2Seq<B>,
    data: &BucketedData,
    settings: &NmtSettings,
    start_step: usize,
    checkpoint: &CheckpointManager,
    metrics: &mut MetricsLogger,
    device: &B::Device,
) -> Result<Seq2Seq<B>> {
    ensure!(settings.checkpoint_every > 0, "Checkpoint interval must be positive");
    ensure!(settings.print_every > 0, "Print interval must be positive");

    let scale = data.scale()?;
    let batcher = SeqBatcher::<B>::new(device.clone());
    let mut rng = StdRng::seed_from_u64(settings.seed.wrapping_add(start_step as u64));
    let mut optim = SgdConfig::new()
        .with_gradient_clipping(Some(GradientClippingConfig::Norm(settings.max_grad_norm)))
        .init();

    let mut iteration = start_step;
    let mut total_loss = 0.0f64;
    let mut window_start = Instant::now();

    println!("Training... ");
    while iteration < settings.max_iteration {
        // ── Sample a bucket and a batch from it ──────────────────────────────
        let bucket_id = scale.pick(rng.gen::<f64>());
        let batch = get_batch(
            data.bucket(bucket_id),
            data.buckets()[bucket_id],
            settings.batch_size,
            &mut rng,
        )?;
        let tensors = batcher.to_tensors(&batch);

        // ── Forward + loss ───────────────────────────────────────────────────
        let logits = model.forward(tensors.encoder_inputs, tensors.decoder_inputs);
        let loss = masked_sequence_loss(logits, tensors.targets, tensors.masks);
        total_loss += loss.clone().into_scalar().elem::<f64>();

        // ── Backward pass + clipped SGD step ─────────────────────────────────
        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optim.step(settings.learning_rate, model, grads);
        iteration += 1;

        if iteration % settings.checkpoint_every == 0 {
            checkpoint.reset()?;
            checkpoint.save_model::<B, _>(&model)?;
            checkpoint.save_step(iteration)?;
            tracing::debug!("Checkpoint saved at iteration {iteration}");
        }

        if iteration % settings.print_every == 0 {
            let row = LossRow {
                step: iteration,
                average_loss: total_loss / settings.print_every as f64,
                elapsed_secs: window_start.elapsed().as_secs_f64(),
            };
            println!("Iteration {}: Loss {}, Time {}", row.step, row.average_loss, row.elapsed_secs);
            metrics.log(&row)?;

            window_start = Instant::now();
            total_loss = 0.0;
        }
    }

    tracing::info!("Training stopped at iteration {iteration}");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{bucket::Bucket, sample::SentencePair};
    use crate::ml::seq2seq::Seq2SeqConfig;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    fn tiny_data() -> BucketedData {
        let pairs = vec![
            SentencePair::new(vec![4, 5], vec![2, 6, 3]),
            SentencePair::new(vec![5, 6, 7], vec![2, 7, 8, 3]),
            SentencePair::new(vec![4, 4, 6, 7, 5], vec![2, 6, 7, 8, 9, 3]),
        ];
        BucketedData::from_pairs(pairs, &[Bucket::new(3, 5), Bucket::new(6, 7)])
    }

    fn settings() -> NmtSettings {
        NmtSettings {
            max_iteration: 4,
            batch_size: 2,
            checkpoint_every: 2,
            print_every: 2,
            seed: 3,
            ..NmtSettings::default()
        }
    }

    fn tiny_model() -> Seq2Seq<TestBackend> {
        Seq2SeqConfig::new(8, 10)
            .with_hidden_size(4)
            .with_num_layers(1)
            .init(&Default::default())
    }

    #[test]
    fn test_training_checkpoints_and_logs() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("checkpoint")).unwrap();
        let mut metrics = MetricsLogger::new(dir.path(), "metrics.csv").unwrap();

        train_translator(tiny_model(), &tiny_data(), &settings(), 0, &ckpt, &mut metrics, &Default::default())
            .unwrap();

        assert_eq!(ckpt.latest_step().unwrap(), Some(4));
        let text = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        // header + rows at iterations 2 and 4
        assert_eq!(text.lines().count(), 3);
        for line in text.lines().skip(1) {
            let loss: f64 = line.split(',').nth(1).unwrap().parse().unwrap();
            assert!(loss >= 0.0);
        }
    }

    #[test]
    fn test_resumed_run_past_limit_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("checkpoint")).unwrap();
        let mut metrics = MetricsLogger::new(dir.path(), "metrics.csv").unwrap();

        train_translator(tiny_model(), &tiny_data(), &settings(), 4, &ckpt, &mut metrics, &Default::default())
            .unwrap();

        assert_eq!(ckpt.latest_step().unwrap(), None);
    }
}
