// ============================================================
// Layer 5 — Classifier Training Loop
// ============================================================
// One loop drives all three CIFAR-10 classifiers. The model
// and optimiser types are generic, so the caller picks Adam
// (MLP, CNN) or SGD (softmax) and the architecture.
//
// Iteration i, for i in 0..=iterations:
//   1. Shuffle every training index, keep the first batch_size
//   2. Forward pass, softmax cross-entropy loss
//   3. Backward pass + optimiser step
//   4. Every eval_every iterations (i = 0 included): score the
//      whole test set and print one row of the results table
//
// With final_eval_only the loop runs exactly `iterations` steps
// (i in 0..iterations) and scores the test set once, after the
// last step. The softmax baseline trains this way.
//
// Test-set evaluation runs in chunks of eval_batch_size. Batch
// statistics are taken per chunk, so a trailing chunk of a
// single image (which would normalise to all zeros) is merged
// into the chunk before it.
//
// The reported training loss and accuracy come from the same
// forward pass that produced the gradients, i.e. before the step.
//
// Key Burn insight:
//   - Training uses an AutodiffBackend for gradients
//   - model.valid() returns the model on the inner backend
//   - The evaluation batcher must also use the inner backend
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{ensure, Result};
use burn::{
    data::dataloader::batcher::Batcher,
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, SeedableRng};
use std::ops::Range;

use crate::data::{batcher::ImageBatcher, cifar::CifarDataset, sampler::shuffled_prefix};
use crate::infra::metrics::{EvalRow, MetricsLogger};
use crate::ml::classifier::{count_correct, cross_entropy, ImageClassifier};

/// Loop settings shared by every classifier
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub iterations: usize,
    pub batch_size: usize,
    pub eval_every: usize,
    /// Score the test set once, after the last of `iterations` steps
    pub final_eval_only: bool,
    pub eval_batch_size: usize,
    pub learning_rate: f64,
    pub seed: u64,
}

impl LoopSettings {
    fn steps(&self) -> usize {
        if self.final_eval_only {
            self.iterations
        } else {
            self.iterations + 1
        }
    }

    fn reports_at(&self, i: usize) -> bool {
        if self.final_eval_only {
            i + 1 == self.steps()
        } else {
            i % self.eval_every == 0
        }
    }

    fn loop_index(&self, i: usize) -> usize {
        if self.final_eval_only {
            1
        } else {
            i / self.eval_every + 1
        }
    }
}

/// Split `0..len` into ranges of `size`, merging a final range of
/// one element into the one before it.
fn chunk_ranges(len: usize, size: usize) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect();
    if ranges.len() > 1 && ranges.last().map(|r| r.end - r.start) == Some(1) {
        if let Some(tail) = ranges.pop() {
            if let Some(prev) = ranges.last_mut() {
                prev.end = tail.end;
            }
        }
    }
    ranges
}

/// Loss and accuracy over a whole dataset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f64,
    /// Fraction in 0..=1
    pub accuracy: f64,
}

/// Score `model` on every image of `dataset`, `chunk_size` images
/// at a time. Loss is averaged per image across chunks.
pub fn evaluate<B: Backend, M: ImageClassifier<B>>(
    model: &M,
    dataset: &CifarDataset,
    chunk_size: usize,
    device: &B::Device,
) -> Result<Evaluation> {
    ensure!(chunk_size > 0, "Evaluation batch size must be positive");
    let images = dataset.as_slice();
    ensure!(!images.is_empty(), "Cannot evaluate on an empty dataset");

    let batcher = ImageBatcher::<B>::new(device.clone());
    let mut loss_sum = 0.0f64;
    let mut correct = 0usize;

    for range in chunk_ranges(images.len(), chunk_size) {
        let chunk = &images[range];
        let batch = batcher.batch(chunk.to_vec());
        let logits = model.forward(batch.images);

        correct += count_correct(logits.clone(), batch.labels.clone());
        let loss: f64 = cross_entropy(logits, batch.labels).into_scalar().elem::<f64>();
        loss_sum += loss * chunk.len() as f64;
    }

    Ok(Evaluation {
        loss: loss_sum / images.len() as f64,
        accuracy: correct as f64 / images.len() as f64,
    })
}

/// Train `model` and return it with its final weights.
pub fn train_classifier<B, M, O>(
    mut model: M,
    mut optim: O,
    train: &CifarDataset,
    test: &CifarDataset,
    settings: &LoopSettings,
    device: &B::Device,
    metrics: &mut MetricsLogger,
) -> Result<M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + ImageClassifier<B>,
    M::InnerModule: ImageClassifier<B::InnerBackend>,
    O: Optimizer<M, B>,
{
    ensure!(!train.as_slice().is_empty(), "Training set is empty");
    ensure!(settings.batch_size > 0, "Batch size must be positive");
    ensure!(
        settings.final_eval_only || settings.eval_every > 0,
        "Evaluation interval must be positive"
    );

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let batcher = ImageBatcher::<B>::new(device.clone());

    // Print the output header
    println!("\nLoop | Training Loss | Training Accuracy (%) | Test Set Loss | Test Set Accuracy (%)");
    println!("------------------------------------------------------------------------------------");

    for i in 0..settings.steps() {
        // ── Sample the batch ─────────────────────────────────────────────────
        let indices = shuffled_prefix(train.as_slice().len(), settings.batch_size, &mut rng);
        let batch = batcher.batch(train.select(&indices));
        let batch_len = indices.len();

        // ── Forward ──────────────────────────────────────────────────────────
        let logits = model.forward(batch.images);
        let report = settings.reports_at(i);
        let train_correct = if report {
            count_correct(logits.clone(), batch.labels.clone())
        } else {
            0
        };
        let loss = cross_entropy(logits, batch.labels);
        let loss_value: f64 = loss.clone().into_scalar().elem::<f64>();

        // ── Backward pass + optimiser update ─────────────────────────────────
        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optim.step(settings.learning_rate, model, grads);

        // ── Report ───────────────────────────────────────────────────────────
        if report {
            let eval = evaluate(&model.valid(), test, settings.eval_batch_size, device)?;
            let row = EvalRow {
                loop_index: settings.loop_index(i),
                train_loss: loss_value,
                train_accuracy: train_correct as f64 / batch_len as f64 * 100.0,
                test_loss: eval.loss,
                test_accuracy: eval.accuracy * 100.0,
            };
            println!(
                "{:>4} | {:>13.6} | {:>21.3} | {:>13.6} | {:>21.3}",
                row.loop_index, row.train_loss, row.train_accuracy, row.test_loss, row.test_accuracy
            );
            metrics.log(&row)?;
        } else {
            tracing::debug!("Iteration {i}: loss {loss_value:.4}");
        }
    }

    tracing::info!("Training complete after {} iterations", settings.steps());
    Ok(model)
}
