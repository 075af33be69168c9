// ============================================================
// Layer 2 — Translate Use Case
// ============================================================
// Orchestrates the English → Vietnamese translator.
//
// Data preparation (first run only, when vocab.enc is missing):
//   Step 1: Tokenise the raw train/test text   (Layer 4 - data)
//   Step 2: Build both vocabularies from train (Layer 6 - infra)
//   Step 3: Write <split>_ids.enc / .dec       (Layer 4 - data)
//
// train:
//   Step 4: Load train ids into buckets        (Layer 4 - data)
//   Step 5: Save the model config              (Layer 6 - infra)
//   Step 6: Restore the checkpoint, if any     (Layer 6 - infra)
//   Step 7: Run the training driver            (Layer 5 - ml)
//
// test / translate:
//   Rebuild the model from the saved config, load the latest
//   checkpoint and decode greedily. test scores every test
//   sentence that fits a bucket with sentence BLEU.
//
// Directory layout:
//   <data_dir>/   train.enc  train.dec  test.enc  test.dec
//                 vocab.enc  vocab.dec  tokenizer.*.json
//                 train_ids.*  test_ids.*
//   <model_dir>/  train_config.json  metrics.csv
//                 checkpoint/  model.mpk  latest_step.json

use anyhow::{ensure, Result};
use burn::{prelude::*, tensor::backend::AutodiffBackend};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::{
    corpus::{ids_path, raw_path, read_lines, write_id_file, BucketedData, ParallelCorpus},
    preprocessor::Preprocessor,
};
use crate::domain::{
    bucket::{default_buckets, Bucket},
    traits::DatasetSource,
    vocab::{strip_decoder_markers, Side, EOS_ID, START_ID},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    vocab_store::{VocabStore, Vocabulary},
};
use crate::ml::{
    bleu::sentence_bleu,
    decoder::GreedyTranslator,
    nmt_trainer::{train_translator, NmtSettings},
    seq2seq::Seq2SeqConfig,
};

const TRAIN_SPLIT: &str = "train";
const TEST_SPLIT: &str = "test";

// ─── Configuration ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Raw parallel text in, vocabularies and id files out
    pub data_dir: String,
    pub model_dir: String,
    pub buckets: Vec<Bucket>,
    /// Minimum training count for a word to enter the vocabulary
    pub threshold: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub max_grad_norm: f32,
    pub max_iteration: usize,
    pub checkpoint_every: usize,
    pub print_every: usize,
    pub seed: u64,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        let settings = NmtSettings::default();
        Self {
            data_dir: "data".to_string(),
            model_dir: "model/translate".to_string(),
            buckets: default_buckets(),
            threshold: 1,
            hidden_size: 256,
            num_layers: 3,
            batch_size: settings.batch_size,
            learning_rate: settings.learning_rate,
            max_grad_norm: settings.max_grad_norm,
            max_iteration: settings.max_iteration,
            checkpoint_every: settings.checkpoint_every,
            print_every: settings.print_every,
            seed: settings.seed,
        }
    }
}

impl TranslateConfig {
    fn settings(&self) -> NmtSettings {
        NmtSettings {
            max_iteration: self.max_iteration,
            batch_size: self.batch_size,
            learning_rate: self.learning_rate,
            max_grad_norm: self.max_grad_norm,
            checkpoint_every: self.checkpoint_every,
            print_every: self.print_every,
            seed: self.seed,
        }
    }
}

// ─── Reports ──────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTranslation {
    pub encoded: String,
    pub decoded: String,
}

#[derive(Debug, Clone)]
pub struct BleuReport {
    pub average_bleu: f64,
    pub evaluated: usize,
    /// Test sentences longer than every bucket
    pub skipped: usize,
    /// The last sentence decoded
    pub sample: Option<SampleTranslation>,
}

// ─── TranslateUseCase ─────────────────────────────────────────────────────────
pub struct TranslateUseCase {
    config: TranslateConfig,
}

impl TranslateUseCase {
    pub fn new(config: TranslateConfig) -> Self {
        Self { config }
    }

    fn data_dir(&self) -> &Path {
        Path::new(&self.config.data_dir)
    }

    fn checkpoint_dir(&self) -> PathBuf {
        Path::new(&self.config.model_dir).join("checkpoint")
    }

    /// Build vocabularies and id files unless they already exist.
    pub fn prepare_data(&self) -> Result<()> {
        let store = VocabStore::new(self.data_dir());
        if store.exists() {
            tracing::info!("Vocabulary data loaded from '{}'", self.config.data_dir);
            return Ok(());
        }
        tracing::info!("No vocabulary data found. Processing new vocabulary data.");

        let preprocessor = Preprocessor::new();
        let tokenize = |split: &str, side: Side| -> Result<Vec<Vec<String>>> {
            let lines = read_lines(&raw_path(self.data_dir(), split, side))?;
            Ok(lines.iter().map(|l| preprocessor.tokenize(l)).collect())
        };

        for side in [Side::Encoder, Side::Decoder] {
            // ── Step 1-2: Tokenise, vocabulary from the training split ───────
            let train_tokens = tokenize(TRAIN_SPLIT, side)?;
            let vocab = store.build(side, &train_tokens, self.config.threshold)?;

            // ── Step 3: Id files for both splits ─────────────────────────────
            for (split, tokens) in [(TRAIN_SPLIT, train_tokens), (TEST_SPLIT, tokenize(TEST_SPLIT, side)?)] {
                let ids = tokens
                    .iter()
                    .map(|t| sentence_to_ids(&vocab, t, side))
                    .collect::<Result<Vec<_>>>()?;
                write_id_file(&ids_path(self.data_dir(), split, side), &ids)?;
            }
        }

        tracing::info!("New vocabulary data processed!");
        Ok(())
    }

    /// Load one split's id files into the configured buckets.
    pub fn bucketed(&self, split: &str) -> Result<BucketedData> {
        let pairs = ParallelCorpus::new(self.data_dir(), split).load_all()?;
        let data = BucketedData::from_pairs(pairs, &self.config.buckets);

        tracing::info!("Number of samples in each bucket: {:?}", data.sizes());
        if data.dropped() > 0 {
            tracing::info!("{} pairs fit no bucket and were dropped", data.dropped());
        }
        Ok(data)
    }

    /// Train from the latest checkpoint (or from scratch).
    /// Returns the global step reached.
    pub fn train<B: AutodiffBackend>(&self, device: &B::Device) -> Result<usize> {
        let cfg = &self.config;
        self.prepare_data()?;

        // ── Step 4: Bucketed training data ───────────────────────────────────
        let data = self.bucketed(TRAIN_SPLIT)?;
        tracing::info!("Bucket scale: {:?}", data.scale()?.as_slice());

        // ── Step 5: Model config from the vocabulary sizes ───────────────────
        let store = VocabStore::new(self.data_dir());
        let model_cfg = Seq2SeqConfig::new(store.load(Side::Encoder)?.len(), store.load(Side::Decoder)?.len())
            .with_hidden_size(cfg.hidden_size)
            .with_num_layers(cfg.num_layers);
        let run_dir = CheckpointManager::new(&cfg.model_dir)?;
        run_dir.save_config(&model_cfg)?;

        // ── Step 6: Restore ──────────────────────────────────────────────────
        let ckpt = CheckpointManager::new(self.checkpoint_dir())?;
        let mut model = model_cfg.init::<B>(device);
        let start_step = match ckpt.latest_step()? {
            Some(step) => {
                model = ckpt.load_model::<B, _>(model, device)?;
                tracing::info!("Resuming from global step {step}");
                step
            }
            None => {
                tracing::info!("Initializing fresh parameters");
                0
            }
        };

        // ── Step 7: Train ────────────────────────────────────────────────────
        let mut metrics = MetricsLogger::new(run_dir.dir(), "metrics.csv")?;
        let settings = cfg.settings();
        train_translator(model, &data, &settings, start_step, &ckpt, &mut metrics, device)?;

        Ok(start_step.max(settings.max_iteration))
    }

    /// Restore the trained model for greedy decoding.
    pub fn translator<B: Backend>(&self, device: &B::Device) -> Result<GreedyTranslator<B>> {
        let store = VocabStore::new(self.data_dir());
        let encoder_vocab = store.load(Side::Encoder)?;
        let decoder_vocab = store.load(Side::Decoder)?;

        let model_cfg: Seq2SeqConfig = CheckpointManager::new(&self.config.model_dir)?.load_config()?;
        let ckpt = CheckpointManager::new(self.checkpoint_dir())?;
        let step = ckpt.latest_step()?;
        ensure!(
            step.is_some(),
            "No checkpoint in '{}'. Run 'translate train' first.",
            ckpt.dir().display()
        );
        tracing::info!("Loading parameters from global step {}", step.unwrap_or_default());

        let model = ckpt.load_model::<B, _>(model_cfg.init::<B>(device), device)?;
        Ok(GreedyTranslator::new(
            model,
            self.config.buckets.clone(),
            encoder_vocab,
            decoder_vocab,
            device.clone(),
        ))
    }

    /// Decode every test sentence that fits a bucket and average
    /// the sentence BLEU scores.
    pub fn test<B: Backend>(&self, device: &B::Device) -> Result<BleuReport> {
        self.prepare_data()?;
        let translator = self.translator::<B>(device)?;
        let pairs = ParallelCorpus::new(self.data_dir(), TEST_SPLIT).load_all()?;
        let max_length = translator.max_length();

        tracing::info!("Testing full test dataset...");
        let mut scores = Vec::with_capacity(pairs.len());
        let mut last = None;
        for pair in pairs.iter().filter(|p| p.source.len() <= max_length) {
            let output = translator.translate_ids(&pair.source)?;
            scores.push(sentence_bleu(strip_decoder_markers(&pair.target), &output));
            last = Some((pair, output));
        }
        ensure!(!scores.is_empty(), "No test sentence fits any bucket");

        let sample = last.map(|(pair, output)| SampleTranslation {
            encoded: translator.encoder_vocab().sentence(&pair.source),
            decoded: translator.decoder_vocab().sentence(&output),
        });

        Ok(BleuReport {
            average_bleu: scores.iter().sum::<f64>() / scores.len() as f64,
            evaluated: scores.len(),
            skipped: pairs.len() - scores.len(),
            sample,
        })
    }
}

/// Vocabulary ids of one tokenised sentence; decoder sentences
/// are wrapped in <s> ... </s>.
fn sentence_to_ids(vocab: &Vocabulary, tokens: &[String], side: Side) -> Result<Vec<u32>> {
    let ids = vocab.ids(tokens)?;
    Ok(match side {
        Side::Encoder => ids,
        Side::Decoder => {
            let mut wrapped = Vec::with_capacity(ids.len() + 2);
            wrapped.push(START_ID);
            wrapped.extend(ids);
            wrapped.push(EOS_ID);
            wrapped
        }
    })
}
