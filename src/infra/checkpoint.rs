// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder,
// plus small JSON side files.
//
// What gets saved per checkpoint directory:
//   1. model.mpk          — all learned parameters
//   2. train_config.json  — the run configuration
//   3. latest_step.json   — translator only: global step reached
//
// Why save the config separately?
//   When loading for test or translate, we need to know the
//   exact model architecture (model kind, layer sizes, vocab
//   sizes) to rebuild the model before loading the weights
//   into it. Without the config, we can't reconstruct it.
//
// Burn's CompactRecorder:
//   - Serialises model parameters to MessagePack format
//   - Stores floats at half precision for smaller files
//   - Type-safe: loading fails if architecture doesn't match
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

const MODEL_FILE: &str = "model";
const CONFIG_FILE: &str = "train_config.json";
const STEP_FILE: &str = "latest_step.json";

/// Manages saving and loading of one checkpoint directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager.
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        // create_dir_all creates parent directories too, like `mkdir -p`
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Delete the directory with everything in it and start empty
    pub fn reset(&self) -> Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir).with_context(|| {
                format!("Cannot remove checkpoint directory '{}'", self.dir.display())
            })?;
        }
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot recreate '{}'", self.dir.display()))?;
        Ok(())
    }

    /// Save model weights.
    ///
    /// Uses Burn's CompactRecorder which:
    ///   1. Calls model.into_record() to extract all parameters
    ///   2. Serialises to MessagePack binary format
    ///   3. Writes to {dir}/model.mpk
    pub fn save_model<B: Backend, M: Module<B>>(&self, model: &M) -> Result<()> {
        // Build the file path (without extension — recorder adds it)
        let path = self.dir.join(MODEL_FILE);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        tracing::debug!("Saved model to '{}'", path.display());
        Ok(())
    }

    /// Load saved weights into a freshly built model.
    ///
    /// The model parameter must have the correct architecture
    /// (matching the saved checkpoint) or loading will fail.
    pub fn load_model<B: Backend, M: Module<B>>(&self, model: M, device: &B::Device) -> Result<M> {
        let path = self.dir.join(MODEL_FILE);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;

        tracing::info!("Loaded model from '{}'", path.display());
        // load_record() returns a new model with the loaded weights
        Ok(model.load_record(record))
    }

    /// Save the run configuration to JSON.
    pub fn save_config<T: Serialize>(&self, cfg: &T) -> Result<()> {
        self.save_json(CONFIG_FILE, cfg)
    }

    /// Load the run configuration saved by `save_config`.
    pub fn load_config<T: DeserializeOwned>(&self) -> Result<T> {
        self.load_json(CONFIG_FILE).with_context(|| {
            format!(
                "No training config in '{}'. Make sure you have run 'train' first.",
                self.dir.display()
            )
        })
    }

    /// Record the global step a checkpoint was taken at
    pub fn save_step(&self, step: usize) -> Result<()> {
        self.save_json(STEP_FILE, &step)
    }

    /// Global step of the saved checkpoint, or None if nothing
    /// has been saved yet.
    pub fn latest_step(&self) -> Result<Option<usize>> {
        if !self.dir.join(STEP_FILE).exists() {
            return Ok(None);
        }
        self.load_json(STEP_FILE).map(Some)
    }

    fn save_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        // serde_json::to_string_pretty adds indentation for readability
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json).with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    fn load_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Malformed JSON in '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::nn::{Linear, LinearConfig};
    use serde::Deserialize;

    type TestBackend = NdArray;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct DummyConfig {
        width: usize,
        name: String,
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let cfg = DummyConfig { width: 7, name: "cnn".into() };
        ckpt.save_config(&cfg).unwrap();
        assert_eq!(ckpt.load_config::<DummyConfig>().unwrap(), cfg);
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        assert!(ckpt.load_config::<DummyConfig>().is_err());
    }

    #[test]
    fn test_step_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("checkpoint")).unwrap();
        assert_eq!(ckpt.latest_step().unwrap(), None);

        ckpt.save_step(300).unwrap();
        assert_eq!(ckpt.latest_step().unwrap(), Some(300));

        ckpt.reset().unwrap();
        assert!(ckpt.dir().exists());
        assert_eq!(ckpt.latest_step().unwrap(), None);
    }

    #[test]
    fn test_model_weights_survive_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();

        let model: Linear<TestBackend> = LinearConfig::new(3, 2).init(&device);
        ckpt.save_model::<TestBackend, _>(&model).unwrap();

        let fresh: Linear<TestBackend> = LinearConfig::new(3, 2).init(&device);
        let loaded = ckpt.load_model::<TestBackend, _>(fresh, &device).unwrap();

        let before = model.weight.val().into_data().to_vec::<f32>().unwrap();
        let after = loaded.weight.val().into_data().to_vec::<f32>().unwrap();
        // CompactRecorder stores half precision
        for (a, b) in before.iter().zip(&after) {
            assert!((a - b).abs() < 1e-2);
        }
    }
}
