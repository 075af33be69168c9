// ============================================================
// Layer 2 — Classify Use Case
// ============================================================
// Trains, scores and queries the CIFAR-10 classifiers.
//
// train:
//   Step 1: Load the train and test splits    (Layer 4 - data)
//   Step 2: Save the run config               (Layer 6 - infra)
//   Step 3: Build the chosen architecture     (Layer 5 - ml)
//   Step 4: Run the training loop             (Layer 5 - ml)
//   Step 5: Save the trained weights          (Layer 6 - infra)
//
// test:
//   Rebuild the architecture named in the saved config, load
//   the weights and score the whole test split, or classify a
//   single image file with --image.

use anyhow::{anyhow, Result};
use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{
    batcher::ImageBatcher,
    cifar::{CifarDataset, CifarLoader, CifarSplit, CHANNELS, IMAGE_SIZE, PIXELS_PER_IMAGE},
    image_io::load_cifar_pixels,
};
use crate::domain::{labels::{label_name, NUM_LABELS}, traits::DatasetSource};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    classifier::{predict_labels, ClassifierKind, ImageClassifier},
    classifier_trainer::{evaluate, train_classifier, Evaluation, LoopSettings},
    cnn::{Cnn, CnnConfig},
    mlp::{Mlp, MlpConfig},
    softmax::{SoftmaxClassifier, SoftmaxConfig},
};

// ─── Configuration ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyConfig {
    pub data_dir: String,
    pub model_dir: String,
    pub model: ClassifierKind,
    pub iterations: usize,
    pub batch_size: usize,
    pub eval_every: usize,
    /// Score the test set only once, after the last iteration
    #[serde(default)]
    pub final_eval_only: bool,
    pub eval_batch_size: usize,
    pub learning_rate: f64,
    pub seed: u64,
}

impl ClassifyConfig {
    /// Coursework defaults for one architecture
    pub fn for_model(model: ClassifierKind) -> Self {
        let (iterations, batch_size, eval_every, learning_rate) = match model {
            ClassifierKind::Mlp => (100, 128, 100, 1e-3),
            ClassifierKind::Cnn => (2000, 128, 100, 1e-3),
            ClassifierKind::Softmax => (5, 100, 5, 0.5),
        };
        Self {
            data_dir: "cifar-10-batches-bin".to_string(),
            model_dir: "model/classify".to_string(),
            model,
            iterations,
            batch_size,
            eval_every,
            final_eval_only: model == ClassifierKind::Softmax,
            eval_batch_size: 1000,
            learning_rate,
            seed: 42,
        }
    }

    fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            iterations: self.iterations,
            batch_size: self.batch_size,
            eval_every: self.eval_every,
            final_eval_only: self.final_eval_only,
            eval_batch_size: self.eval_batch_size,
            learning_rate: self.learning_rate,
            seed: self.seed,
        }
    }
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self::for_model(ClassifierKind::Mlp)
    }
}

// ─── Architectures ────────────────────────────────────────────────────────────
fn mlp_config() -> MlpConfig {
    MlpConfig::new(PIXELS_PER_IMAGE, vec![2000, 1000], NUM_LABELS)
}

fn cnn_config() -> CnnConfig {
    CnnConfig::new(IMAGE_SIZE, CHANNELS, vec![32, 64, 128], vec![1000, 1000], NUM_LABELS)
}

fn softmax_config() -> SoftmaxConfig {
    SoftmaxConfig::new(PIXELS_PER_IMAGE, NUM_LABELS)
}

fn adam() -> AdamConfig {
    AdamConfig::new()
        .with_beta_1(0.9)
        .with_beta_2(0.999)
        .with_epsilon(1e-8)
}

/// A restored model of whichever kind the config names
enum LoadedClassifier<B: Backend> {
    Mlp(Mlp<B>),
    Cnn(Cnn<B>),
    Softmax(SoftmaxClassifier<B>),
}

impl<B: Backend> ImageClassifier<B> for LoadedClassifier<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        match self {
            LoadedClassifier::Mlp(m) => m.forward(images),
            LoadedClassifier::Cnn(m) => m.forward(images),
            LoadedClassifier::Softmax(m) => m.forward(images),
        }
    }
}

// ─── ClassifyUseCase ──────────────────────────────────────────────────────────
pub struct ClassifyUseCase {
    config: ClassifyConfig,
}

impl ClassifyUseCase {
    pub fn new(config: ClassifyConfig) -> Self {
        Self { config }
    }

    /// Train the configured model and save it to the model directory.
    pub fn train<B: AutodiffBackend>(&self, device: &B::Device) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load both splits ─────────────────────────────────────────
        let train = CifarDataset::new(CifarLoader::new(&cfg.data_dir, CifarSplit::Train).load_all()?);
        let test = CifarDataset::new(CifarLoader::new(&cfg.data_dir, CifarSplit::Test).load_all()?);

        // ── Step 2: Save config for test/predict ─────────────────────────────
        let ckpt = CheckpointManager::new(&cfg.model_dir)?;
        ckpt.save_config(cfg)?;
        let mut metrics = MetricsLogger::new(ckpt.dir(), "metrics.csv")?;

        // ── Step 3-5: Build, train, save ─────────────────────────────────────
        tracing::info!("Training the {} classifier", cfg.model.name());
        let run = TrainingRun { train: &train, test: &test, ckpt: &ckpt, device };
        match cfg.model {
            ClassifierKind::Mlp => {
                run.fit(mlp_config().init::<B>(device), adam().init(), cfg, &mut metrics)
            }
            ClassifierKind::Cnn => {
                run.fit(cnn_config().init::<B>(device)?, adam().init(), cfg, &mut metrics)
            }
            ClassifierKind::Softmax => {
                run.fit(softmax_config().init::<B>(device), SgdConfig::new().init(), cfg, &mut metrics)
            }
        }
    }

    /// Score the saved model on the whole test split.
    pub fn test<B: Backend>(&self, device: &B::Device) -> Result<Evaluation> {
        let model = self.load::<B>(device)?;
        let test = CifarDataset::new(
            CifarLoader::new(&self.config.data_dir, CifarSplit::Test).load_all()?,
        );
        evaluate(&model, &test, self.config.eval_batch_size, device)
    }

    /// Predict the label name of one image file.
    pub fn predict_image<B: Backend>(&self, path: &Path, device: &B::Device) -> Result<&'static str> {
        let model = self.load::<B>(device)?;
        let pixels = load_cifar_pixels(path)?;
        let images = ImageBatcher::<B>::new(device.clone()).pixels_to_tensor(&[pixels.as_slice()]);

        let predicted = predict_labels(model.forward(images))?;
        let index = predicted
            .first()
            .copied()
            .ok_or_else(|| anyhow!("The model returned no prediction"))?;
        label_name(index).ok_or_else(|| anyhow!("Predicted class {index} is not a CIFAR-10 label"))
    }

    fn load<B: Backend>(&self, device: &B::Device) -> Result<LoadedClassifier<B>> {
        let ckpt = CheckpointManager::new(&self.config.model_dir)?;
        let saved: ClassifyConfig = ckpt.load_config()?;
        tracing::info!("Restoring the {} classifier", saved.model.name());

        Ok(match saved.model {
            ClassifierKind::Mlp => {
                LoadedClassifier::Mlp(ckpt.load_model::<B, _>(mlp_config().init::<B>(device), device)?)
            }
            ClassifierKind::Cnn => {
                LoadedClassifier::Cnn(ckpt.load_model::<B, _>(cnn_config().init::<B>(device)?, device)?)
            }
            ClassifierKind::Softmax => {
                LoadedClassifier::Softmax(ckpt.load_model::<B, _>(softmax_config().init::<B>(device), device)?)
            }
        })
    }
}

/// The pieces every architecture's training run shares
struct TrainingRun<'a, B: AutodiffBackend> {
    train: &'a CifarDataset,
    test: &'a CifarDataset,
    ckpt: &'a CheckpointManager,
    device: &'a B::Device,
}

impl<B: AutodiffBackend> TrainingRun<'_, B> {
    fn fit<M, O>(&self, model: M, optim: O, cfg: &ClassifyConfig, metrics: &mut MetricsLogger) -> Result<()>
    where
        M: AutodiffModule<B> + ImageClassifier<B>,
        M::InnerModule: ImageClassifier<B::InnerBackend>,
        O: Optimizer<M, B>,
    {
        let trained = train_classifier(
            model,
            optim,
            self.train,
            self.test,
            &cfg.loop_settings(),
            self.device,
            metrics,
        )?;
        self.ckpt.save_model::<B, _>(&trained)?;
        tracing::info!("Model saved to '{}'", self.ckpt.dir().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::labels::CIFAR10_LABELS;
    use burn::backend::{Autodiff, NdArray};

    fn record(label: u8, fill: u8) -> Vec<u8> {
        let mut r = vec![label];
        r.extend(std::iter::repeat(fill).take(PIXELS_PER_IMAGE));
        r
    }

    fn write_cifar(dir: &Path) {
        for n in 1..=5 {
            let bytes = [record(0, 10), record(1, 240)].concat();
            std::fs::write(dir.join(format!("data_batch_{n}.bin")), bytes).unwrap();
        }
        let test = [record(0, 20), record(1, 230), record(0, 5)].concat();
        std::fs::write(dir.join("test_batch.bin"), test).unwrap();
    }

    fn softmax_config_in(dir: &Path) -> ClassifyConfig {
        ClassifyConfig {
            data_dir: dir.to_string_lossy().into_owned(),
            model_dir: dir.join("model").to_string_lossy().into_owned(),
            iterations: 2,
            batch_size: 4,
            eval_batch_size: 2,
            ..ClassifyConfig::for_model(ClassifierKind::Softmax)
        }
    }

    #[test]
    fn test_defaults_per_model() {
        assert_eq!(ClassifyConfig::for_model(ClassifierKind::Mlp).iterations, 100);
        assert_eq!(ClassifyConfig::for_model(ClassifierKind::Cnn).iterations, 2000);
        let softmax = ClassifyConfig::for_model(ClassifierKind::Softmax);
        assert_eq!((softmax.batch_size, softmax.learning_rate), (100, 0.5));
        assert!(softmax.final_eval_only);
        assert!(softmax.loop_settings().final_eval_only);
        assert!(!ClassifyConfig::for_model(ClassifierKind::Cnn).final_eval_only);
    }

    #[test]
    fn test_train_then_test_and_predict() {
        let dir = tempfile::tempdir().unwrap();
        write_cifar(dir.path());
        let use_case = ClassifyUseCase::new(softmax_config_in(dir.path()));
        let device = Default::default();

        use_case.train::<Autodiff<NdArray>>(&device).unwrap();
        assert!(dir.path().join("model").join("train_config.json").exists());

        let eval = use_case.test::<NdArray>(&device).unwrap();
        assert!(eval.loss >= 0.0);
        assert!((0.0..=1.0).contains(&eval.accuracy));

        let image_path = dir.path().join("cat.png");
        image::RgbImage::from_pixel(40, 24, image::Rgb([200, 120, 30])).save(&image_path).unwrap();
        let label = use_case.predict_image::<NdArray>(&image_path, &device).unwrap();
        assert!(CIFAR10_LABELS.contains(&label));
    }

    #[test]
    fn test_without_training_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_cifar(dir.path());
        let use_case = ClassifyUseCase::new(softmax_config_in(dir.path()));
        assert!(use_case.test::<NdArray>(&Default::default()).is_err());
    }
}
