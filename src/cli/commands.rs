// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines one subcommand per exercise and all their flags:
//
//   regress                          LAD regression of wine quality
//   compress                         rank-k SVD image compression
//   classify train | test (predict)  CIFAR-10 classifiers
//   translate train | test | translate
//
// Every flag defaults to the coursework constant.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::{
    classify_use_case::ClassifyConfig, compress_use_case::CompressConfig,
    regression_use_case::RegressConfig, translate_use_case::TranslateConfig,
};
use crate::ml::classifier::ClassifierKind;

/// The top-level subcommands, one per exercise
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Least-absolute-deviation regression of wine quality, solved as a linear program
    Regress(RegressArgs),

    /// Compress an image with a truncated singular value decomposition
    Compress(CompressArgs),

    /// Train or test a CIFAR-10 image classifier
    Classify {
        #[command(subcommand)]
        mode: ClassifyMode,
    },

    /// Train, test or run the English to Vietnamese translator
    Translate {
        #[command(subcommand)]
        mode: TranslateMode,
    },
}

// ─── regress ──────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct RegressArgs {
    /// ';'-delimited CSV with a header row; the last column is the target
    #[arg(long, default_value = "winequality-red.csv")]
    pub data: String,

    /// Number of leading rows used to fit the line; the rest are the test split
    #[arg(long, default_value_t = 1500)]
    pub train_samples: usize,
}

impl From<RegressArgs> for RegressConfig {
    fn from(a: RegressArgs) -> Self {
        RegressConfig { data_path: a.data, train_samples: a.train_samples }
    }
}

// ─── compress ─────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Image to compress (any format the image crate reads)
    #[arg(long, default_value = "image.jpg")]
    pub image: String,

    /// Directory the two output PNGs are written to
    #[arg(long, default_value = ".")]
    pub output_dir: String,

    /// Number of singular values to keep
    #[arg(short = 'k', long = "rank", default_value_t = 50)]
    pub k: usize,
}

impl From<CompressArgs> for CompressConfig {
    fn from(a: CompressArgs) -> Self {
        CompressConfig { image_path: a.image, output_dir: a.output_dir, rank: a.k }
    }
}

// ─── classify ─────────────────────────────────────────────────────────────────
#[derive(Subcommand, Debug)]
pub enum ClassifyMode {
    /// Train a classifier and save it to the model directory
    Train(ClassifyTrainArgs),

    /// Score the saved classifier on the test set, or label one image
    #[command(alias = "predict")]
    Test(ClassifyTestArgs),
}

/// Architecture names accepted by --model
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ModelArg {
    /// 3072 → 2000 → 1000 → 10 fully-connected network
    Mlp,
    /// Three 5x5 convolutions, then 1000 → 1000 → 10
    Cnn,
    /// Single linear layer baseline
    Softmax,
}

impl From<ModelArg> for ClassifierKind {
    fn from(m: ModelArg) -> Self {
        match m {
            ModelArg::Mlp => ClassifierKind::Mlp,
            ModelArg::Cnn => ClassifierKind::Cnn,
            ModelArg::Softmax => ClassifierKind::Softmax,
        }
    }
}

#[derive(Args, Debug)]
pub struct ClassifyTrainArgs {
    #[arg(long, value_enum, default_value_t = ModelArg::Mlp)]
    pub model: ModelArg,

    /// Directory holding the CIFAR-10 binary batches
    #[arg(long, default_value = "cifar-10-batches-bin")]
    pub data_dir: String,

    #[arg(long, default_value = "model/classify")]
    pub model_dir: String,

    /// Training iterations (default depends on --model)
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Images per training batch (default depends on --model)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Evaluate on the test set every N iterations (default depends on --model)
    #[arg(long)]
    pub eval_every: Option<usize>,

    /// Test images scored per forward pass
    #[arg(long, default_value_t = 1000)]
    pub eval_batch_size: usize,

    /// Learning rate (default depends on --model)
    #[arg(long)]
    pub lr: Option<f64>,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl From<ClassifyTrainArgs> for ClassifyConfig {
    fn from(a: ClassifyTrainArgs) -> Self {
        let defaults = ClassifyConfig::for_model(a.model.into());
        ClassifyConfig {
            data_dir: a.data_dir,
            model_dir: a.model_dir,
            iterations: a.iterations.unwrap_or(defaults.iterations),
            batch_size: a.batch_size.unwrap_or(defaults.batch_size),
            eval_every: a.eval_every.unwrap_or(defaults.eval_every),
            // An explicit interval switches back to periodic evaluation
            final_eval_only: defaults.final_eval_only && a.eval_every.is_none(),
            eval_batch_size: a.eval_batch_size,
            learning_rate: a.lr.unwrap_or(defaults.learning_rate),
            seed: a.seed,
            ..defaults
        }
    }
}

#[derive(Args, Debug)]
pub struct ClassifyTestArgs {
    #[arg(long, default_value = "cifar-10-batches-bin")]
    pub data_dir: String,

    #[arg(long, default_value = "model/classify")]
    pub model_dir: String,

    #[arg(long, default_value_t = 1000)]
    pub eval_batch_size: usize,

    /// Classify this image instead of scoring the test set
    #[arg(long)]
    pub image: Option<PathBuf>,
}

impl From<&ClassifyTestArgs> for ClassifyConfig {
    fn from(a: &ClassifyTestArgs) -> Self {
        // The architecture is read back from the saved config
        ClassifyConfig {
            data_dir: a.data_dir.clone(),
            model_dir: a.model_dir.clone(),
            eval_batch_size: a.eval_batch_size,
            ..ClassifyConfig::default()
        }
    }
}

// ─── translate ────────────────────────────────────────────────────────────────
#[derive(Subcommand, Debug)]
pub enum TranslateMode {
    /// Train (or resume training) the translator
    Train(TranslateTrainArgs),

    /// Average sentence BLEU over the test set
    Test(TranslatePaths),

    /// Translate sentences typed on stdin
    Translate(TranslatePaths),
}

#[derive(Args, Debug, Clone)]
pub struct TranslatePaths {
    /// Raw parallel text; vocabularies and id files are written here too
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    #[arg(long, default_value = "model/translate")]
    pub model_dir: String,
}

#[derive(Args, Debug)]
pub struct TranslateTrainArgs {
    #[command(flatten)]
    pub paths: TranslatePaths,

    #[arg(long, default_value_t = 256)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 0.5)]
    pub lr: f64,

    /// Gradients are rescaled so their global norm stays below this
    #[arg(long, default_value_t = 5.0)]
    pub max_grad_norm: f32,

    /// Training stops once the global step reaches this value
    #[arg(long, default_value_t = 31401)]
    pub max_iteration: usize,

    #[arg(long, default_value_t = 100)]
    pub checkpoint_every: usize,

    #[arg(long, default_value_t = 1000)]
    pub print_every: usize,

    /// GRU width, also the embedding size
    #[arg(long, default_value_t = 256)]
    pub hidden_size: usize,

    #[arg(long, default_value_t = 3)]
    pub num_layers: usize,

    /// Words seen fewer times than this map to <unk>
    #[arg(long, default_value_t = 1)]
    pub threshold: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl From<TranslatePaths> for TranslateConfig {
    fn from(p: TranslatePaths) -> Self {
        TranslateConfig {
            data_dir: p.data_dir,
            model_dir: p.model_dir,
            ..TranslateConfig::default()
        }
    }
}

impl From<TranslateTrainArgs> for TranslateConfig {
    fn from(a: TranslateTrainArgs) -> Self {
        TranslateConfig {
            batch_size: a.batch_size,
            learning_rate: a.lr,
            max_grad_norm: a.max_grad_norm,
            max_iteration: a.max_iteration,
            checkpoint_every: a.checkpoint_every,
            print_every: a.print_every,
            hidden_size: a.hidden_size,
            num_layers: a.num_layers,
            threshold: a.threshold,
            seed: a.seed,
            ..TranslateConfig::from(a.paths)
        }
    }
}
