// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
// Every model and numeric driver of the four exercises lives
// here. The other layers hand it plain data (samples, batches,
// images) and get back fits, scores or trained models.
//
// What's in this layer:
//
//   lad.rs                — Least-absolute-deviation regression
//                           posed as a linear program (minilp)
//
//   low_rank.rs           — Truncated SVD image compression
//                           and numerical rank (nalgebra)
//
//   norm.rs               — Batch-moment normalisation used by
//                           the MLP and CNN hidden layers
//
//   classifier.rs         — ImageClassifier trait, model kinds,
//                           cross-entropy and accuracy helpers
//   mlp.rs / cnn.rs /
//   softmax.rs            — The three CIFAR-10 architectures
//   classifier_trainer.rs — Shared train/evaluate loop
//
//   seq2seq.rs            — GRU encoder-decoder with attention
//                           and the masked sequence loss
//   nmt_trainer.rs        — Bucket-sampled training driver
//   decoder.rs            — Greedy decoding / Translator impl
//   bleu.rs               — Smoothed sentence BLEU
//
// Backends:
//   Training runs on Autodiff<Wgpu>, inference on plain Wgpu.
//   Every model and driver is generic over Backend, so the unit
//   tests run the same code on the CPU NdArray backend.
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

use burn::backend::{Autodiff, Wgpu};

/// Backend used for every training run
pub type TrainBackend = Autodiff<Wgpu>;

/// Backend used for test/predict/translate
pub type InferBackend = Wgpu;

/// LAD regression via linear programming
pub mod lad;

/// Rank-k SVD approximation of grayscale images
pub mod low_rank;

/// Batch-moment normalisation
pub mod norm;

/// Shared classifier trait and scoring helpers
pub mod classifier;

/// Fully-connected classifier
pub mod mlp;

/// Convolutional classifier
pub mod cnn;

/// Single-layer softmax baseline
pub mod softmax;

/// Classifier training and evaluation loop
pub mod classifier_trainer;

/// Attention seq2seq translator model
pub mod seq2seq;

/// Translator training driver
pub mod nmt_trainer;

/// Greedy decoding
pub mod decoder;

/// Sentence-level BLEU
pub mod bleu;
