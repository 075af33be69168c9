// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from files on disk to
// tensor-ready batches, one path per exercise:
//
//   regress:    winequality.csv ─► WineCsvLoader ─► split_at_count
//
//   compress:   any image ─► image_io::load_grayscale
//
//   classify:   CIFAR .bin batches ─► CifarLoader ─► CifarDataset
//                   │
//                   ▼
//               shuffled_prefix ─► ImageBatcher ─► ImageBatch
//
//   translate:  train.enc/.dec ─► Preprocessor ─► (vocab, infra)
//                   │
//                   ▼
//               *_ids.enc/.dec ─► ParallelCorpus ─► BucketedData
//                   │
//                   ▼
//               get_batch ─► SeqBatch ─► SeqBatcher ─► SeqTensors
//
// Each module is responsible for exactly one step.
// This makes each step independently testable and replaceable.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Reads the `;`-delimited wine quality table
pub mod wine_loader;

/// Splits a sample list at a fixed count
pub mod splitter;

/// Reads the CIFAR-10 binary release
pub mod cifar;

/// Reads and writes ordinary image files
pub mod image_io;

/// Implements Burn's Batcher trait to create image tensor batches
pub mod batcher;

/// Shuffle-and-take-prefix mini-batch sampling
pub mod sampler;

/// Sentence tokenizer for the translator
pub mod preprocessor;

/// Parallel id files and length buckets
pub mod corpus;

/// Padded, time-major batches for one bucket
pub mod seq_batcher;
