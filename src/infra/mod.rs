// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles all cross-cutting concerns that don't belong in
// any specific business layer:
//
//   checkpoint.rs   — Saving and loading model weights
//                     Uses Burn's CompactRecorder to
//                     serialise model parameters to disk.
//                     Also saves/loads the run config as JSON
//                     so test/translate can rebuild the model,
//                     and the translator's global step.
//
//   vocab_store.rs  — Vocabulary persistence
//                     Builds the translator's vocabularies from
//                     the training corpus if none exist, or
//                     loads the saved ones. Ensures the same
//                     ids are used for training and inference.
//
//   metrics.rs      — Training metrics logging
//                     Appends evaluation and loss rows to a CSV
//                     file for later analysis and plotting.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Vocabulary building, saving, and loading
pub mod vocab_store;

/// Training metrics CSV logger
pub mod metrics;
