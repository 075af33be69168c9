// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// One use case per exercise. Each one orchestrates the other
// layers to accomplish a specific goal (fit, compress, train,
// test, translate) and hands a report back to the CLI.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No result printing here (that's Layer 1); progress goes
//     through tracing
//   - No direct file parsing (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Every use case owns a serde Config struct whose Default holds
// the coursework constants. Use cases that train are generic
// over the Burn backend so tests can run them on the CPU.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

/// LAD regression of wine quality
pub mod regression_use_case;

/// Rank-k SVD image compression
pub mod compress_use_case;

/// CIFAR-10 classifiers: train, test, predict
pub mod classify_use_case;

/// Seq2seq translator: data preparation, train, test, translate
pub mod translate_use_case;
