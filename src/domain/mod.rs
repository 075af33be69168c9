// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, enums and traits that name the concepts
// shared by the four exercises.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain data and the small algorithms that define it
//     (bucket assignment, vocabulary ids, label names)
//
// Keeping these pure means they can be unit tested without a
// device and reused by both the training and inference paths.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Length buckets for batching variable-length sentence pairs
pub mod bucket;

// Fixed CIFAR-10 label set
pub mod labels;

// Plain training examples (wine rows, images, sentence pairs)
pub mod sample;

// Reserved vocabulary ids shared by the translator
pub mod vocab;

// Core abstractions (traits) that other layers implement
pub mod traits;
