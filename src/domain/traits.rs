// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// Each exercise reads from a different kind of source (a CSV
// table, CIFAR binary batches, parallel text files) but the
// application layer only needs "give me all the samples".
//
// Implementations:
//   - WineCsvLoader  → DatasetSource<Item = WineSample>
//   - CifarLoader    → DatasetSource<Item = LabeledImage>
//   - ParallelCorpus → DatasetSource<Item = SentencePair>
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Any component that can load every sample of one split.
pub trait DatasetSource {
    /// The sample type produced by this source
    type Item;

    /// Load all available samples from this source.
    fn load_all(&self) -> Result<Vec<Self::Item>>;
}

// ─── Translator ───────────────────────────────────────────────────────────────
/// Any component that turns a source-language sentence into a
/// target-language sentence.
///
/// Implementations:
///   - GreedyTranslator → seq2seq model with argmax decoding
pub trait Translator {
    /// Translate one sentence. Errors if the sentence cannot be
    /// handled (for example, it is longer than every bucket).
    fn translate(&self, sentence: &str) -> Result<String>;
}
