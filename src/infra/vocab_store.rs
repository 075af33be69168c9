// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Builds, saves and loads the translator's two vocabularies
// (encoder = English, decoder = Vietnamese).
//
// Files written per side into the data directory:
//   vocab.enc / vocab.dec                    ← one word per line, line = id
//   tokenizer.enc.json / tokenizer.dec.json  ← HuggingFace WordLevel tokenizer
//
// The plain vocab file is the inverse lookup (id → word) used
// when printing translations. The tokenizer JSON does the
// forward lookup (word → id), with unknown words falling back
// to <unk>. Tokens reach the tokenizer already split by the
// Preprocessor, so a WhitespaceSplit pre-tokenizer is enough.
//
// Reference: tokenizers crate documentation (WordLevel model)

use anyhow::{anyhow, ensure, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

use crate::domain::vocab::{Side, SPECIAL_TOKENS, UNK_ID, UNK_TOKEN};

/// A loaded vocabulary: inverse word list plus forward tokenizer
pub struct Vocabulary {
    words: Vec<String>,
    tokenizer: Tokenizer,
}

impl Vocabulary {
    /// Number of ids, special tokens included
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Word for an id, or <unk> if the id is out of range
    pub fn word(&self, id: u32) -> &str {
        self.words
            .get(id as usize)
            .map(String::as_str)
            .unwrap_or(UNK_TOKEN)
    }

    /// Map pre-split tokens to ids
    pub fn ids(&self, tokens: &[String]) -> Result<Vec<u32>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let encoding = self
            .tokenizer
            .encode(tokens.join(" "), false)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;
        Ok(encoding.get_ids().to_vec())
    }

    /// Join the words for a list of ids with spaces
    pub fn sentence(&self, ids: &[u32]) -> String {
        ids.iter()
            .map(|&id| self.word(id))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub struct VocabStore {
    dir: PathBuf,
}

impl VocabStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn vocab_path(&self, side: Side) -> PathBuf {
        self.dir.join(format!("vocab.{}", side.extension()))
    }

    fn tokenizer_path(&self, side: Side) -> PathBuf {
        self.dir.join(format!("tokenizer.{}.json", side.extension()))
    }

    /// True once both vocabularies have been written
    pub fn exists(&self) -> bool {
        self.vocab_path(Side::Encoder).exists() && self.vocab_path(Side::Decoder).exists()
    }

    /// Count words over tokenised sentences, write the vocab
    /// files and return the loaded Vocabulary.
    ///
    /// Words are ordered by descending count; equal counts keep
    /// the order in which the words first appeared. Words seen
    /// fewer than `threshold` times are left out.
    pub fn build(&self, side: Side, sentences: &[Vec<String>], threshold: usize) -> Result<Vocabulary> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let words = rank_words(sentences, threshold);

        let mut lines: Vec<String> = SPECIAL_TOKENS.iter().map(|s| s.to_string()).collect();
        lines.extend(words);

        let vocab_path = self.vocab_path(side);
        fs::write(&vocab_path, lines.join("\n") + "\n")
            .with_context(|| format!("Cannot write '{}'", vocab_path.display()))?;

        write_tokenizer_json(&self.tokenizer_path(side), &lines)?;

        tracing::info!(
            "Built {} vocabulary with {} entries at '{}'",
            side.extension(),
            lines.len(),
            vocab_path.display()
        );
        self.load(side)
    }

    /// Load a previously built vocabulary
    pub fn load(&self, side: Side) -> Result<Vocabulary> {
        let vocab_path = self.vocab_path(side);
        let text = fs::read_to_string(&vocab_path).with_context(|| {
            format!("Cannot read vocabulary '{}'", vocab_path.display())
        })?;
        let words: Vec<String> = text.lines().map(str::to_string).collect();
        ensure!(
            words.len() >= SPECIAL_TOKENS.len()
                && words[..SPECIAL_TOKENS.len()].iter().map(String::as_str).eq(SPECIAL_TOKENS),
            "Vocabulary '{}' does not start with the reserved tokens",
            vocab_path.display()
        );

        let tok_path = self.tokenizer_path(side);
        if !tok_path.exists() {
            // Vocab files copied in without their tokenizer: regenerate it
            write_tokenizer_json(&tok_path, &words)?;
        }
        let tokenizer = Tokenizer::from_file(&tok_path).map_err(|e| {
            anyhow!("Cannot load tokenizer from '{}': {}", tok_path.display(), e)
        })?;
        ensure!(
            tokenizer.token_to_id(UNK_TOKEN) == Some(UNK_ID),
            "Tokenizer '{}' must map {UNK_TOKEN} to id {UNK_ID}",
            tok_path.display()
        );

        Ok(Vocabulary { words, tokenizer })
    }
}

/// Words ordered by descending frequency, first-seen order on ties
fn rank_words(sentences: &[Vec<String>], threshold: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();

    for token in sentences.iter().flatten() {
        let count = counts.entry(token.as_str()).or_insert_with(|| {
            first_seen.push(token.as_str());
            0
        });
        *count += 1;
    }

    // sort_by is stable, so ties stay in first-seen order
    first_seen.sort_by(|a, b| counts[b].cmp(&counts[a]));
    first_seen
        .into_iter()
        .filter(|w| counts[w] >= threshold && !SPECIAL_TOKENS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Write a WordLevel tokenizer JSON in HuggingFace format.
/// `words[i]` gets id `i`.
fn write_tokenizer_json(path: &Path, words: &[String]) -> Result<()> {
    let vocab: serde_json::Map<String, serde_json::Value> = words
        .iter()
        .enumerate()
        .map(|(id, w)| (w.clone(), serde_json::json!(id)))
        .collect();

    let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
        .iter()
        .enumerate()
        .map(|(id, content)| {
            serde_json::json!({
                "id": id, "content": content, "single_word": false,
                "lstrip": false, "rstrip": false, "normalized": false, "special": true
            })
        })
        .collect();

    let tokenizer_json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": added_tokens,
        "normalizer": null,
        "pre_tokenizer": { "type": "WhitespaceSplit" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": vocab,
            "unk_token": UNK_TOKEN
        }
    });

    fs::write(path, serde_json::to_string_pretty(&tokenizer_json)?)
        .with_context(|| format!("Cannot write tokenizer JSON '{}'", path.display()))?;
    Ok(())
}
