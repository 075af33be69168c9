// ============================================================
// Layer 4 — Sentence Preprocessor
// ============================================================
// Turns one raw sentence into the list of word tokens the
// translator's vocabulary is built from.
//
// Cleaning steps (applied in order):
//   1. Remove markup left in the corpus: <u>, </u>, [ and ]
//   2. Lowercase and split on whitespace
//   3. Inside each fragment, isolate punctuation and digits
//      as their own tokens:  . , ! ? " ' ( ) * + - / : ; < >
//   4. Replace every digit with '#', so all numbers of the
//      same length share vocabulary entries
//
// Example:
//   "Hello, World! It's 2019."
//   → ["hello", ",", "world", "!", "it", "'", "s",
//      "#", "#", "#", "#", "."]
//
// Reference: Rust Book §8 (Strings in Rust)
//            Rust Book §13 (Iterators)

/// Markup fragments stripped before tokenising
const MARKUP: [&str; 4] = ["<u>", "</u>", "[", "]"];

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Split a sentence into word tokens.
    pub fn tokenize(&self, line: &str) -> Vec<String> {
        // ── Step 1: Strip markup ──────────────────────────────────────────────
        let mut text = line.to_string();
        for m in MARKUP {
            text = text.replace(m, "");
        }

        // ── Step 2-4: Split, isolate separators, normalise digits ─────────────
        let mut tokens = Vec::new();
        for fragment in text.trim().to_lowercase().split_whitespace() {
            let mut current = String::new();
            for c in fragment.chars() {
                if is_separator(c) {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                    tokens.push(normalize(c).to_string());
                } else {
                    current.push(normalize(c));
                }
            }
            if !current.is_empty() {
                tokens.push(current);
            }
        }
        tokens
    }
}

/// Digits become '#'
fn normalize(c: char) -> char {
    if c.is_ascii_digit() {
        '#'
    } else {
        c
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Characters that always form a token on their own.
/// Digits are included: the split set spans the ASCII range ' to <.
fn is_separator(c: char) -> bool {
    matches!(
        c,
        '.' | ',' | '!' | '?' | '"' | '\'' | '(' | ')' | '*' | '+' | '-' | '/' | ':' | ';' | '<' | '>'
    ) || c.is_ascii_digit()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_splits_punctuation() {
        let p = Preprocessor::new();
        assert_eq!(
            p.tokenize("Hello, World!"),
            vec!["hello", ",", "world", "!"]
        );
    }

    #[test]
    fn test_apostrophes_are_isolated() {
        let p = Preprocessor::new();
        assert_eq!(p.tokenize("it's"), vec!["it", "'", "s"]);
    }

    #[test]
    fn test_digits_become_hash_tokens() {
        let p = Preprocessor::new();
        assert_eq!(p.tokenize("in 2019."), vec!["in", "#", "#", "#", "#", "."]);
        assert_eq!(p.tokenize("x42"), vec!["x", "#", "#"]);
    }

    #[test]
    fn test_strips_markup() {
        let p = Preprocessor::new();
        assert_eq!(p.tokenize("<u>very</u> [good]"), vec!["very", "good"]);
    }

    #[test]
    fn test_empty_string() {
        let p = Preprocessor::new();
        assert!(p.tokenize("   ").is_empty());
    }
}
