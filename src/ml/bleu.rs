// ============================================================
// Layer 5 — Sentence BLEU
// ============================================================
// BLEU-4 for a single hypothesis against a single reference,
// uniform weights (0.25 each), with "method1" smoothing:
//
//   p_n = max(matches_n, ε) / max(1, hyp_ngrams_n)   ε = 0.1
//         (ε only replaces a zero numerator)
//   BLEU = BP · exp(Σ 0.25 · ln p_n)
//   BP   = 1                  if c > r
//          exp(1 - r / c)     if 0 < c ≤ r
//          0                  if c = 0
//
// Matches are clipped: an n-gram counts at most as often as it
// appears in the reference. A hypothesis sharing no unigram with
// the reference scores 0.
//
// Reference: Papineni et al. (2002) BLEU
//            Chen & Cherry (2014) smoothing method 1

use std::collections::HashMap;
use std::hash::Hash;

const MAX_ORDER: usize = 4;
const SMOOTHING_EPSILON: f64 = 0.1;

fn ngram_counts<T: Eq + Hash>(tokens: &[T], n: usize) -> HashMap<&[T], usize> {
    let mut counts = HashMap::new();
    if tokens.len() >= n {
        for gram in tokens.windows(n) {
            *counts.entry(gram).or_insert(0) += 1;
        }
    }
    counts
}

/// Clipped n-gram matches and the hypothesis n-gram total
fn modified_precision<T: Eq + Hash>(reference: &[T], hypothesis: &[T], n: usize) -> (usize, usize) {
    let reference_counts = ngram_counts(reference, n);
    let hypothesis_counts = ngram_counts(hypothesis, n);

    let matches = hypothesis_counts
        .iter()
        .map(|(gram, &count)| count.min(reference_counts.get(gram).copied().unwrap_or(0)))
        .sum();
    let total = hypothesis_counts.values().sum();
    (matches, total)
}

/// Smoothed sentence-level BLEU-4 in 0..=1.
pub fn sentence_bleu<T: Eq + Hash>(reference: &[T], hypothesis: &[T]) -> f64 {
    let c = hypothesis.len();
    let r = reference.len();
    if c == 0 {
        return 0.0;
    }

    let mut log_sum = 0.0;
    for n in 1..=MAX_ORDER {
        let (matches, total) = modified_precision(reference, hypothesis, n);
        if n == 1 && matches == 0 {
            return 0.0;
        }
        let numerator = if matches == 0 { SMOOTHING_EPSILON } else { matches as f64 };
        let precision = numerator / total.max(1) as f64;
        log_sum += precision.ln() / MAX_ORDER as f64;
    }

    let brevity_penalty = if c > r { 1.0 } else { (1.0 - r as f64 / c as f64).exp() };
    brevity_penalty * log_sum.exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<&str> {
        s.split_whitespace().collect()
    }

    #[test]
    fn test_identical_sentences_score_one() {
        let s = words("the cat sat on the mat");
        assert!((sentence_bleu(&s, &s) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_disjoint_sentences_score_zero() {
        assert_eq!(sentence_bleu(&words("a b c d"), &words("w x y z")), 0.0);
    }

    #[test]
    fn test_empty_hypothesis_scores_zero() {
        let empty: Vec<&str> = Vec::new();
        assert_eq!(sentence_bleu(&words("a b c"), &empty), 0.0);
    }

    #[test]
    fn test_short_identical_sentence_is_smoothed() {
        // No 4-grams exist: p4 = 0.1 / 1, everything else is 1
        let s = [1u32, 2, 3];
        let expected = 0.1f64.powf(0.25);
        assert!((sentence_bleu(&s, &s) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_brevity_penalty_applies_to_short_hypothesis() {
        let reference = words("one two three four five six seven eight");
        let hypothesis = words("one two three four");
        let expected = (1.0f64 - 8.0 / 4.0).exp();
        assert!((sentence_bleu(&reference, &hypothesis) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_words_are_clipped() {
        // "the" appears once in the reference, so only one of
        // the hypothesis' seven counts
        let (matches, total) = modified_precision(&words("the cat"), &words("the the the the the the the"), 1);
        assert_eq!((matches, total), (1, 7));
    }
}
