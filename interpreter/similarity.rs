use std::collections::{BTreeMap, BTreeSet};

use crate::lexicon::is_english_stop_word;

/// Cosine similarity between two texts in a TF-IDF space built from exactly
/// those two texts.
///
/// The corpus is the pair itself, so the score is a relative ranking signal,
/// not a calibrated probability. Matches the reference vectoriser: word
/// tokens of at least two characters, lowercased, english stop words
/// removed, smoothed idf `ln((1+n)/(1+df)) + 1`, l2-normalised vectors.
///
/// Degenerate inputs (empty after stop-word removal, zero vectors) return 0
/// rather than failing.
#[must_use]
pub fn similarity(text_a: &str, text_b: &str) -> f64 {
    let tf_a = term_frequencies(text_a);
    let tf_b = term_frequencies(text_b);
    if tf_a.is_empty() || tf_b.is_empty() {
        return 0.0;
    }

    let vocabulary: BTreeSet<&String> = tf_a.keys().chain(tf_b.keys()).collect();
    let documents = 2.0_f64;

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for term in vocabulary {
        let count_a = tf_a.get(term).copied().unwrap_or(0.0);
        let count_b = tf_b.get(term).copied().unwrap_or(0.0);
        let document_frequency = f64::from(u8::from(count_a > 0.0) + u8::from(count_b > 0.0));
        let idf = ((documents + 1.0) / (document_frequency + 1.0)).ln() + 1.0;
        let weight_a = count_a * idf;
        let weight_b = count_b * idf;
        dot += weight_a * weight_b;
        norm_a += weight_a * weight_a;
        norm_b += weight_b * weight_b;
    }

    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}

/// Raw term counts after tokenisation and stop-word removal.
fn term_frequencies(text: &str) -> BTreeMap<String, f64> {
    let mut counts = BTreeMap::new();
    for token in tokenize(text) {
        *counts.entry(token).or_insert(0.0) += 1.0;
    }
    counts
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !is_english_stop_word(token))
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_score_one() {
        let score = similarity("open whatsapp", "open whatsapp");
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("open whatsapp", ""), 0.0);
    }

    #[test]
    fn stop_word_only_inputs_score_zero() {
        assert_eq!(similarity("the a to", "open whatsapp"), 0.0);
    }

    #[test]
    fn disjoint_vocabularies_score_zero() {
        assert_eq!(similarity("play jazz", "weather forecast"), 0.0);
    }

    #[test]
    fn overlap_scores_between_zero_and_one() {
        let score = similarity("play some jazz music", "play rock music");
        assert!(score > 0.0 && score < 1.0);
    }

    #[test]
    fn overlap_ranks_above_weaker_overlap() {
        let strong = similarity("open whatsapp messenger", "whatsapp messenger");
        let weak = similarity("open whatsapp messenger", "telegram messenger");
        assert!(strong > weak);
    }

    #[test]
    fn short_tokens_are_ignored() {
        // Single-character tokens never enter the vocabulary.
        assert_eq!(similarity("a b c", "a b c"), 0.0);
    }
}
