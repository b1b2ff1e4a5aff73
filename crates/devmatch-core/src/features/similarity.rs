//! String similarity measures used by the pair features

use std::collections::BTreeMap;

/// N-gram sizes of the `char_wb` analyzer
const NGRAM_MIN: usize = 2;
const NGRAM_MAX: usize = 4;

/// Jaro-Winkler similarity in [0, 1]
///
/// Two empty strings are identical (1.0).
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    // canonical argument order keeps the score symmetric
    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    strsim::jaro_winkler(a, b)
}

/// Cosine similarity of character n-gram TF-IDF vectors fitted on just `a` and `b`
///
/// Both strings blank gives 0.0; one blank side gives a zero vector and so 0.0.
pub fn tfidf_cosine(a: &str, b: &str) -> f64 {
    if a.trim().is_empty() && b.trim().is_empty() {
        return 0.0;
    }

    let counts_a = term_counts(a);
    let counts_b = term_counts(b);

    // Smoothed idf over a two-document corpus
    let n_docs = 2.0_f64;
    let idf = |term: &str| {
        let df = [&counts_a, &counts_b]
            .iter()
            .filter(|counts| counts.contains_key(term))
            .count() as f64;
        ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
    };

    let weights_a: BTreeMap<&str, f64> = counts_a
        .iter()
        .map(|(term, count)| (term.as_str(), count * idf(term.as_str())))
        .collect();
    let weights_b: BTreeMap<&str, f64> = counts_b
        .iter()
        .map(|(term, count)| (term.as_str(), count * idf(term.as_str())))
        .collect();

    let norm_a = weights_a.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b = weights_b.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let dot: f64 = weights_a
        .iter()
        .filter_map(|(term, wa)| weights_b.get(term).map(|wb| wa * wb))
        .sum();

    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// Word-bounded character n-grams with their counts
///
/// Each whitespace token is padded with one space on both sides. A padded
/// token no longer than the n-gram size contributes itself once and ends
/// the n-gram loop for that token.
fn term_counts(text: &str) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<String, f64> = BTreeMap::new();
    let lowered = text.to_lowercase();

    for word in lowered.split_whitespace() {
        let padded: Vec<char> = std::iter::once(' ')
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();

        for n in NGRAM_MIN..=NGRAM_MAX {
            if padded.len() <= n {
                *counts.entry(padded.iter().collect()).or_default() += 1.0;
                break;
            }
            for window in padded.windows(n) {
                *counts.entry(window.iter().collect()).or_default() += 1.0;
            }
        }
    }

    counts
}

/// `1 - |len a - len b| / max(len a, len b)`, 0.0 when both are empty
pub fn length_similarity(a: &str, b: &str) -> f64 {
    let la = a.chars().count();
    let lb = b.chars().count();
    let longest = la.max(lb);
    if longest == 0 {
        return 0.0;
    }
    1.0 - la.abs_diff(lb) as f64 / longest as f64
}
