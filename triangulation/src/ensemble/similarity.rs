//! Lexical similarity between free-text summaries
//!
//! Different models paraphrase the same facts, so the score leans on shared
//! vocabulary (word and bigram overlap) more than on raw character
//! alignment:
//!
//! ```text
//! similarity = 0.2 * sequence + 0.4 * word_jaccard + 0.4 * bigram_jaccard
//! ```
//!
//! The sequence component is the Ratcliff/Obershelp ratio over the
//! normalized character sequences. Everything here is pure and
//! deterministic.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::LazyLock;

/// Bracketed headers such as `[GPT-4o]` or `[Model Name]`.
static BRACKETED_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]]*\]").expect("BRACKETED_HEADER_RE regex should compile")
});

/// `Summary:` / `Analysis:` labels at the start of a line.
static LEADING_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:summary|analysis)\s*:\s*")
        .expect("LEADING_LABEL_RE regex should compile")
});

const SEQUENCE_WEIGHT: f64 = 0.2;
const WORD_WEIGHT: f64 = 0.4;
const BIGRAM_WEIGHT: f64 = 0.4;

/// Strip boilerplate and collapse whitespace
pub fn normalize(text: &str) -> String {
    let without_headers = BRACKETED_HEADER_RE.replace_all(text, " ");
    let without_labels = LEADING_LABEL_RE.replace_all(&without_headers, "");
    let words: Vec<&str> = without_labels.split_whitespace().collect();
    words.join(" ")
}

/// Per-component similarity scores for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityBreakdown {
    pub sequence: f64,
    pub word: f64,
    pub bigram: f64,
    pub combined: f64,
}

/// Scores how similar two summaries are, in `[0, 1]`
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSimilarityScorer;

impl TextSimilarityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Combined similarity in `[0, 1]`
    pub fn similarity(&self, text1: &str, text2: &str) -> f64 {
        self.breakdown(text1, text2).combined
    }

    /// Similarity with each component exposed
    pub fn breakdown(&self, text1: &str, text2: &str) -> SimilarityBreakdown {
        let a = normalize(text1);
        let b = normalize(text2);

        let sequence = sequence_ratio(&a, &b);

        let a_lower = a.to_lowercase();
        let b_lower = b.to_lowercase();
        let a_words: Vec<&str> = a_lower.split_whitespace().collect();
        let b_words: Vec<&str> = b_lower.split_whitespace().collect();

        let a_set: HashSet<&str> = a_words.iter().copied().collect();
        let b_set: HashSet<&str> = b_words.iter().copied().collect();
        let word = jaccard(&a_set, &b_set);
        let bigram = jaccard(&bigrams(&a_words), &bigrams(&b_words));

        let weighted = SEQUENCE_WEIGHT * sequence + WORD_WEIGHT * word + BIGRAM_WEIGHT * bigram;
        let combined = weighted.clamp(0.0, 1.0);

        SimilarityBreakdown {
            sequence,
            word,
            bigram,
            combined,
        }
    }
}

/// Ratcliff/Obershelp ratio: `2 * matched / (len_a + len_b)`.
///
/// Inputs are put in a canonical order first so that tie-breaking between
/// equally long matching blocks cannot make the ratio asymmetric.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let mut a: Vec<char> = a.chars().collect();
    let mut b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    if (a.len(), &a) > (b.len(), &b) {
        std::mem::swap(&mut a, &mut b);
    }

    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

/// Total size of the recursively found longest matching blocks
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, ch) in b.iter().enumerate() {
        b2j.entry(*ch).or_default().push(j);
    }

    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }

    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`, earliest first.
///
/// Returns `(start_in_a, start_in_b, length)`.
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);
    // j -> length of the match ending at a[i - 1], b[j]
    let mut run_lengths: HashMap<usize, usize> = HashMap::new();

    for (i, ch) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next_runs = HashMap::new();
        if let Some(positions) = b2j.get(ch) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let previous = if j > 0 {
                    run_lengths.get(&(j - 1)).copied().unwrap_or(0)
                } else {
                    0
                };
                let len = previous + 1;
                next_runs.insert(j, len);
                if len > best_len {
                    best_i = i + 1 - len;
                    best_j = j + 1 - len;
                    best_len = len;
                }
            }
        }
        run_lengths = next_runs;
    }

    (best_i, best_j, best_len)
}

fn bigrams<'a>(words: &[&'a str]) -> HashSet<(&'a str, &'a str)> {
    words.windows(2).map(|pair| (pair[0], pair[1])).collect()
}

/// Jaccard index; both empty is identical, one empty shares nothing
fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) => {
            let intersection = a.intersection(b).count();
            let union = a.len() + b.len() - intersection;
            intersection as f64 / union as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_normalize_strips_boilerplate() {
        assert_eq!(
            normalize("[GPT-4o]\nSummary:   Candidate   supports\n\tschools "),
            "Candidate supports schools"
        );
        assert_eq!(
            normalize("ANALYSIS: Strong record\nsummary : on transit"),
            "Strong record on transit"
        );
    }

    #[test]
    fn test_normalize_keeps_inline_label_words() {
        // Only labels at the start of a line are stripped
        assert_eq!(
            normalize("The summary: taxes go up"),
            "The summary: taxes go up"
        );
    }

    #[test]
    fn test_sequence_ratio_known_values() {
        assert!(approx(sequence_ratio("", ""), 1.0));
        assert!(approx(sequence_ratio("abc", ""), 0.0));
        assert!(approx(sequence_ratio("abcd", "abcd"), 1.0));
        // "abcd" vs "bcde": block "bcd" -> 2 * 3 / 8
        assert!(approx(sequence_ratio("abcd", "bcde"), 0.75));
        // 48 shared characters out of 48 + 56
        assert!(approx(
            sequence_ratio(
                "Candidate supports expanding healthcare coverage",
                "Candidate supports expanding healthcare coverage for all"
            ),
            96.0 / 104.0
        ));
    }

    #[test]
    fn test_jaccard_special_cases() {
        let empty: HashSet<&str> = HashSet::new();
        let one: HashSet<&str> = ["tax"].into_iter().collect();
        let two: HashSet<&str> = ["tax", "cuts"].into_iter().collect();

        assert_eq!(jaccard(&empty, &empty), 1.0);
        assert_eq!(jaccard(&empty, &one), 0.0);
        assert_eq!(jaccard(&one, &empty), 0.0);
        assert!(approx(jaccard(&one, &two), 0.5));
    }

    #[test]
    fn test_identical_text_scores_one() {
        let scorer = TextSimilarityScorer::new();
        let text = "Candidate supports expanding healthcare coverage";
        let b = scorer.breakdown(text, text);
        assert!(approx(b.sequence, 1.0));
        assert!(approx(b.word, 1.0));
        assert!(approx(b.bigram, 1.0));
        assert!(approx(b.combined, 1.0));
    }

    #[test]
    fn test_boilerplate_does_not_affect_similarity() {
        let scorer = TextSimilarityScorer::new();
        let score = scorer.similarity(
            "[claude-3.5] Summary: Candidate backs a higher minimum wage",
            "Candidate backs a higher minimum wage",
        );
        assert!(approx(score, 1.0));
    }

    #[test]
    fn test_case_only_differences_keep_lexical_overlap() {
        let scorer = TextSimilarityScorer::new();
        let b = scorer.breakdown("Supports Renewable Energy", "supports renewable energy");
        assert!(approx(b.word, 1.0));
        assert!(approx(b.bigram, 1.0));
        assert!(b.sequence < 1.0);
    }

    #[test]
    fn test_paraphrase_clears_agreement_threshold() {
        let scorer = TextSimilarityScorer::new();
        let b = scorer.breakdown(
            "Candidate supports expanding healthcare coverage",
            "The candidate supports expanding healthcare coverage",
        );
        // One extra word: 5 of 6 words, 4 of 5 bigrams
        assert!(approx(b.word, 5.0 / 6.0));
        assert!(approx(b.bigram, 0.8));
        assert!(b.combined > 0.8, "paraphrase score too low: {}", b.combined);
    }

    #[test]
    fn test_unrelated_texts_score_low() {
        let scorer = TextSimilarityScorer::new();
        let score = scorer.similarity(
            "Candidate supports expanding healthcare coverage",
            "Opponent focuses on tax policy",
        );
        assert!(score < 0.3, "unrelated score too high: {score}");
    }

    #[test]
    fn test_empty_against_text() {
        let scorer = TextSimilarityScorer::new();
        let b = scorer.breakdown("", "Candidate supports schools");
        assert_eq!(b.sequence, 0.0);
        assert_eq!(b.word, 0.0);
        assert_eq!(b.bigram, 0.0);
        assert_eq!(b.combined, 0.0);
    }

    #[test]
    fn test_single_words_share_empty_bigram_sets() {
        let scorer = TextSimilarityScorer::new();
        let b = scorer.breakdown("yes", "no");
        assert_eq!(b.word, 0.0);
        assert_eq!(b.bigram, 1.0);
    }
}
