use crate::grid::DesiredLength;
use crate::text::{TextStats, split_sentences, tokenize};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

const COMPLETENESS_WEIGHT: f64 = 0.30;
const COHERENCE_WEIGHT: f64 = 0.25;
const REPETITION_WEIGHT: f64 = 0.15;
const READABILITY_WEIGHT: f64 = 0.10;
const LENGTH_FIT_WEIGHT: f64 = 0.10;
const STRUCTURE_WEIGHT: f64 = 0.10;

const MAX_KEYWORDS: usize = 15;
const COHERENCE_VARIANCE_SCALE: f64 = 50.0;
const STRUCTURE_SCALE: f64 = 6.0;
const NEUTRAL_LENGTH_FIT: f64 = 0.7;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "if", "when", "of", "to", "in", "for", "on", "with",
    "as", "by", "is", "are", "was", "were", "be", "been", "being", "this", "that", "these",
    "those", "it", "they", "them", "you", "your",
];

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,3}\s|^[A-Z].+:$").expect("valid heading pattern"));
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*+]\s|^\d+\.\s").expect("valid list pattern"));

/// Quality scores for one generated text, all in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub completeness: f64,
    pub coherence: f64,
    pub repetition: f64,
    pub readability: f64,
    pub length_fit: f64,
    pub structure: f64,
    pub composite: f64,
}

impl Metrics {
    /// Metric names paired with their values, composite first
    pub fn named_scores(&self) -> [(&'static str, f64); 7] {
        [
            ("composite", self.composite),
            ("completeness", self.completeness),
            ("coherence", self.coherence),
            ("repetition", self.repetition),
            ("readability", self.readability),
            ("lengthFit", self.length_fit),
            ("structure", self.structure),
        ]
    }
}

/// Score a generated text against the prompt it answers
pub fn compute_metrics(text: &str, prompt: &str, desired_length: Option<DesiredLength>) -> Metrics {
    let completeness = completeness_score(text, prompt);
    let coherence = coherence_score(text);
    let repetition = repetition_score(text);
    let readability = readability_score(text);
    let length_fit = length_fit_score(text, desired_length);
    let structure = structure_score(text);

    Metrics {
        completeness,
        coherence,
        repetition,
        readability,
        length_fit,
        structure,
        composite: composite_score(completeness, coherence, repetition, readability, length_fit, structure),
    }
}

/// Fixed weighted sum of the six sub-scores
pub fn composite_score(
    completeness: f64,
    coherence: f64,
    repetition: f64,
    readability: f64,
    length_fit: f64,
    structure: f64,
) -> f64 {
    clamp01(
        COMPLETENESS_WEIGHT * completeness
            + COHERENCE_WEIGHT * coherence
            + REPETITION_WEIGHT * repetition
            + READABILITY_WEIGHT * readability
            + LENGTH_FIT_WEIGHT * length_fit
            + STRUCTURE_WEIGHT * structure,
    )
}

/// Share of the prompt's keywords that appear in the text
pub fn completeness_score(text: &str, prompt: &str) -> f64 {
    let mut seen = HashSet::new();
    let keywords: Vec<String> = tokenize(prompt)
        .into_iter()
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(&w.as_str()))
        .filter(|w| seen.insert(w.clone()))
        .take(MAX_KEYWORDS)
        .collect();

    if keywords.is_empty() {
        return 0.5;
    }

    let words: HashSet<String> = tokenize(text).into_iter().collect();
    let covered = keywords.iter().filter(|k| words.contains(*k)).count();
    clamp01(covered as f64 / keywords.len() as f64)
}

/// Penalizes uneven sentence lengths
pub fn coherence_score(text: &str) -> f64 {
    let sentences = split_sentences(text);
    if sentences.len() <= 1 {
        return 0.5;
    }

    let lengths: Vec<f64> = sentences.iter().map(|s| tokenize(s).len() as f64).collect();
    let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
    let variance = lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / lengths.len() as f64;

    clamp01(1.0 - (variance / COHERENCE_VARIANCE_SCALE).min(1.0))
}

/// One minus the share of repeated 2-, 3- and 4-gram occurrences
pub fn repetition_score(text: &str) -> f64 {
    let words = tokenize(text);
    if words.len() < 4 {
        return 1.0;
    }

    let mut counts: HashMap<&[String], usize> = HashMap::new();
    for n in 2..=4 {
        for ngram in words.windows(n) {
            *counts.entry(ngram).or_insert(0) += 1;
        }
    }

    let repeated: usize = counts.values().filter(|&&c| c > 1).map(|c| c - 1).sum();
    clamp01(1.0 - repeated as f64 / words.len() as f64)
}

/// Reading-ease estimate scaled down by 100
pub fn readability_score(text: &str) -> f64 {
    let stats = TextStats::from_text(text);
    let ease = 206.835
        - 1.015 * stats.average_sentence_length()
        - 84.6 * stats.average_syllables_per_word();
    clamp01(ease / 100.0)
}

/// Closeness of the word count to the desired length class
pub fn length_fit_score(text: &str, desired_length: Option<DesiredLength>) -> f64 {
    let Some(desired) = desired_length else {
        return NEUTRAL_LENGTH_FIT;
    };

    let words = tokenize(text).len();
    let target = desired.target_words();
    clamp01(words.min(target) as f64 / words.max(target) as f64)
}

/// Rewards headings, list items and fenced code
pub fn structure_score(text: &str) -> f64 {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();
    let headings = lines.iter().filter(|l| HEADING.is_match(l)).count();
    let list_items = lines.iter().filter(|l| LIST_ITEM.is_match(l)).count();
    let code = usize::from(text.contains("```"));

    clamp01((headings + list_items + code) as f64 / STRUCTURE_SCALE)
}

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPT: &str = "Explain photosynthesis in simple terms";

    fn assert_unit(value: f64) {
        assert!((0.0..=1.0).contains(&value), "{} outside [0, 1]", value);
    }

    fn assert_all_unit(metrics: &Metrics) {
        for (_, value) in metrics.named_scores() {
            assert_unit(value);
        }
    }

    #[test]
    fn test_scores_bounded_for_edge_inputs() {
        let inputs = [
            "",
            " ",
            ".",
            "!!!???...",
            "a",
            "word word word word word word word word word word",
            "Supercalifragilisticexpialidocious antidisestablishmentarianism.",
            "# Title\n- one\n- two\n1. three\n```\ncode\n```\nSummary:\n",
            "日本語のテキスト",
        ];
        for input in inputs {
            for desired in [None, Some(DesiredLength::Short), Some(DesiredLength::Long)] {
                assert_all_unit(&compute_metrics(input, PROMPT, desired));
                assert_all_unit(&compute_metrics(input, "", desired));
            }
        }
    }

    #[test]
    fn test_composite_of_equal_scores() {
        let composite = composite_score(0.5, 0.5, 0.5, 0.5, 0.5, 0.5);
        assert!((composite - 0.5).abs() < 1e-9);
        assert!((composite_score(1.0, 1.0, 1.0, 1.0, 1.0, 1.0) - 1.0).abs() < 1e-9);
        assert_eq!(composite_score(0.0, 0.0, 0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_composite_matches_weighted_sum() {
        let metrics = compute_metrics(
            "Photosynthesis turns light into sugar. Plants use simple inputs.",
            PROMPT,
            Some(DesiredLength::Short),
        );
        let expected = 0.30 * metrics.completeness
            + 0.25 * metrics.coherence
            + 0.15 * metrics.repetition
            + 0.10 * metrics.readability
            + 0.10 * metrics.length_fit
            + 0.10 * metrics.structure;
        assert!((metrics.composite - expected).abs() < 1e-9);
    }

    #[test]
    fn test_metrics_are_deterministic() {
        let text = "Plants capture light. They make sugar from water and air.";
        assert_eq!(
            compute_metrics(text, PROMPT, Some(DesiredLength::Medium)),
            compute_metrics(text, PROMPT, Some(DesiredLength::Medium))
        );
    }

    #[test]
    fn test_completeness_counts_prompt_keywords() {
        // keywords: explain, photosynthesis, simple, terms
        let text = "Photosynthesis is simple: plants make food from light.";
        assert!((completeness_score(text, PROMPT) - 0.5).abs() < 1e-9);
        assert_eq!(completeness_score("explain simple terms photosynthesis", PROMPT), 1.0);
        assert_eq!(completeness_score("nothing relevant", PROMPT), 0.0);
    }

    #[test]
    fn test_completeness_without_keywords_is_neutral() {
        assert_eq!(completeness_score("anything", ""), 0.5);
        assert_eq!(completeness_score("anything", "is it the of to"), 0.5);
    }

    #[test]
    fn test_completeness_caps_keywords_at_fifteen() {
        let prompt = (1..=20)
            .map(|i| format!("keyword{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let text = (1..=15)
            .map(|i| format!("keyword{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(completeness_score(&text, &prompt), 1.0);
        assert_eq!(completeness_score("keyword16 keyword17", &prompt), 0.0);
    }

    #[test]
    fn test_completeness_deduplicates_keywords() {
        let prompt = "plants plants plants light";
        assert!((completeness_score("plants", prompt) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_coherence_single_sentence_is_neutral() {
        assert_eq!(coherence_score(""), 0.5);
        assert_eq!(coherence_score("Just one sentence here"), 0.5);
    }

    #[test]
    fn test_coherence_even_sentences_score_high() {
        assert_eq!(coherence_score("One two three. Four five six. Seven eight nine."), 1.0);
    }

    #[test]
    fn test_coherence_uneven_sentences_score_low() {
        let long = vec!["word"; 30].join(" ");
        let text = format!("Short. {}.", long);
        // lengths 1 and 30, variance 210.25
        assert_eq!(coherence_score(&text), 0.0);

        // lengths 2 and 12, variance 25
        let text = format!("Two words. {}.", vec!["word"; 12].join(" "));
        assert!((coherence_score(&text) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_repetition_short_text_is_perfect() {
        assert_eq!(repetition_score(""), 1.0);
        assert_eq!(repetition_score("the the the"), 1.0);
    }

    #[test]
    fn test_repetition_no_repeats() {
        assert_eq!(repetition_score("one two three four five"), 1.0);
    }

    #[test]
    fn test_repetition_penalizes_repeated_phrases() {
        // only the bigram "a b" repeats, once
        assert!((repetition_score("a b a b") - 0.75).abs() < 1e-9);
        assert_eq!(repetition_score("word word word word word word word word"), 0.0);
    }

    #[test]
    fn test_readability_simple_text_scores_higher() {
        let simple = readability_score("The cat sat. The dog ran. We had fun.");
        let dense = readability_score(
            "Photosynthetic organisms utilize electromagnetic radiation to synthesize carbohydrates.",
        );
        assert!(simple > dense);
        assert_eq!(simple, 1.0);
    }

    #[test]
    fn test_readability_empty_text() {
        // 206.835 - 1.015 * 1 = 205.82, clamped
        assert_eq!(readability_score(""), 1.0);
    }

    #[test]
    fn test_length_fit_neutral_without_class() {
        assert_eq!(length_fit_score("", None), 0.7);
        assert_eq!(length_fit_score("a b c", None), 0.7);
    }

    #[test]
    fn test_length_fit_ratio() {
        let text = vec!["word"; 60].join(" ");
        assert!((length_fit_score(&text, Some(DesiredLength::Short)) - 0.5).abs() < 1e-9);
        assert!((length_fit_score(&text, Some(DesiredLength::Medium)) - 0.2).abs() < 1e-9);

        let text = vec!["word"; 240].join(" ");
        assert!((length_fit_score(&text, Some(DesiredLength::Short)) - 0.5).abs() < 1e-9);
        assert_eq!(length_fit_score("", Some(DesiredLength::Long)), 0.0);
    }

    #[test]
    fn test_structure_counts_headings_lists_and_code() {
        assert_eq!(structure_score("plain prose without structure"), 0.0);

        let text = "# Overview\nSteps:\n- gather light\n* split water\n1. make sugar\n```\nco2 + h2o\n```";
        assert_eq!(structure_score(text), 1.0);

        let text = "## Title\r\n- item\r\n";
        assert!((structure_score(text) - 2.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_structure_rejects_near_misses() {
        // too many hashes, no space after marker, too short for a label
        assert_eq!(structure_score("#### deep\n-item\n1.item\nA:"), 0.0);
    }
}
