//! Lexical primitives shared by the scorers.

/// Lowercase word tokens; periods stay attached to the word they follow
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Non-empty sentences, split on runs of terminal punctuation
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Syllable estimate from the number of vowel groups, at least one for any alphabetic word
pub fn estimate_syllables(word: &str) -> usize {
    let cleaned: Vec<char> = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect();
    if cleaned.is_empty() {
        return 0;
    }

    let is_vowel = |c: &char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
    let mut groups = 0;
    let mut in_group = false;
    for c in &cleaned {
        if is_vowel(c) {
            if !in_group {
                groups += 1;
            }
            in_group = true;
        } else {
            in_group = false;
        }
    }

    groups.max(1)
}

/// Word, sentence and syllable counts of a text
#[derive(Debug, Clone, PartialEq)]
pub struct TextStats {
    pub words: usize,
    pub sentences: usize,
    pub syllables: usize,
}

impl TextStats {
    pub fn from_text(text: &str) -> Self {
        let words = tokenize(text);
        Self {
            words: words.len(),
            sentences: split_sentences(text).len(),
            syllables: words.iter().map(|w| estimate_syllables(w)).sum(),
        }
    }

    /// Average words per sentence, with both counts floored at one
    pub fn average_sentence_length(&self) -> f64 {
        self.words.max(1) as f64 / self.sentences.max(1) as f64
    }

    /// Average syllables per word, with the word count floored at one
    pub fn average_syllables_per_word(&self) -> f64 {
        self.syllables as f64 / self.words.max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_strips_punctuation_but_keeps_periods() {
        assert_eq!(
            tokenize("Hello, World! It's 2024. Done."),
            vec!["hello", "world", "it", "s", "2024.", "done."]
        );
    }

    #[test]
    fn test_tokenize_empty_and_symbols() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ,;: !!").is_empty());
        assert_eq!(tokenize("café"), vec!["caf"]);
    }

    #[test]
    fn test_split_sentences() {
        assert_eq!(
            split_sentences("First one. Second one!! Third?  "),
            vec!["First one", "Second one", "Third"]
        );
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("...!?").is_empty());
    }

    #[test]
    fn test_estimate_syllables() {
        assert_eq!(estimate_syllables("cat"), 1);
        assert_eq!(estimate_syllables("banana"), 3);
        assert_eq!(estimate_syllables("queue"), 1);
        assert_eq!(estimate_syllables("rhythm"), 1);
        assert_eq!(estimate_syllables("psst"), 1);
        assert_eq!(estimate_syllables("2024."), 0);
        assert_eq!(estimate_syllables(""), 0);
    }

    #[test]
    fn test_text_stats() {
        let stats = TextStats::from_text("The cat sat. The dog ran away.");
        assert_eq!(stats.words, 7);
        assert_eq!(stats.sentences, 2);
        assert_eq!(stats.syllables, 8);
        assert!((stats.average_sentence_length() - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_text_stats_empty() {
        let stats = TextStats::from_text("");
        assert_eq!(stats.average_sentence_length(), 1.0);
        assert_eq!(stats.average_syllables_per_word(), 0.0);
    }
}
