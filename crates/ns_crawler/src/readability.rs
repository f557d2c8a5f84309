//! Flesch Reading Ease for article bodies.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref SENTENCE_END: Regex = Regex::new(r"[.?!]+").unwrap();
    static ref SILENT_SUFFIX: Regex = Regex::new(r"(?:[^laeiouy]es|ed|[^laeiouy]e)$").unwrap();
    static ref VOWEL_GROUP: Regex = Regex::new(r"[aeiouy]{1,2}").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadabilityError {
    #[error("text has no words to score")]
    NoWords,
}

/// Puts every sentence on its own line and separates words by one space.
///
/// A line break goes right after each run of `.`, `?` or `!`; the
/// punctuation stays in place.
pub fn format_for_readability(text: &str) -> String {
    SENTENCE_END
        .replace_all(text, "$0\n")
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Estimated syllables in one word. Never less than one.
pub fn count_syllables(word: &str) -> usize {
    let word: String = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if word.len() <= 3 {
        return 1;
    }
    let word = SILENT_SUFFIX.replace(&word, "");
    let word = word.strip_prefix('y').unwrap_or(&word);
    VOWEL_GROUP.find_iter(word).count().max(1)
}

fn is_word(token: &str) -> bool {
    token.chars().any(char::is_alphanumeric)
}

/// Flesch Reading Ease of text already run through [`format_for_readability`]:
/// sentences are lines, words are whitespace-separated tokens.
pub fn flesch_reading_ease(formatted: &str) -> Result<f64, ReadabilityError> {
    let mut sentences = 0usize;
    let mut words = 0usize;
    let mut syllables = 0usize;

    for line in formatted.lines() {
        let mut line_words = 0;
        for token in line.split_whitespace().filter(|t| is_word(t)) {
            line_words += 1;
            syllables += count_syllables(token);
        }
        if line_words > 0 {
            sentences += 1;
            words += line_words;
        }
    }

    if words == 0 {
        return Err(ReadabilityError::NoWords);
    }

    let words_per_sentence = words as f64 / sentences as f64;
    let syllables_per_word = syllables as f64 / words as f64;
    Ok(206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word)
}

/// Scores raw article bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadabilityScorer;

impl ReadabilityScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, body: &str) -> Result<f64, ReadabilityError> {
        flesch_reading_ease(&format_for_readability(body))
    }
}
