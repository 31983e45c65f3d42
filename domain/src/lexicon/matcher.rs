//! Phrase matching over normalized request text.

use crate::core::string::tokenize;

/// A request lowered and split into tokens, ready for phrase lookups.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    tokens: Vec<String>,
    char_count: usize,
}

impl NormalizedText {
    pub fn new(text: &str) -> Self {
        Self {
            tokens: tokenize(text),
            char_count: text.chars().count(),
        }
    }

    /// Length of the original request in characters.
    pub fn char_count(&self) -> usize {
        self.char_count
    }

    /// Whether `phrase` occurs as a contiguous token sequence.
    ///
    /// Each phrase word also matches its plural form (`deal` matches
    /// `deals`, `search` matches `searches`).
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        let words = tokenize(phrase);
        if words.is_empty() || words.len() > self.tokens.len() {
            return false;
        }

        self.tokens
            .windows(words.len())
            .any(|window| window.iter().zip(&words).all(|(t, w)| word_matches(t, w)))
    }

    pub fn contains_any<S: AsRef<str>>(&self, phrases: &[S]) -> bool {
        phrases.iter().any(|p| self.contains_phrase(p.as_ref()))
    }

    pub fn contains_all<S: AsRef<str>>(&self, phrases: &[S]) -> bool {
        phrases.iter().all(|p| self.contains_phrase(p.as_ref()))
    }
}

fn word_matches(token: &str, word: &str) -> bool {
    match token.strip_prefix(word) {
        Some("") | Some("s") | Some("es") => true,
        _ => false,
    }
}
