//! The normalization pipeline
//!
//! Text is split on UAX#29 word boundaries. Segments containing a letter
//! or digit are words; everything else is whitespace or punctuation.
//! Word-level steps (stopwords, lemmatization, stemming) rewrite or drop
//! word segments and leave the rest in place, so whitespace collapse
//! runs last and cleans up the gaps.

use std::borrow::Cow;

use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use mnemos_core::{Language, NormalizationConfig};

use crate::fingerprint::fingerprint;
use crate::{lemmatizer, stemmer, stopwords};

/// A normalization policy with its precomputed fingerprint
///
/// # Example
///
/// ```
/// use mnemos_normalize::{NormalizationConfig, Normalizer};
///
/// let normalizer = Normalizer::new(NormalizationConfig {
///     remove_stopwords: true,
///     stem: true,
///     ..Default::default()
/// });
/// assert_eq!(normalizer.normalize("The Running  Dogs!"), "run dog");
/// ```
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizationConfig,
    fingerprint: String,
}

impl Normalizer {
    /// Create a normalizer for `config`
    pub fn new(config: NormalizationConfig) -> Self {
        let fingerprint = fingerprint(&config);
        debug!(
            target: "mnemos::normalize",
            language = config.language.name(),
            fingerprint = %fingerprint,
            "Normalizer created"
        );
        if config.lemmatize && !has_lemmatizer(config.language) {
            debug!(
                target: "mnemos::normalize",
                language = config.language.name(),
                "No lemmatizer for language, words pass through"
            );
        }
        Normalizer {
            config,
            fingerprint,
        }
    }

    /// The policy this normalizer applies
    pub fn config(&self) -> &NormalizationConfig {
        &self.config
    }

    /// Fingerprint of the policy
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Normalize `text`
    pub fn normalize(&self, text: &str) -> String {
        normalize_text(text, &self.config)
    }
}

/// Normalize `text` with `config`
pub fn normalize_text(text: &str, config: &NormalizationConfig) -> String {
    let mut out: Cow<'_, str> = Cow::Borrowed(text);

    if config.to_lowercase {
        out = Cow::Owned(out.to_lowercase());
    }
    if config.remove_punctuation {
        out = Cow::Owned(strip_punctuation(&out));
    }
    if config.remove_stopwords {
        let language = config.language;
        out = Cow::Owned(map_words(&out, |word| {
            if stopwords::is_stopword(word, language) {
                None
            } else {
                Some(Cow::Borrowed(word))
            }
        }));
    }
    if config.lemmatize {
        let language = config.language;
        out = Cow::Owned(map_words(&out, |word| {
            Some(reduce(word, |w| lemmatizer::lemmatize(w, language)))
        }));
    } else if config.stem {
        let language = config.language;
        out = Cow::Owned(map_words(&out, |word| {
            Some(reduce(word, |w| stemmer::stem(w, language)))
        }));
    }
    if config.collapse_whitespace {
        out = Cow::Owned(out.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    out.into_owned()
}

fn is_word(segment: &str) -> bool {
    segment.chars().any(char::is_alphanumeric)
}

fn is_punctuation(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace()
}

/// Remove punctuation and symbols
///
/// Inside a word (`don't`, `U.S.A`) punctuation is dropped. Between two
/// words with no whitespace (`state-of-the-art`) it becomes one space.
fn strip_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut segments = text.split_word_bounds().peekable();

    while let Some(segment) = segments.next() {
        if is_word(segment) {
            out.extend(segment.chars().filter(|c| !is_punctuation(*c)));
        } else if segment.chars().all(char::is_whitespace) {
            out.push_str(segment);
        } else {
            let after_word = out.chars().last().map_or(false, |c| !c.is_whitespace());
            let before_word = segments.peek().map_or(false, |next| is_word(next));
            if after_word && before_word {
                out.push(' ');
            }
        }
    }
    out
}

/// Rewrite or drop (`None`) each word segment
fn map_words<'a, F>(text: &'a str, mut f: F) -> String
where
    F: FnMut(&'a str) -> Option<Cow<'a, str>>,
{
    let mut out = String::with_capacity(text.len());
    for segment in text.split_word_bounds() {
        if is_word(segment) {
            if let Some(word) = f(segment) {
                out.push_str(&word);
            }
        } else {
            out.push_str(segment);
        }
    }
    out
}

/// Apply a lowercase-input reducer, keeping the original word when the
/// reducer leaves it unchanged
fn reduce<'a>(word: &'a str, f: impl Fn(&str) -> String) -> Cow<'a, str> {
    let lower = word.to_lowercase();
    let reduced = f(&lower);
    if reduced == lower {
        Cow::Borrowed(word)
    } else {
        Cow::Owned(reduced)
    }
}

/// Languages with a real lemmatizer
pub fn has_lemmatizer(language: Language) -> bool {
    matches!(language, Language::English)
}
