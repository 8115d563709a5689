//! Text normalization for Mnemos
//!
//! A [`Normalizer`] applies a [`NormalizationConfig`] to text before it is
//! handed to the external embedder. Steps run in a fixed order:
//!
//! 1. lowercase
//! 2. punctuation removal
//! 3. stopword removal
//! 4. lemmatization, or stemming when lemmatization is off
//! 5. whitespace collapse
//!
//! The same input and config always produce the same output, and
//! [`fingerprint`] identifies a config so stored records can tell which
//! policy last processed them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fingerprint;
pub mod lemmatizer;
pub mod pipeline;
pub mod stemmer;
pub mod stopwords;

pub use fingerprint::fingerprint;
pub use mnemos_core::{Language, NormalizationConfig};
pub use pipeline::{normalize_text, Normalizer};
