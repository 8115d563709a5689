//! Normalization policy fingerprints
//!
//! A fingerprint is the SHA-256 (hex) of a canonical rendering of the
//! *effective* configuration: `stem` is ignored when `lemmatize` is set,
//! because only one of them runs. Records store the fingerprint of the
//! policy that produced their `normalized_text`.

use sha2::{Digest, Sha256};

use mnemos_core::NormalizationConfig;

/// Bumped whenever pipeline output changes for an unchanged config
const PIPELINE_VERSION: u32 = 1;

/// Canonical text form of the effective configuration
pub fn canonical(config: &NormalizationConfig) -> String {
    let flag = |b: bool| if b { '1' } else { '0' };
    format!(
        "v{}|lowercase={}|punctuation={}|stopwords={}|stem={}|lemmatize={}|whitespace={}|language={}",
        PIPELINE_VERSION,
        flag(config.to_lowercase),
        flag(config.remove_punctuation),
        flag(config.remove_stopwords),
        flag(config.stem && !config.lemmatize),
        flag(config.lemmatize),
        flag(config.collapse_whitespace),
        config.language.name(),
    )
}

/// Fingerprint of a normalization configuration
pub fn fingerprint(config: &NormalizationConfig) -> String {
    let digest = Sha256::digest(canonical(config).as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_core::Language;

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let config = NormalizationConfig::default();
        let a = fingerprint(&config);
        let b = fingerprint(&config.clone());
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_changes_with_config() {
        let base = NormalizationConfig::default();
        let stopwords = NormalizationConfig {
            remove_stopwords: true,
            ..base.clone()
        };
        let spanish = NormalizationConfig {
            language: Language::Spanish,
            ..base.clone()
        };
        assert_ne!(fingerprint(&base), fingerprint(&stopwords));
        assert_ne!(fingerprint(&base), fingerprint(&spanish));
    }

    #[test]
    fn test_stem_ignored_when_lemmatizing() {
        let lemma = NormalizationConfig {
            lemmatize: true,
            ..Default::default()
        };
        let both = NormalizationConfig {
            lemmatize: true,
            stem: true,
            ..Default::default()
        };
        assert_eq!(fingerprint(&lemma), fingerprint(&both));
    }
}
