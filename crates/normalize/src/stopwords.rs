//! Per-language stopword lists
//!
//! Lists are kept sorted so lookup is a binary search. Matching is
//! case-insensitive; callers pass the word as it appears in the text.

use mnemos_core::Language;

const ENGLISH: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

const SPANISH: &[&str] = &[
    "a", "al", "algo", "como", "con", "contra", "cual", "cuando", "de", "del", "desde", "donde",
    "e", "el", "ella", "ellas", "ellos", "en", "entre", "era", "es", "esa", "ese", "eso", "esta",
    "este", "esto", "fue", "ha", "hay", "la", "las", "le", "les", "lo", "los", "mas", "me", "mi",
    "muy", "más", "ni", "no", "nos", "o", "para", "pero", "por", "porque", "que", "qué", "se",
    "ser", "si", "sin", "sobre", "son", "su", "sus", "sí", "también", "te", "tu", "un", "una",
    "uno", "unos", "y", "ya", "yo", "él",
];

const FRENCH: &[&str] = &[
    "a", "au", "aux", "avec", "ce", "ces", "cette", "dans", "de", "des", "du", "elle", "en",
    "est", "et", "eux", "il", "ils", "je", "la", "le", "les", "leur", "lui", "ma", "mais", "me",
    "mes", "moi", "mon", "ne", "nos", "notre", "nous", "on", "ou", "par", "pas", "pour", "qu",
    "que", "qui", "sa", "se", "ses", "son", "sont", "sur", "ta", "te", "tes", "toi", "ton", "tu",
    "un", "une", "vos", "votre", "vous", "y", "à", "été", "être",
];

const GERMAN: &[&str] = &[
    "aber", "als", "am", "an", "auch", "auf", "aus", "bei", "bin", "bis", "da", "das", "dass",
    "dem", "den", "der", "des", "die", "doch", "du", "ein", "eine", "einem", "einen", "einer",
    "eines", "er", "es", "für", "hat", "hatte", "ich", "ihr", "im", "in", "ist", "ja", "mit",
    "nach", "nicht", "noch", "nur", "oder", "sich", "sie", "sind", "so", "um", "und", "uns",
    "von", "vor", "war", "was", "wie", "wir", "zu", "zum", "zur", "über",
];

/// Stopword list for a language
pub fn list(language: Language) -> &'static [&'static str] {
    match language {
        Language::English => ENGLISH,
        Language::Spanish => SPANISH,
        Language::French => FRENCH,
        Language::German => GERMAN,
    }
}

/// Check if `word` is a stopword in `language`
pub fn is_stopword(word: &str, language: Language) -> bool {
    let words = list(language);
    if word.chars().any(|c| c.is_uppercase()) {
        words.binary_search(&word.to_lowercase().as_str()).is_ok()
    } else {
        words.binary_search(&word).is_ok()
    }
}
