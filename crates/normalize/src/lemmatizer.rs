//! Rule-based English lemmatizer
//!
//! Irregular forms come from an exception table; regular inflections
//! (plural `-s`/`-es`/`-ies`, past `-ed`/`-ied`, progressive `-ing`) are
//! undone by suffix rules. Unlike the stemmer, output is always a word.
//!
//! Other languages have no lemmatizer; words pass through unchanged.

use mnemos_core::Language;

/// Sorted by inflected form
const EXCEPTIONS: &[(&str, &str)] = &[
    ("am", "be"),
    ("analyses", "analysis"),
    ("are", "be"),
    ("ate", "eat"),
    ("began", "begin"),
    ("begun", "begin"),
    ("being", "be"),
    ("best", "good"),
    ("better", "good"),
    ("bought", "buy"),
    ("brought", "bring"),
    ("built", "build"),
    ("came", "come"),
    ("caught", "catch"),
    ("children", "child"),
    ("coming", "come"),
    ("did", "do"),
    ("does", "do"),
    ("done", "do"),
    ("feet", "foot"),
    ("felt", "feel"),
    ("found", "find"),
    ("gave", "give"),
    ("geese", "goose"),
    ("giving", "give"),
    ("given", "give"),
    ("gone", "go"),
    ("got", "get"),
    ("had", "have"),
    ("has", "have"),
    ("having", "have"),
    ("indices", "index"),
    ("is", "be"),
    ("kept", "keep"),
    ("knew", "know"),
    ("known", "know"),
    ("left", "leave"),
    ("made", "make"),
    ("making", "make"),
    ("meant", "mean"),
    ("men", "man"),
    ("met", "meet"),
    ("mice", "mouse"),
    ("paid", "pay"),
    ("people", "person"),
    ("ran", "run"),
    ("said", "say"),
    ("saw", "see"),
    ("seen", "see"),
    ("sent", "send"),
    ("sold", "sell"),
    ("stored", "store"),
    ("taking", "take"),
    ("taken", "take"),
    ("taught", "teach"),
    ("teeth", "tooth"),
    ("thought", "think"),
    ("told", "tell"),
    ("took", "take"),
    ("understood", "understand"),
    ("using", "use"),
    ("was", "be"),
    ("went", "go"),
    ("were", "be"),
    ("women", "woman"),
    ("won", "win"),
    ("worse", "bad"),
    ("worst", "bad"),
    ("writing", "write"),
    ("written", "write"),
    ("wrote", "write"),
];

/// Endings after which a dropped `-ed`/`-ing` took a silent `e` with it
const E_RESTORING: &[&str] = &["at", "iz", "us", "bl", "ur", "v", "c", "g"];

/// Lemmatize `word` for `language`
///
/// Expects lowercase input.
pub fn lemmatize(word: &str, language: Language) -> String {
    match language {
        Language::English => lemmatize_english(word),
        _ => word.to_string(),
    }
}

fn lemmatize_english(word: &str) -> String {
    if let Ok(i) = EXCEPTIONS.binary_search_by(|(form, _)| form.cmp(&word)) {
        return EXCEPTIONS[i].1.to_string();
    }
    if word.len() <= 3 || !word.bytes().all(|b| b.is_ascii_lowercase()) {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    if let Some(stem) = word.strip_suffix("ied") {
        return format!("{}y", stem);
    }
    for ending in ["sses", "shes", "ches", "xes", "zes"] {
        if word.ends_with(ending) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix('s') {
        return stem.to_string();
    }
    if let Some(stem) = word.strip_suffix("ed") {
        if stem.len() >= 2 {
            return undo_inflection(stem);
        }
    }
    if let Some(stem) = word.strip_suffix("ing") {
        if stem.len() >= 3 && stem.bytes().any(is_vowel) {
            return undo_inflection(stem);
        }
    }
    word.to_string()
}

fn is_vowel(b: u8) -> bool {
    matches!(b, b'a' | b'e' | b'i' | b'o' | b'u')
}

fn undo_inflection(stem: &str) -> String {
    let bytes = stem.as_bytes();
    let n = bytes.len();
    if n >= 2 && bytes[n - 1] == bytes[n - 2] && !is_vowel(bytes[n - 1]) {
        // stopped -> stop, but keep fill / pass / buzz
        if !matches!(bytes[n - 1], b'l' | b's' | b'z') {
            return stem[..n - 1].to_string();
        }
        return stem.to_string();
    }
    if E_RESTORING.iter().any(|ending| stem.ends_with(ending)) {
        return format!("{}e", stem);
    }
    stem.to_string()
}
