//! Stemmers
//!
//! English uses the Porter (1980) algorithm. Spanish, French and German
//! use a light stemmer that strips the longest known inflectional suffix
//! while keeping at least three characters of stem.
//!
//! Input is expected in lowercase. Words that are not plain ASCII are
//! returned unchanged by the Porter stemmer.

use mnemos_core::Language;

/// Stem `word` for `language`
pub fn stem(word: &str, language: Language) -> String {
    match language {
        Language::English => porter(word),
        Language::Spanish => strip_suffix(word, SPANISH_SUFFIXES),
        Language::French => strip_suffix(word, FRENCH_SUFFIXES),
        Language::German => strip_suffix(word, GERMAN_SUFFIXES),
    }
}

// ---------------------------------------------------------------------------
// Porter
// ---------------------------------------------------------------------------

/// Porter-stem an English word
pub fn porter(word: &str) -> String {
    if word.len() <= 2 || !word.bytes().all(|b| b.is_ascii_lowercase()) {
        return word.to_string();
    }

    let mut b = word.as_bytes().to_vec();
    step1a(&mut b);
    step1b(&mut b);
    step1c(&mut b);
    step2(&mut b);
    step3(&mut b);
    step4(&mut b);
    step5(&mut b);

    // Only ASCII bytes were pushed
    String::from_utf8(b).unwrap_or_else(|_| word.to_string())
}

fn is_consonant(b: &[u8], i: usize) -> bool {
    match b[i] {
        b'a' | b'e' | b'i' | b'o' | b'u' => false,
        b'y' => i == 0 || !is_consonant(b, i - 1),
        _ => true,
    }
}

/// Number of VC sequences in `b`, the `m` of `[C](VC)^m[V]`
fn measure(b: &[u8]) -> usize {
    let n = b.len();
    let mut i = 0;
    let mut m = 0;
    while i < n && is_consonant(b, i) {
        i += 1;
    }
    loop {
        while i < n && !is_consonant(b, i) {
            i += 1;
        }
        if i >= n {
            break;
        }
        while i < n && is_consonant(b, i) {
            i += 1;
        }
        m += 1;
        if i >= n {
            break;
        }
    }
    m
}

fn has_vowel(b: &[u8]) -> bool {
    (0..b.len()).any(|i| !is_consonant(b, i))
}

fn ends_double_consonant(b: &[u8]) -> bool {
    let n = b.len();
    n >= 2 && b[n - 1] == b[n - 2] && is_consonant(b, n - 1)
}

/// consonant-vowel-consonant ending, where the last consonant is not w, x or y
fn ends_cvc(b: &[u8]) -> bool {
    let n = b.len();
    n >= 3
        && is_consonant(b, n - 1)
        && !is_consonant(b, n - 2)
        && is_consonant(b, n - 3)
        && !matches!(b[n - 1], b'w' | b'x' | b'y')
}

fn replace_suffix(b: &mut Vec<u8>, suffix_len: usize, replacement: &[u8]) {
    b.truncate(b.len() - suffix_len);
    b.extend_from_slice(replacement);
}

/// Apply the first matching rule whose stem has `measure > min_measure`
fn apply_rules(b: &mut Vec<u8>, rules: &[(&str, &str)], min_measure: usize) {
    for (suffix, replacement) in rules {
        if b.ends_with(suffix.as_bytes()) {
            let stem_len = b.len() - suffix.len();
            if measure(&b[..stem_len]) > min_measure {
                replace_suffix(b, suffix.len(), replacement.as_bytes());
            }
            return;
        }
    }
}

fn step1a(b: &mut Vec<u8>) {
    if b.ends_with(b"sses") {
        replace_suffix(b, 4, b"ss");
    } else if b.ends_with(b"ies") {
        replace_suffix(b, 3, b"i");
    } else if b.ends_with(b"s") && !b.ends_with(b"ss") {
        b.pop();
    }
}

fn step1b(b: &mut Vec<u8>) {
    if b.ends_with(b"eed") {
        if measure(&b[..b.len() - 3]) > 0 {
            b.pop();
        }
        return;
    }

    for suffix in [&b"ed"[..], &b"ing"[..]] {
        if b.ends_with(suffix) && has_vowel(&b[..b.len() - suffix.len()]) {
            b.truncate(b.len() - suffix.len());
            if b.ends_with(b"at") || b.ends_with(b"bl") || b.ends_with(b"iz") {
                b.push(b'e');
            } else if ends_double_consonant(b) {
                if !matches!(b[b.len() - 1], b'l' | b's' | b'z') {
                    b.pop();
                }
            } else if measure(b) == 1 && ends_cvc(b) {
                b.push(b'e');
            }
            return;
        }
    }
}

fn step1c(b: &mut [u8]) {
    let n = b.len();
    if b[n - 1] == b'y' && has_vowel(&b[..n - 1]) {
        b[n - 1] = b'i';
    }
}

const STEP2: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("bli", "ble"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
    ("logi", "log"),
];

const STEP3: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
];

const STEP4: &[&str] = &[
    "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion", "ou",
    "ism", "ate", "iti", "ous", "ive", "ize",
];

fn step2(b: &mut Vec<u8>) {
    apply_rules(b, STEP2, 0);
}

fn step3(b: &mut Vec<u8>) {
    apply_rules(b, STEP3, 0);
}

fn step4(b: &mut Vec<u8>) {
    for suffix in STEP4 {
        if !b.ends_with(suffix.as_bytes()) {
            continue;
        }
        let stem_len = b.len() - suffix.len();
        // -ion only after s or t
        if *suffix == "ion" && (stem_len == 0 || !matches!(b[stem_len - 1], b's' | b't')) {
            continue;
        }
        if measure(&b[..stem_len]) > 1 {
            b.truncate(stem_len);
        }
        return;
    }
}

fn step5(b: &mut Vec<u8>) {
    if b.ends_with(b"e") {
        let stem = &b[..b.len() - 1];
        let m = measure(stem);
        if m > 1 || (m == 1 && !ends_cvc(stem)) {
            b.pop();
        }
    }
    if b.ends_with(b"ll") && measure(b) > 1 {
        b.pop();
    }
}

// ---------------------------------------------------------------------------
// Light suffix stripping
// ---------------------------------------------------------------------------

const MIN_STEM_CHARS: usize = 3;

// Longest first
const SPANISH_SUFFIXES: &[&str] = &[
    "amientos", "imientos", "amiento", "imiento", "aciones", "uciones", "idades", "ación",
    "ución", "mente", "iendo", "idad", "ando", "ados", "idos", "adas", "idas", "ado", "ido",
    "ada", "ida", "es", "as", "os", "a", "o", "e", "s",
];

const FRENCH_SUFFIXES: &[&str] = &[
    "issements", "issement", "ements", "ations", "ement", "ation", "euses", "ités", "euse",
    "ives", "ité", "eux", "ive", "ifs", "ées", "ée", "és", "if", "es", "er", "ir", "é", "e", "s",
];

const GERMAN_SUFFIXES: &[&str] = &[
    "heiten", "keiten", "ungen", "heit", "keit", "lich", "isch", "ung", "ern", "em", "en", "er",
    "es", "e", "n", "s",
];

fn strip_suffix(word: &str, suffixes: &[&str]) -> String {
    let chars = word.chars().count();
    suffixes
        .iter()
        .find(|suffix| {
            word.ends_with(*suffix) && chars - suffix.chars().count() >= MIN_STEM_CHARS
        })
        .map(|suffix| word[..word.len() - suffix.len()].to_string())
        .unwrap_or_else(|| word.to_string())
}
