//! Stemming support for query normalization and highlighting.
//!
//! The text engine indexes stems but returns the original surface text, so
//! the highlighter must match both forms. A Porter stemmer covers the
//! English corpus this service indexes.

/// Trait for stemming algorithms.
pub trait Stemmer: Send + Sync {
    /// Stem a word to its root form.
    fn stem(&self, word: &str) -> String;
}

/// Porter stemming algorithm.
///
/// A simplified Porter stemmer: five rewrite passes over plural and
/// derivational suffixes, gated by the "measure" (VC-pattern count) of the
/// remaining stem. Deterministic, so stems computed at query time line up
/// with stems computed at index time.
///
/// Non-ASCII tokens are passed through lowercased but otherwise unchanged;
/// the rule tables are only meaningful for English.
#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

/// Step 2 suffix rewrites, applied when the remaining stem has measure >= 1.
const STEP2_SUFFIXES: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("abli", "able"),
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
];

/// Step 3 suffix rewrites, applied when the remaining stem has measure >= 1.
const STEP3_SUFFIXES: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
];

/// Step 4 suffix deletions, applied when the remaining stem has measure > 1.
const STEP4_SUFFIXES: &[&str] = &[
    "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion", "ou",
    "ism", "ate", "iti", "ous", "ive", "ize",
];

impl PorterStemmer {
    /// Create a new Porter stemmer.
    pub fn new() -> Self {
        PorterStemmer
    }
}

/// Check whether the byte at `pos` is a vowel, treating `y` as a vowel when
/// it follows a consonant.
fn is_vowel(word: &[u8], pos: usize) -> bool {
    if pos >= word.len() {
        return false;
    }

    match word[pos].to_ascii_lowercase() {
        b'a' | b'e' | b'i' | b'o' | b'u' => true,
        b'y' if pos > 0 => !is_vowel(word, pos - 1),
        _ => false,
    }
}

/// The measure of a word: the number of vowel-consonant transitions.
fn measure(word: &str) -> usize {
    let bytes = word.as_bytes();
    let n = bytes.len();
    let mut m = 0;
    let mut i = 0;

    // Skip the initial consonant run
    while i < n && !is_vowel(bytes, i) {
        i += 1;
    }

    while i < n {
        while i < n && is_vowel(bytes, i) {
            i += 1;
        }
        if i >= n {
            break;
        }
        m += 1;
        while i < n && !is_vowel(bytes, i) {
            i += 1;
        }
    }

    m
}

fn contains_vowel(word: &str) -> bool {
    let bytes = word.as_bytes();
    (0..bytes.len()).any(|i| is_vowel(bytes, i))
}

fn ends_double_consonant(word: &str) -> bool {
    let bytes = word.as_bytes();
    let len = bytes.len();
    len >= 2 && bytes[len - 1] == bytes[len - 2] && !is_vowel(bytes, len - 1)
}

/// Consonant-vowel-consonant ending, where the final consonant is not
/// `w`, `x`, or `y`.
fn ends_cvc(word: &str) -> bool {
    let bytes = word.as_bytes();
    let len = bytes.len();
    if len < 3 {
        return false;
    }

    !is_vowel(bytes, len - 3)
        && is_vowel(bytes, len - 2)
        && !is_vowel(bytes, len - 1)
        && !matches!(bytes[len - 1], b'w' | b'x' | b'y')
}

/// Replace `old` with `new` at the end of `word` when the remaining stem
/// has at least `min_measure`.
fn replace_suffix(word: &str, old: &str, new: &str, min_measure: usize) -> String {
    if let Some(stem) = word.strip_suffix(old) {
        if measure(stem) >= min_measure {
            return format!("{stem}{new}");
        }
    }
    word.to_string()
}

/// Step 1a: plurals.
fn step1a(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("sses") {
        format!("{stem}ss")
    } else if let Some(stem) = word.strip_suffix("ies") {
        format!("{stem}i")
    } else if word.ends_with("ss") {
        word.to_string()
    } else if word.len() > 1 && word.ends_with('s') {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Step 1b: -eed/-ed/-ing, with the standard cleanup pass afterwards.
fn step1b(word: &str) -> String {
    let reduced = if word.ends_with("eed") {
        replace_suffix(word, "eed", "ee", 1)
    } else if let Some(stem) = word.strip_suffix("ed") {
        if contains_vowel(stem) {
            stem.to_string()
        } else {
            word.to_string()
        }
    } else if let Some(stem) = word.strip_suffix("ing") {
        if contains_vowel(stem) {
            stem.to_string()
        } else {
            word.to_string()
        }
    } else {
        word.to_string()
    };

    if reduced == word {
        return reduced;
    }

    if reduced.ends_with("at") || reduced.ends_with("bl") || reduced.ends_with("iz") {
        format!("{reduced}e")
    } else if ends_double_consonant(&reduced)
        && !reduced.ends_with('l')
        && !reduced.ends_with('s')
        && !reduced.ends_with('z')
    {
        reduced[..reduced.len() - 1].to_string()
    } else if measure(&reduced) == 1 && ends_cvc(&reduced) {
        format!("{reduced}e")
    } else {
        reduced
    }
}

fn step2(word: &str) -> String {
    for (old, new) in STEP2_SUFFIXES {
        if word.ends_with(old) {
            return replace_suffix(word, old, new, 1);
        }
    }
    word.to_string()
}

fn step3(word: &str) -> String {
    for (old, new) in STEP3_SUFFIXES {
        if word.ends_with(old) {
            return replace_suffix(word, old, new, 1);
        }
    }
    word.to_string()
}

fn step4(word: &str) -> String {
    for suffix in STEP4_SUFFIXES {
        if let Some(stem) = word.strip_suffix(suffix) {
            if measure(stem) > 1 {
                // -ion only drops after s or t
                if *suffix != "ion" || stem.ends_with('s') || stem.ends_with('t') {
                    return stem.to_string();
                }
            }
        }
    }
    word.to_string()
}

/// Step 5: final -e and -ll reduction.
fn step5(word: &str) -> String {
    let word = if word.ends_with('e') {
        let stem = &word[..word.len() - 1];
        let m = measure(stem);
        if m > 1 || (m == 1 && !ends_cvc(stem)) {
            stem.to_string()
        } else {
            word.to_string()
        }
    } else {
        word.to_string()
    };

    if word.ends_with("ll") && measure(&word) > 1 {
        word[..word.len() - 1].to_string()
    } else {
        word
    }
}

impl Stemmer for PorterStemmer {
    fn stem(&self, word: &str) -> String {
        if word.len() <= 2 || !word.is_ascii() {
            return word.to_lowercase();
        }

        let word = word.to_lowercase();

        let word = step1a(&word);
        let word = step1b(&word);
        let word = step2(&word);
        let word = step3(&word);
        let word = step4(&word);
        step5(&word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_porter_stemmer() {
        let stemmer = PorterStemmer::new();

        assert_eq!(stemmer.stem("running"), "run");
        assert_eq!(stemmer.stem("flies"), "fli");
        assert_eq!(stemmer.stem("agreed"), "agre");
        assert_eq!(stemmer.stem("disabled"), "disabl");
        assert_eq!(stemmer.stem("measuring"), "measur");
        assert_eq!(stemmer.stem("itemization"), "item");
        assert_eq!(stemmer.stem("traditional"), "tradit");
    }

    #[test]
    fn test_stem_is_case_insensitive() {
        let stemmer = PorterStemmer::new();
        assert_eq!(stemmer.stem("Trials"), stemmer.stem("trials"));
    }

    #[test]
    fn test_stem_plural_to_singular() {
        let stemmer = PorterStemmer::new();
        assert_eq!(stemmer.stem("trials"), "trial");
        assert_eq!(stemmer.stem("trial"), "trial");
        assert_eq!(stemmer.stem("cancer"), "cancer");
    }

    #[test]
    fn test_short_and_non_ascii_words_pass_through() {
        let stemmer = PorterStemmer::new();
        assert_eq!(stemmer.stem("at"), "at");
        assert_eq!(stemmer.stem("café"), "café");
    }

    #[test]
    fn test_measure() {
        assert_eq!(measure("tree"), 0);
        assert_eq!(measure("trees"), 1);
        assert_eq!(measure("trouble"), 1);
        assert_eq!(measure("troubles"), 2);
    }

    #[test]
    fn test_vowel_detection() {
        let word = b"trouble";

        assert!(!is_vowel(word, 0)); // t
        assert!(!is_vowel(word, 1)); // r
        assert!(is_vowel(word, 2)); // o
        assert!(is_vowel(word, 3)); // u
        assert!(!is_vowel(word, 4)); // b
        assert!(!is_vowel(word, 5)); // l
        assert!(is_vowel(word, 6)); // e
    }
}
