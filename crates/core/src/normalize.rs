use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::porter::PorterStemmer;

static NON_LATIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z\s]").expect("valid normalizer regex"));

/// Lowercase, drop everything except ASCII letters and whitespace, then stem
/// each word. Training and serving must both go through here.
pub fn normalize_text(input: &str) -> String {
    let lower = input.to_lowercase();
    let cleaned = NON_LATIN.replace_all(&lower, "");
    let stemmer = PorterStemmer::new();

    cleaned
        .unicode_words()
        .map(|word| stemmer.stem(word))
        .collect::<Vec<_>>()
        .join(" ")
}
