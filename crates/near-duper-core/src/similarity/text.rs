use ahash::AHashSet;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\w+").expect("word pattern is valid");
}

/// Unique case-folded word tokens of a document.
pub fn tokens(text: &str) -> AHashSet<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Token overlap divided by the larger token set.
///
/// Dividing by the larger set keeps a short document that is a subset of a
/// long one from scoring 1.0.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let tokens_a = tokens(a);
    let tokens_b = tokens(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let common = tokens_a.intersection(&tokens_b).count();
    common as f64 / tokens_a.len().max(tokens_b.len()) as f64
}
