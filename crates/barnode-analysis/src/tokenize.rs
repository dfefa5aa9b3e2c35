use std::collections::HashSet;

use once_cell::sync::Lazy;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Words that carry no identity signal when grouping article names:
/// beverage-category nouns, Italian/English function words and
/// unit-of-measure noise.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // beverage categories
        "vodka", "rum", "gin", "vino", "birra", "amaro", "liquore", "soda",
        "acqua", "cibo", "articolo", "drink", "bottle",
        // function words
        "di", "al", "alla", "con", "the", "a", "da", "per", "and", "or",
        "la", "le", "il", "lo", "un", "uno", "una", "e", "su", "che",
        "this", "it", "in", "on", "at", "by",
        // units
        "litro", "litri", "liter", "litre", "bottiglia", "lattina",
    ]
    .into_iter()
    .collect()
});

/// Extract the grouping keywords of an article name.
///
/// The name is lowercased, stripped of diacritics ("è" → "e") and split on
/// whitespace. Tokens of two characters or fewer, all-digit tokens and
/// stopwords are discarded. The result keeps first-occurrence order and
/// collapses duplicates; a name can legitimately produce no tokens at all,
/// in which case it contributes no grouping signal.
pub fn tokenize(name: &str) -> Vec<String> {
    let folded = strip_diacritics(&name.to_lowercase());

    let mut tokens: Vec<String> = Vec::new();
    for word in folded.split_whitespace() {
        if word.chars().count() <= 2 {
            continue;
        }
        if word.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if STOPWORDS.contains(word) {
            continue;
        }
        if !tokens.iter().any(|t| t == word) {
            tokens.push(word.to_string());
        }
    }
    tokens
}

/// NFD-decompose and drop combining marks, mapping accented letters to
/// their base form.
fn strip_diacritics(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_stopwords_short_and_numeric_tokens() {
        assert!(tokenize("Vodka 40 ml").is_empty());
        assert_eq!(tokenize("Vodka Smirnoff"), vec!["smirnoff"]);
    }

    #[test]
    fn strips_diacritics() {
        assert_eq!(tokenize("Caffè Borghetti"), vec!["caffe", "borghetti"]);
    }

    #[test]
    fn keeps_first_occurrence_order_and_collapses_duplicates() {
        assert_eq!(
            tokenize("Smirnoff Ice smirnoff"),
            vec!["smirnoff", "ice"]
        );
    }

    #[test]
    fn keeps_alphanumeric_tokens() {
        // Not purely numeric, so "70cl" survives the digit filter.
        assert_eq!(tokenize("Negroni 70cl"), vec!["negroni", "70cl"]);
    }

    #[test]
    fn empty_name_yields_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }
}
