/// Normalize an article name to Title Case.
///
/// Every word is rendered first-letter-uppercase, rest-lowercase, whatever
/// its original casing; whitespace runs collapse to single spaces and the
/// ends are trimmed. Empty input yields empty output.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&chars.as_str().to_lowercase());
            out
        }
        None => String::new(),
    }
}
