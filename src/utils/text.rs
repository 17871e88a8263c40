// src/utils/text.rs

use std::sync::OnceLock;

use regex::Regex;

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Canonical form used for objective answer comparison: trimmed,
/// lowercased, inner whitespace collapsed to single spaces.
pub fn normalize_answer(raw: &str) -> String {
    whitespace_re()
        .replace_all(raw.trim(), " ")
        .to_lowercase()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_is_case_and_whitespace_insensitive() {
        assert_eq!(normalize_answer("  B "), "b");
        assert_eq!(normalize_answer("The   Cat\tsat"), "the cat sat");
        assert_eq!(normalize_answer("b"), normalize_answer("B  "));
    }

    #[test]
    fn word_count_ignores_extra_whitespace() {
        assert_eq!(word_count("one  two\nthree"), 3);
        assert_eq!(word_count("   "), 0);
    }
}
