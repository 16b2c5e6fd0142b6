//! Identifier derivation shared by idioms and queued idiom inputs.

use std::sync::LazyLock;

use regex::Regex;

static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9a-zA-Z]+").expect("valid regex"));

/// Derive the slug identifier for an idiom.
///
/// Runs of non-alphanumeric characters collapse to a single hyphen, the
/// result is lowercased, and leading/trailing separators are dropped.
///
/// # Examples
///
/// ```
/// use idioms_core::idiom_id::to_idiom_id;
///
/// assert_eq!(to_idiom_id("Hit the hay!"), "hit-the-hay");
/// assert_eq!(to_idiom_id("  Break   a leg "), "break-a-leg");
/// ```
pub fn to_idiom_id(idiom: &str) -> String {
    SEPARATOR_RE
        .split(idiom)
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_punctuation_is_dropped() {
        assert_eq!(to_idiom_id("Hit the hay!"), "hit-the-hay");
    }

    #[test]
    fn apostrophes_split_words() {
        assert_eq!(to_idiom_id("Don't count your chickens"), "don-t-count-your-chickens");
    }

    #[test]
    fn leading_separators_are_dropped() {
        assert_eq!(to_idiom_id("...once in a blue moon"), "once-in-a-blue-moon");
    }

    #[test]
    fn digits_are_kept() {
        assert_eq!(to_idiom_id("At 6s and 7s"), "at-6s-and-7s");
    }

    #[test]
    fn non_ascii_letters_are_separators() {
        assert_eq!(to_idiom_id("café society"), "caf-society");
    }

    #[test]
    fn empty_and_symbol_only_input_yield_empty_id() {
        assert_eq!(to_idiom_id(""), "");
        assert_eq!(to_idiom_id("?!"), "");
    }

    #[test]
    fn same_text_in_different_case_collides() {
        assert_eq!(to_idiom_id("Piece of Cake"), to_idiom_id("piece of cake"));
    }
}
