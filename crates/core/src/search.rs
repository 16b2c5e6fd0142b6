//! Keyword search helpers.
//!
//! A keyword string is split on whitespace; each term of at least
//! [`MIN_TERM_LEN`] characters becomes a case-insensitive substring match
//! against the idiom text, and the matches are OR-combined.

/// Terms shorter than this are dropped; single letters would match nearly
/// every row.
pub const MIN_TERM_LEN: usize = 2;

/// Split a keyword string into the terms that take part in the search.
///
/// Returns an empty list when no term qualifies, in which case no keyword
/// predicate is applied at all.
///
/// # Examples
///
/// ```
/// use idioms_core::search::keyword_terms;
///
/// assert_eq!(keyword_terms("at the"), vec!["at", "the"]);
/// assert_eq!(keyword_terms("a b c"), Vec::<&str>::new());
/// ```
pub fn keyword_terms(keyword: &str) -> Vec<&str> {
    keyword
        .split_whitespace()
        .filter(|term| term.chars().count() >= MIN_TERM_LEN)
        .collect()
}

/// Build an `ILIKE` pattern matching `term` anywhere in the text.
///
/// `%`, `_` and `\` in the term are escaped so they match literally.
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
