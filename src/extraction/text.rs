//! Text helpers shared by the attribute rules: keyword matching over
//! localized descriptions and price-string normalization.

use regex::Regex;

/// True if any of the keyword patterns matches the text.
///
/// Patterns are plain regexes; case-insensitivity comes from callers passing
/// already-lowercased text, which keeps Czech diacritics intact in the
/// keywords themselves.
pub fn keyword_match(keywords: &[&str], text: &str) -> bool {
    keywords
        .iter()
        .any(|k| Regex::new(k).map(|re| re.is_match(text)).unwrap_or(false))
}

/// Parse a localized currency string like "5 500 000" into an integer.
///
/// The source pads prices with non-breaking spaces and the occasional
/// non-ASCII artifact; drop all whitespace and anything non-ASCII, then
/// integer-parse what remains. Idempotent on plain digit strings.
pub fn parse_price(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii() && !c.is_whitespace())
        .collect();
    cleaned.parse().ok()
}
