//! Pure string helpers shared by the place index, dataset loader and mapper.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Normalize a place name into a lookup key.
///
/// Lower-cases, strips diacritics, keeps only `[a-z0-9 ,-]` and collapses
/// whitespace runs into a single space. Never fails: garbage in, empty out.
pub fn normalize(input: &str) -> String {
    let folded: String = input
        .trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| is_key_char(*c))
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == ',' || c == '-' || c.is_whitespace()
}

/// Split an already normalized key into tokens on whitespace, commas and dashes.
pub fn tokens(normalized: &str) -> Vec<&str> {
    normalized
        .split(|c: char| c.is_whitespace() || c == ',' || c == '-')
        .filter(|t| !t.is_empty())
        .collect()
}

/// Lenient numeric parse used for CSV cells and stringly-typed JSON.
///
/// Everything that is not a digit, sign, decimal point or exponent marker is
/// dropped before parsing, so `"21.5°C"` yields `21.5`.
pub fn parse_number(input: &str) -> Option<f64> {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Convert metres per second to kilometres per hour, one decimal.
pub fn mps_to_kph(mps: f64) -> f64 {
    round1(mps * 3.6)
}
