//! Key normalisation, fuzzy key matching, and numeric coercion.
//!
//! Extractors that are not told the schema (or ignore it) name fields
//! freely: `invoiceNumber`, `Invoice-No`, `total gross`. Everything here
//! helps map such keys back onto schema fields.

use lazy_static::lazy_static;
use regex::Regex;

use docverdict_contracts::value::Value;

lazy_static! {
    static ref CAMEL_WORD: Regex = Regex::new(r"(.)([A-Z][a-z]+)").unwrap();
    static ref CAMEL_BOUNDARY: Regex = Regex::new(r"([a-z0-9])([A-Z])").unwrap();
    static ref REPEATED_UNDERSCORE: Regex = Regex::new(r"__+").unwrap();
}

/// Canonical form of a field key.
///
/// Splits camel case, lowercases, turns `-` and spaces into `_`, collapses
/// repeated underscores and strips them from both ends:
/// `InvoiceNumber` → `invoice_number`, ` total-gross ` → `total_gross`.
pub fn normalize_key(key: &str) -> String {
    let key = key.trim();
    let key = CAMEL_WORD.replace_all(key, "${1}_${2}");
    let key = CAMEL_BOUNDARY.replace_all(&key, "${1}_${2}");
    let key = key.to_lowercase().replace(['-', ' '], "_");
    let key = REPEATED_UNDERSCORE.replace_all(&key, "_");
    key.trim_matches('_').to_string()
}

/// Similarity of two strings in `[0, 1]`: twice the number of matching
/// characters over the total length (Ratcliff/Obershelp).
///
/// Matching characters are found by taking the longest common block and
/// recursing on the pieces to its left and right.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, size) = longest_block(a, b);
    if size == 0 {
        return 0;
    }
    size + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + size..], &b[j + size..])
}

/// Longest common block as `(start_in_a, start_in_b, size)`. Among equally
/// long blocks the one starting earliest in `a`, then in `b`, wins.
fn longest_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut row = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let size = prev[j] + 1;
                row[j + 1] = size;
                if size > best.2 {
                    best = (i + 1 - size, j + 1 - size, size);
                }
            }
        }
        prev = row;
    }
    best
}

/// The candidate most similar to `word`, if its similarity reaches `cutoff`.
///
/// Ties on similarity go to the lexicographically greatest candidate.
pub fn close_match<'a>(
    word: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    cutoff: f64,
) -> Option<&'a str> {
    candidates
        .into_iter()
        .map(|candidate| (similarity(candidate, word), candidate))
        .filter(|(score, _)| *score >= cutoff)
        .max_by(|(sa, ca), (sb, cb)| sa.total_cmp(sb).then_with(|| ca.cmp(cb)))
        .map(|(_, candidate)| candidate)
}

/// Read a number out of `value`.
///
/// Integers and floats pass through. Strings lose currency markers (`€`,
/// `eur`, `euro`) and have their decimal separator normalised: a comma is the
/// decimal separator when it comes after the last dot (`1.234,56`), and
/// thousands separator otherwise (`1,234.56`). Everything else yields `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

fn parse_amount(text: &str) -> Option<f64> {
    let text = text.trim().to_lowercase();
    let text = text.replace('€', "").replace("euro", "").replace("eur", "");

    let text = match (text.rfind(','), text.rfind('.')) {
        (Some(comma), dot) if dot.map_or(true, |dot| comma > dot) => {
            text.replace('.', "").replace(',', ".")
        }
        _ => text.replace(',', ""),
    };

    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use docverdict_contracts::value::Value;

    use super::{close_match, coerce_number, normalize_key, similarity};

    // ── Normalisation ─────────────────────────────────────────────────────────

    #[test]
    fn normalizes_camel_case_and_separators() {
        assert_eq!(normalize_key("InvoiceNumber"), "invoice_number");
        assert_eq!(normalize_key("totalGross"), "total_gross");
        assert_eq!(normalize_key(" Total-Gross "), "total_gross");
        assert_eq!(normalize_key("line  items"), "line_items");
        assert_eq!(normalize_key("__typ__"), "typ");
        assert_eq!(normalize_key("HTTPResponse"), "http_response");
        assert_eq!(normalize_key("rechnung_nr"), "rechnung_nr");
    }

    // ── Similarity ────────────────────────────────────────────────────────────

    #[test]
    fn similarity_matches_known_values() {
        assert_eq!(similarity("abcd", "abcd"), 1.0);
        assert_eq!(similarity("abcd", "wxyz"), 0.0);
        // "rechnungsnummer" (15) vs "rechnungnummer" (14): 14 matching chars.
        let score = similarity("rechnungnummer", "rechnungsnummer");
        assert!((score - 28.0 / 29.0).abs() < 1e-12);
    }

    #[test]
    fn close_match_respects_cutoff() {
        let keys = ["rechnungnummer", "datum", "total"];
        assert_eq!(
            close_match("rechnungsnummer", keys.iter().copied(), 0.92),
            Some("rechnungnummer")
        );
        assert_eq!(close_match("empfaenger", keys.iter().copied(), 0.92), None);
    }

    #[test]
    fn close_match_picks_best_candidate() {
        let keys = ["total_nett", "total_net_"];
        // Both score equally; the greater string wins.
        assert_eq!(close_match("total_net", keys.iter().copied(), 0.9), Some("total_nett"));
    }

    // ── Coercion ──────────────────────────────────────────────────────────────

    #[test]
    fn coerces_european_amounts() {
        assert_eq!(coerce_number(&Value::from("1.234,56 €")), Some(1234.56));
        assert_eq!(coerce_number(&Value::from("77,22 EUR")), Some(77.22));
        assert_eq!(coerce_number(&Value::from("1,234.56")), Some(1234.56));
        assert_eq!(coerce_number(&Value::from("438.67")), Some(438.67));
        assert_eq!(coerce_number(&Value::from("-5")), Some(-5.0));
        assert_eq!(coerce_number(&Value::Integer(4)), Some(4.0));
    }

    #[test]
    fn rejects_non_numbers() {
        assert_eq!(coerce_number(&Value::from("Euro")), None);
        assert_eq!(coerce_number(&Value::from("")), None);
        assert_eq!(coerce_number(&Value::from("1.2.3")), None);
        assert_eq!(coerce_number(&Value::Bool(true)), None);
        assert_eq!(coerce_number(&Value::Null), None);
    }
}
