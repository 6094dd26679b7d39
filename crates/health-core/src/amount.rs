//! Lenient parsing of statement amounts.
//!
//! Scraped and AI-extracted statements rarely carry clean floats. The same
//! figure can arrive as `1234.5`, `"1,234.5"`, `"$(1,234)"`, `"1.2bn"` or
//! `"12%"`. Everything funnels through [`parse_amount`], which either yields a
//! finite float, `None` for an explicit blank, or rejects the text. The one
//! non-finite value let through is a literal `NaN`, which stays NaN so the
//! scorer treats it the same as an in-memory NaN.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::AnalysisError;

/// Markers that mean "no value reported".
const NULL_MARKERS: &[&str] = &["", "-", "—", "–", "n/a", "na", "none", "null", "nil"];

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹'];

const CURRENCY_CODES: &[&str] = &["usd", "eur", "gbp", "inr", "jpy", "cad", "aud"];

/// Longest suffixes first so `mn` wins over `m` and `bn` over `b`.
const MAGNITUDES: &[(&str, f64)] = &[
    ("trillion", 1e12),
    ("thousand", 1e3),
    ("billion", 1e9),
    ("million", 1e6),
    ("crore", 1e7),
    ("lakh", 1e5),
    ("tn", 1e12),
    ("bn", 1e9),
    ("mn", 1e6),
    ("mm", 1e6),
    ("cr", 1e7),
    ("k", 1e3),
    ("m", 1e6),
    ("b", 1e9),
    ("t", 1e12),
    ("l", 1e5),
];

/// Parse a human-formatted amount into a float.
///
/// Returns `Ok(None)` for blanks such as `""`, `"-"` or `"n/a"` and
/// `Err(AnalysisError::InvalidData)` for anything that is not a number.
pub fn parse_amount(text: &str) -> Result<Option<f64>, AnalysisError> {
    let lowered = text.trim().to_lowercase();
    if NULL_MARKERS.contains(&lowered.as_str()) {
        return Ok(None);
    }
    if lowered == "nan" {
        return Ok(Some(f64::NAN));
    }

    let invalid = || AnalysisError::InvalidData(format!("unparseable amount: {:?}", text));

    let mut negative = false;
    let mut s: String = lowered.chars().filter(|c| !CURRENCY_SYMBOLS.contains(c)).collect();
    s = s.trim().to_string();

    for code in CURRENCY_CODES {
        if let Some(rest) = s.strip_prefix(code) {
            s = rest.trim().to_string();
        }
        if let Some(rest) = s.strip_suffix(code) {
            s = rest.trim().to_string();
        }
    }

    // Accounting negatives: (1,200) and 1,200-
    if s.starts_with('(') && s.ends_with(')') && s.len() > 2 {
        negative = true;
        s = s[1..s.len() - 1].trim().to_string();
    }
    if s.len() > 1 && s.ends_with('-') {
        negative = !negative;
        s.pop();
    }

    let mut divisor = 1.0;
    if let Some(rest) = s.strip_suffix('%') {
        divisor = 100.0;
        s = rest.to_string();
    }

    s.retain(|c| !matches!(c, ',' | '_' | ' ' | '\''));

    let mut multiplier = 1.0;
    for (suffix, factor) in MAGNITUDES {
        if let Some(rest) = s.strip_suffix(suffix) {
            if rest.ends_with(|c: char| c.is_ascii_digit() || c == '.') {
                multiplier = *factor;
                s = rest.to_string();
                break;
            }
        }
    }

    let value: f64 = s.parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }

    let value = value * multiplier / divisor;
    Ok(Some(if negative { -value } else { value }))
}

/// Serde helper for `Option<f64>` amount fields.
///
/// Accepts a JSON number, a numeric string understood by [`parse_amount`],
/// or `null`. Booleans, arrays and objects are rejected.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("amount out of range: {}", n))),
        Some(Value::String(s)) => parse_amount(&s).map_err(D::Error::custom),
        Some(other) => Err(D::Error::custom(format!(
            "expected a number or numeric string, got {}",
            other
        ))),
    }
}
