//! Elevation normalization.
//!
//! Overpass `ele` tags are free text: bare numbers, unit-suffixed
//! strings, comma decimal separators, or garbage. This module folds
//! all of them into meters. Parsing never fails; malformed input
//! degrades to `None` and the caller keeps the raw text for display.

use serde_json::Value;

/// Meters per foot.
const METERS_PER_FOOT: f64 = 0.3048;

/// Normalize a raw elevation tag value to meters.
///
/// - Absent input yields `None`.
/// - Numeric JSON values are taken as meters unchanged.
/// - Strings go through [`parse_elevation_text`].
/// - Anything else yields `None`.
pub fn parse_elevation(raw: Option<&Value>) -> Option<f64> {
    match raw? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_elevation_text(s),
        _ => None,
    }
}

/// Parse an elevation string to meters.
///
/// Scans for the first signed decimal number (dot or comma separator)
/// followed optionally by a unit token. `ft`, `feet` and a bare
/// apostrophe convert via 0.3048; any other token, or none, means
/// meters. Unparseable strings yield `None`.
pub fn parse_elevation_text(raw: &str) -> Option<f64> {
    let s = raw.trim();

    // Locate the first digit; a '-' immediately before it is the sign.
    let digit_pos = s.char_indices().find(|(_, c)| c.is_ascii_digit())?.0;
    let start = if digit_pos > 0 && s.as_bytes()[digit_pos - 1] == b'-' {
        digit_pos - 1
    } else {
        digit_pos
    };

    let tail = &s[start..];
    let mut end = 0;
    let bytes = tail.as_bytes();
    if bytes[end] == b'-' {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    // Fractional part only counts if a digit follows the separator.
    if end < bytes.len()
        && (bytes[end] == b'.' || bytes[end] == b',')
        && end + 1 < bytes.len()
        && bytes[end + 1].is_ascii_digit()
    {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    let value: f64 = tail[..end].replace(',', ".").parse().ok()?;

    let unit = tail[end..].trim_start();
    if is_feet_unit(unit) {
        Some(value * METERS_PER_FOOT)
    } else {
        Some(value)
    }
}

/// Feet-family unit tokens; everything else defaults to meters.
fn is_feet_unit(rest: &str) -> bool {
    let lower = rest.to_ascii_lowercase();
    lower.starts_with('\'') || lower.starts_with("ft") || lower.starts_with("feet")
}
