//! Display formatting for raw metadata values.
//!
//! [`format_value`] is total: every [`RawProperty`] renders to some string.
//! A handful of fields need decoding that the value's type alone cannot
//! express (packed version numbers, lens specifications), so those are looked
//! up by `(group, field)` in [`FIELD_STRATEGIES`] before the generic
//! type-based rules run.

use super::keys;
use super::value::{PropertyTree, RawProperty};

/// Field-specific decoding, checked before type-based dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStrategy {
    /// `[2, 3, 0, 0]` → `2.3.0.0`, bytes `"0230"` → `2.30`.
    VersionTuple,
    /// `[min focal, max focal, min aperture, max aperture]` → `24-70mm f/2.8`.
    LensSpecification,
}

/// `(group key, field key)` pairs with their strategy.
pub const FIELD_STRATEGIES: &[((&str, &str), FieldStrategy)] = &[
    ((keys::GPS, keys::GPS_VERSION), FieldStrategy::VersionTuple),
    ((keys::EXIF, keys::EXIF_VERSION), FieldStrategy::VersionTuple),
    ((keys::EXIF, keys::FLASHPIX_VERSION), FieldStrategy::VersionTuple),
    ((keys::JFIF, keys::JFIF_VERSION), FieldStrategy::VersionTuple),
    ((keys::EXIF, keys::LENS_SPECIFICATION), FieldStrategy::LensSpecification),
];

/// Minimum share of printable characters for bytes to be shown as text.
const MAX_NON_PRINTABLE_RATIO: f64 = 0.3;

pub fn field_strategy(group_key: &str, entry_key: &str) -> Option<FieldStrategy> {
    FIELD_STRATEGIES
        .iter()
        .find(|((g, e), _)| *g == group_key && *e == entry_key)
        .map(|(_, strategy)| *strategy)
}

/// Format one raw value for display.
///
/// `group_key` and `entry_key` identify where the value came from; for
/// top-level fields both are the field's own key.
pub fn format_value(value: &RawProperty, group_key: &str, entry_key: &str) -> String {
    let formatted = match field_strategy(group_key, entry_key) {
        Some(FieldStrategy::VersionTuple) => format_version(value),
        Some(FieldStrategy::LensSpecification) => format_lens_specification(value),
        None => format_by_type(value),
    };
    normalize_line_breaks(&formatted).trim().to_string()
}

/// Format a number with no decimals when integral, otherwise up to two.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    if n.fract() == 0.0 {
        // -0.0 prints as "-0" otherwise
        return if n == 0.0 { "0".to_string() } else { format!("{n:.0}") };
    }
    let fixed = format!("{n:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn format_by_type(value: &RawProperty) -> String {
    match value {
        RawProperty::Texts(items) => items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        RawProperty::Numbers(nums) => join_numbers(nums, ", "),
        RawProperty::Integers(ints) => join_integers(ints, ", "),
        RawProperty::Bytes(bytes) => format_bytes(bytes),
        RawProperty::Map(map) => format_nested(map),
        RawProperty::Float(_)
        | RawProperty::Integer(_)
        | RawProperty::Text(_)
        | RawProperty::Opaque(_) => generic(value),
    }
}

fn format_version(value: &RawProperty) -> String {
    match value {
        RawProperty::Numbers(nums) => join_numbers(nums, "."),
        RawProperty::Integers(ints) => join_integers(ints, "."),
        RawProperty::Bytes(bytes) => {
            if let Some(packed) = decode_ascii(bytes).and_then(|s| packed_version(s.trim())) {
                packed
            } else if let Ok(s) = std::str::from_utf8(bytes) {
                s.trim().to_string()
            } else {
                generic(value)
            }
        }
        _ => generic(value),
    }
}

/// `"0231"` → `"2.31"`; `None` unless exactly four ASCII digits.
fn packed_version(s: &str) -> Option<String> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}.{}", &s[1..2], &s[2..4]))
}

fn format_lens_specification(value: &RawProperty) -> String {
    let nums: Vec<f64> = match value {
        RawProperty::Numbers(nums) => nums.clone(),
        RawProperty::Integers(ints) => ints.iter().map(|i| *i as f64).collect(),
        _ => return generic(value),
    };

    if let &[min_focal, max_focal, min_aperture, _] = nums.as_slice() {
        let focal = if min_focal == max_focal {
            format!("{}mm", format_number(min_focal))
        } else {
            format!("{}-{}mm", format_number(min_focal), format_number(max_focal))
        };
        format!("{focal} f/{}", format_number(min_aperture))
    } else {
        join_numbers(&nums, ", ")
    }
}

// ASCII is a subset of UTF-8, so one decode covers both.
fn format_bytes(bytes: &[u8]) -> String {
    std::str::from_utf8(bytes)
        .ok()
        .map(str::trim)
        .filter(|s| !s.is_empty() && is_mostly_printable(s))
        .map(str::to_string)
        .unwrap_or_else(|| byte_count(bytes.len()))
}

fn format_nested(map: &PropertyTree) -> String {
    let mut pairs: Vec<String> = map
        .iter()
        .filter_map(|(key, value)| {
            let formatted = format_simple(value);
            (!formatted.is_empty()).then(|| format!("{key}: {formatted}"))
        })
        .collect();
    pairs.sort();

    if pairs.is_empty() {
        "(empty)".to_string()
    } else {
        pairs.join("\n")
    }
}

/// Single-line rendering for values inside a nested map.
fn format_simple(value: &RawProperty) -> String {
    match value {
        RawProperty::Text(s) => s.trim().to_string(),
        RawProperty::Float(f) => format_number(*f),
        RawProperty::Integer(i) => format_number(*i as f64),
        RawProperty::Texts(items) => items
            .iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(", "),
        RawProperty::Numbers(nums) => join_numbers(nums, ", "),
        RawProperty::Integers(ints) => join_integers(ints, ", "),
        RawProperty::Bytes(bytes) => match std::str::from_utf8(bytes).map(str::trim) {
            Ok(s) if !s.is_empty() => s.to_string(),
            _ => byte_count(bytes.len()),
        },
        RawProperty::Map(nested) => format!("({} fields)", nested.len()),
        RawProperty::Opaque(s) => match s.as_str() {
            "" | "(null)" | "<null>" => String::new(),
            _ => s.clone(),
        },
    }
}

/// The fallback rendering for any value.
fn generic(value: &RawProperty) -> String {
    match value {
        RawProperty::Float(f) => f.to_string(),
        RawProperty::Integer(i) => i.to_string(),
        RawProperty::Text(s) | RawProperty::Opaque(s) => s.clone(),
        RawProperty::Texts(items) => format!("({})", items.join(", ")),
        RawProperty::Numbers(nums) => format!(
            "({})",
            nums.iter().map(f64::to_string).collect::<Vec<_>>().join(", ")
        ),
        RawProperty::Integers(ints) => format!("({})", join_integers(ints, ", ")),
        RawProperty::Bytes(bytes) => byte_count(bytes.len()),
        RawProperty::Map(map) => format!("({} fields)", map.len()),
    }
}

fn join_numbers(nums: &[f64], sep: &str) -> String {
    nums.iter().map(|n| format_number(*n)).collect::<Vec<_>>().join(sep)
}

fn join_integers(ints: &[i64], sep: &str) -> String {
    ints.iter().map(i64::to_string).collect::<Vec<_>>().join(sep)
}

fn byte_count(len: usize) -> String {
    format!("{len} bytes")
}

/// Strict ASCII decoding; any byte above 0x7F fails.
fn decode_ascii(bytes: &[u8]) -> Option<String> {
    bytes
        .is_ascii()
        .then(|| bytes.iter().map(|b| *b as char).collect())
}

fn normalize_line_breaks(s: &str) -> String {
    if s.contains('\r') {
        s.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        s.to_string()
    }
}

/// Whether fewer than 30% of the characters are non-printable.
///
/// Coarse: the symbol and punctuation classes outside ASCII are approximated
/// by Unicode block, so scripts without letters in those blocks may be
/// misjudged.
pub fn is_mostly_printable(s: &str) -> bool {
    let total = s.chars().count();
    if total == 0 {
        return false;
    }
    let non_printable = s.chars().filter(|c| !is_printable(*c)).count();
    (non_printable as f64) / (total as f64) < MAX_NON_PRINTABLE_RATIO
}

fn is_printable(c: char) -> bool {
    c.is_ascii_hexdigit()
        || c.is_alphanumeric()
        || c.is_whitespace()
        || c.is_ascii_punctuation()
        || is_unicode_punctuation_or_symbol(c)
}

fn is_unicode_punctuation_or_symbol(c: char) -> bool {
    matches!(
        c as u32,
        0x00A1..=0x00BF
            | 0x00D7
            | 0x00F7
            | 0x02C2..=0x02C5
            | 0x02D2..=0x02DF
            | 0x2010..=0x2027
            | 0x2030..=0x205E
            | 0x20A0..=0x20CF
            | 0x2100..=0x27BF
            | 0x2900..=0x2BFF
            | 0x3001..=0x303F
            | 0xFF01..=0xFF0F
            | 0xFF1A..=0xFF20
            | 0xFF3B..=0xFF40
            | 0xFF5B..=0xFF65
            | 0xFFFC..=0xFFFD
            | 0x1F000..=0x1FAFF
    )
}
