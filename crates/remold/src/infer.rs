//! Column type inference from sampled raw values.
//!
//! Each non-empty value casts one vote for the most specific type it
//! matches; the majority over a leading-row sample decides the column.
//! Sampling only the leading rows is an accepted limitation of the
//! source format, not something to silently widen.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::ColumnType;

/// Canonical 8-4-4-4-12 hex UUID, case-insensitive, anchored.
pub static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

/// Optional sign, digits.
pub static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").unwrap());

/// Optional sign, digits, dot, digits.
pub static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+\.\d+$").unwrap());

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

static TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").unwrap());

/// Tie-break order: when two types collect the same number of votes the
/// one listed earlier wins. Mirrors the per-value detection order.
const VOTE_ORDER: [ColumnType; 7] = [
    ColumnType::Boolean,
    ColumnType::Uuid,
    ColumnType::Integer,
    ColumnType::Decimal,
    ColumnType::Date,
    ColumnType::Timestamp,
    ColumnType::Text,
];

/// Detect the type of a single raw value. Empty values cast no vote.
pub fn detect_value_type(value: &str) -> Option<ColumnType> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_lowercase();
    if matches!(
        lower.as_str(),
        "true" | "false" | "1" | "0" | "yes" | "no" | "y" | "n"
    ) {
        return Some(ColumnType::Boolean);
    }
    if UUID_RE.is_match(trimmed) {
        return Some(ColumnType::Uuid);
    }
    if INTEGER_RE.is_match(trimmed) {
        return Some(ColumnType::Integer);
    }
    if DECIMAL_RE.is_match(trimmed) {
        return Some(ColumnType::Decimal);
    }
    if DATE_RE.is_match(trimmed) {
        return Some(ColumnType::Date);
    }
    if TIMESTAMP_RE.is_match(trimmed) {
        return Some(ColumnType::Timestamp);
    }
    Some(ColumnType::Text)
}

/// Majority vote over sampled values. An all-empty sample infers Text.
pub fn infer_column_type<'a>(samples: impl IntoIterator<Item = &'a str>) -> ColumnType {
    let mut counts = [0usize; VOTE_ORDER.len()];
    for value in samples {
        if let Some(ty) = detect_value_type(value) {
            if let Some(idx) = VOTE_ORDER.iter().position(|t| *t == ty) {
                counts[idx] += 1;
            }
        }
    }

    let mut best = ColumnType::Text;
    let mut best_count = 0usize;
    for (idx, ty) in VOTE_ORDER.iter().enumerate() {
        if counts[idx] > best_count {
            best = *ty;
            best_count = counts[idx];
        }
    }

    if best_count == 0 { ColumnType::Text } else { best }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_single_values() {
        assert_eq!(detect_value_type("yes"), Some(ColumnType::Boolean));
        assert_eq!(
            detect_value_type("d47ec620-2190-11ef-910c-f1df4955273f"),
            Some(ColumnType::Uuid)
        );
        assert_eq!(detect_value_type("-123"), Some(ColumnType::Integer));
        assert_eq!(detect_value_type("67.89"), Some(ColumnType::Decimal));
        assert_eq!(detect_value_type("2024-06-03"), Some(ColumnType::Date));
        assert_eq!(
            detect_value_type("2024-06-03T10:05:39.625Z"),
            Some(ColumnType::Timestamp)
        );
        assert_eq!(detect_value_type("The Hobbit"), Some(ColumnType::Text));
        assert_eq!(detect_value_type(""), None);
        assert_eq!(detect_value_type("  "), None);
    }

    #[test]
    fn test_uuid_sample_infers_uuid() {
        let samples = [
            "d47ec620-2190-11ef-910c-f1df4955273f",
            "ab34cd56-0000-4abc-8000-000000000001",
            "D47EC620-2190-11EF-910C-F1DF4955273F",
        ];
        assert_eq!(infer_column_type(samples), ColumnType::Uuid);
    }

    #[test]
    fn test_boolean_with_empties_infers_boolean() {
        let samples = ["true", "", "no", "", "yes"];
        assert_eq!(infer_column_type(samples), ColumnType::Boolean);
    }

    #[test]
    fn test_all_empty_infers_text() {
        let samples = ["", "  ", ""];
        assert_eq!(infer_column_type(samples), ColumnType::Text);
    }

    #[test]
    fn test_majority_wins() {
        let samples = ["1.5", "2.5", "3.5", "oops"];
        assert_eq!(infer_column_type(samples), ColumnType::Decimal);
    }

    #[test]
    fn test_tie_breaks_toward_detection_order() {
        // Two integer votes, two text votes: Integer comes first.
        let samples = ["1", "2", "abc", "def"];
        assert_eq!(infer_column_type(samples), ColumnType::Integer);
    }
}
