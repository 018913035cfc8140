//! Core type definitions for schema representation.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::infer;

/// Inferred scalar type for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Free text, the universal fallback.
    Text,
    /// true/false in any of the accepted notations.
    Boolean,
    /// Canonical 8-4-4-4-12 hex UUID.
    Uuid,
    /// Whole numbers, optional sign.
    Integer,
    /// Numbers with a decimal point.
    Decimal,
    /// `YYYY-MM-DD` dates.
    Date,
    /// ISO 8601 date-times.
    Timestamp,
}

impl ColumnType {
    /// The PostgreSQL type this column maps to.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Uuid => "UUID",
            ColumnType::Integer => "INTEGER",
            ColumnType::Decimal => "NUMERIC(12,2)",
            ColumnType::Date => "DATE",
            ColumnType::Timestamp => "TIMESTAMPTZ",
        }
    }
}

impl Default for ColumnType {
    fn default() -> Self {
        ColumnType::Text
    }
}

/// A typed cell value in a normalized row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Uuid(String),
    Text(String),
}

impl Value {
    /// Coerce a raw string into a value of the declared column type.
    ///
    /// Returns `None` when the value cannot be represented in that type;
    /// the caller records the fallback and stores a null.
    pub fn coerce(raw: &str, ty: ColumnType) -> Option<Value> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        match ty {
            ColumnType::Text => Some(Value::Text(raw.to_string())),
            ColumnType::Boolean => match trimmed.to_lowercase().as_str() {
                "true" | "1" | "yes" | "y" => Some(Value::Boolean(true)),
                "false" | "0" | "no" | "n" => Some(Value::Boolean(false)),
                _ => None,
            },
            ColumnType::Uuid => infer::UUID_RE
                .is_match(trimmed)
                .then(|| Value::Uuid(trimmed.to_lowercase())),
            ColumnType::Integer => {
                if infer::INTEGER_RE.is_match(trimmed) {
                    trimmed.parse::<i64>().ok().map(Value::Integer)
                } else {
                    None
                }
            }
            ColumnType::Decimal => {
                if infer::DECIMAL_RE.is_match(trimmed) {
                    trimmed.parse::<f64>().ok().map(Value::Decimal)
                } else {
                    None
                }
            }
            ColumnType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .map(Value::Date),
            ColumnType::Timestamp => parse_timestamp(trimmed).map(Value::Timestamp),
        }
    }

    /// The column type this value belongs to.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Boolean(_) => ColumnType::Boolean,
            Value::Integer(_) => ColumnType::Integer,
            Value::Decimal(_) => ColumnType::Decimal,
            Value::Date(_) => ColumnType::Date,
            Value::Timestamp(_) => ColumnType::Timestamp,
            Value::Uuid(_) => ColumnType::Uuid,
            Value::Text(_) => ColumnType::Text,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Uuid(s) | Value::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Parse an ISO 8601 timestamp, with or without an offset suffix.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_coercion() {
        assert_eq!(
            Value::coerce("Yes", ColumnType::Boolean),
            Some(Value::Boolean(true))
        );
        assert_eq!(
            Value::coerce("0", ColumnType::Boolean),
            Some(Value::Boolean(false))
        );
        assert_eq!(Value::coerce("maybe", ColumnType::Boolean), None);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(
            Value::coerce("-42", ColumnType::Integer),
            Some(Value::Integer(-42))
        );
        assert_eq!(Value::coerce("4.5", ColumnType::Integer), None);
        assert_eq!(
            Value::coerce("12.50", ColumnType::Decimal),
            Some(Value::Decimal(12.5))
        );
        assert_eq!(Value::coerce("12,5", ColumnType::Decimal), None);
    }

    #[test]
    fn test_uuid_coercion_lowercases() {
        let v = Value::coerce("D47EC620-2190-11EF-910C-F1DF4955273F", ColumnType::Uuid);
        assert_eq!(
            v,
            Some(Value::Uuid("d47ec620-2190-11ef-910c-f1df4955273f".into()))
        );
        assert_eq!(Value::coerce("not-a-uuid", ColumnType::Uuid), None);
    }

    #[test]
    fn test_temporal_coercion() {
        assert!(matches!(
            Value::coerce("2024-06-03", ColumnType::Date),
            Some(Value::Date(_))
        ));
        assert!(matches!(
            Value::coerce("2024-06-03T10:05:39.625Z", ColumnType::Timestamp),
            Some(Value::Timestamp(_))
        ));
        assert!(matches!(
            Value::coerce("2024-06-03T10:05:39", ColumnType::Timestamp),
            Some(Value::Timestamp(_))
        ));
        assert_eq!(Value::coerce("2024-13-99", ColumnType::Date), None);
    }

    #[test]
    fn test_empty_never_coerces() {
        for ty in [ColumnType::Text, ColumnType::Boolean, ColumnType::Integer] {
            assert_eq!(Value::coerce("", ty), None);
            assert_eq!(Value::coerce("   ", ty), None);
        }
    }
}
