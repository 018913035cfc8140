//! Normalized row records.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::Value;

/// A source row after key validation and typed coercion.
///
/// `key` is always a structurally valid, lowercase canonical UUID: the
/// source value when it conformed, a generated substitute otherwise.
/// The raw source row is retained on the owning conversion as the audit
/// side-table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRow {
    /// Normalized name of the owning table.
    pub table: String,
    /// Primary key value.
    pub key: String,
    /// Typed values keyed by normalized column name. `None` is a null;
    /// columns filled by database defaults are absent entirely.
    pub values: IndexMap<String, Option<Value>>,
    /// The raw source identifier before any substitution.
    pub original_key: Option<String>,
    /// True if the source identifier failed validation and was replaced.
    pub substituted: bool,
}

impl NormalizedRow {
    /// Get the value stored under a normalized column name, if non-null.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.values.get(column).and_then(|v| v.as_ref())
    }

    /// Render the value under `column` as display text for matching.
    pub fn display_text(&self, column: &str) -> Option<String> {
        self.value(column).map(|v| v.to_string())
    }
}
