//! Relation detection: which columns encode references to other tables.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ident::sanitize_name;
use crate::migrate::TableConversion;

/// Column-name shape like "PSM-Insights" or "Action-Objectif".
static HYPHENATED_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][a-z]+-[A-Z]").unwrap());

/// Trailing `_id`/`_ids` on a normalized name.
static ID_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_ids?$").unwrap());

/// A detected reference column. Immutable after detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    /// Normalized name of the owning table.
    pub source_table: String,
    /// Normalized name of the reference column.
    pub source_column: String,
    /// The column's display name in the source.
    pub original_column: String,
    /// Guessed target table; `None` means the values stay opaque text.
    pub target_table: Option<String>,
    /// True when sampled values held comma-separated lists.
    pub multi_valued: bool,
}

/// Configuration for relation detection.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Substrings that exclude a column from detection, matched against
    /// the lowercased original name. Deliberately loose: over-excluding
    /// beats turning free text into junction rows.
    pub ignore_columns: Vec<String>,
    /// Leading rows sampled when looking for list separators.
    pub sample_size: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            ignore_columns: [
                // System fields
                "id", "public_id", "name", "creation_date", "modification_date",
                "created_by",
                // Plain scalar data
                "age", "score", "date", "time", "year", "month", "day",
                "count", "total", "sum", "average", "min", "max",
                // Free text
                "description", "comment", "note", "text", "content", "body",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            sample_size: 20,
        }
    }
}

/// Scans non-key columns of every table for relation candidates.
pub struct RelationDetector {
    config: DetectorConfig,
}

impl RelationDetector {
    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    pub fn with_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Detect relation columns across all converted tables.
    pub fn detect(&self, tables: &[TableConversion]) -> Vec<Relation> {
        let table_names: Vec<String> = tables
            .iter()
            .map(|t| t.build.schema.name.clone())
            .collect();

        let mut relations = Vec::new();
        for conversion in tables {
            let schema = &conversion.build.schema;
            for column in &schema.columns {
                if column.is_primary_key || column.synthetic {
                    continue;
                }
                if self.is_ignored(&column.original_name) {
                    continue;
                }

                let Some(src) = column.source_index else {
                    continue;
                };
                let has_commas = conversion
                    .raw
                    .column_values(src)
                    .take(self.config.sample_size)
                    .any(|v| v.contains(','));

                let name_hit = HYPHENATED_REF_RE.is_match(&column.original_name)
                    || ID_SUFFIX_RE.is_match(&column.name);

                if !has_commas && !name_hit {
                    continue;
                }

                relations.push(Relation {
                    source_table: schema.name.clone(),
                    source_column: column.name.clone(),
                    original_column: column.original_name.clone(),
                    target_table: guess_target_table(&column.original_name, &table_names),
                    multi_valued: has_commas,
                });
            }
        }

        relations
    }

    fn is_ignored(&self, original_name: &str) -> bool {
        let lower = original_name.to_lowercase();
        self.config
            .ignore_columns
            .iter()
            .any(|ignored| lower.contains(ignored))
    }
}

impl Default for RelationDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Guess which table a reference column points at.
///
/// Tries, in order: exact match of the sanitized column name, mutual
/// substring containment, exact match after stripping a trailing
/// `_id`/`_ids`. `None` means the column stays plain text downstream.
pub fn guess_target_table(column_name: &str, tables: &[String]) -> Option<String> {
    let clean = sanitize_name(column_name);

    if tables.iter().any(|t| *t == clean) {
        return Some(clean);
    }

    for table in tables {
        if clean.contains(table.as_str()) || table.contains(&clean) {
            return Some(table.clone());
        }
    }

    let stripped = ID_SUFFIX_RE.replace(&clean, "");
    if stripped != clean && tables.iter().any(|t| *t == stripped) {
        return Some(stripped.into_owned());
    }

    None
}
