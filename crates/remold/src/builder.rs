//! Schema builder: turns a raw table into a typed schema plus
//! normalized rows, accumulating row-level issues along the way.
//!
//! The builder never aborts on a bad row. Every defect is recovered
//! locally (key substitution, null fallback) and recorded as a
//! [`RowIssue`]; only a table with no headers or no data rows is
//! rejected, and the orchestrator turns that into a skip record.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RemoldError, Result};
use crate::ident::IdentSet;
use crate::infer;
use crate::input::RawTable;
use crate::schema::{ColumnSchema, ColumnType, NormalizedRow, TableSchema, Value};

/// Kind of row-level defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// The natural key value is not a canonical UUID; a substitute was
    /// generated.
    InvalidKey,
    /// A non-empty value failed coercion into the column type and was
    /// stored as null.
    CoercionFallback,
    /// The value embeds quotes or newlines; the serializer must escape
    /// them. Informational.
    SpecialCharacters,
    /// The designated name/title column is blank.
    MissingLabel,
}

/// One recovered row-level defect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowIssue {
    pub kind: IssueKind,
    /// Source line number (the header is line 1).
    pub line: usize,
    /// Normalized name of the affected column.
    pub column: String,
    /// The offending raw value.
    pub value: String,
}

impl RowIssue {
    fn new(kind: IssueKind, line: usize, column: &str, value: &str) -> Self {
        Self {
            kind,
            line,
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

/// Output of building one table.
#[derive(Debug, Clone)]
pub struct TableBuild {
    pub schema: TableSchema,
    pub rows: Vec<NormalizedRow>,
    pub issues: Vec<RowIssue>,
}

impl TableBuild {
    /// The set of valid post-substitution primary keys.
    pub fn key_set(&self) -> HashSet<&str> {
        self.rows.iter().map(|r| r.key.as_str()).collect()
    }

    /// Number of issues of one kind.
    pub fn issue_count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

/// Configuration for schema building.
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Leading rows sampled for type inference.
    pub sample_size: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self { sample_size: 20 }
    }
}

/// Builds table schemas and normalized rows.
pub struct SchemaBuilder {
    config: BuilderConfig,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::with_config(BuilderConfig::default())
    }

    pub fn with_config(config: BuilderConfig) -> Self {
        Self { config }
    }

    /// Build the schema and normalized rows for one raw table.
    ///
    /// `table_names` is the migration-wide identifier set; it guarantees
    /// the normalized table name is unique across the run.
    pub fn build(&self, raw: &RawTable, table_names: &mut IdentSet) -> Result<TableBuild> {
        if raw.headers.is_empty() || raw.rows.is_empty() {
            return Err(RemoldError::EmptyTable(raw.name.clone()));
        }

        let table_name = table_names.allocate(&raw.name);

        let mut idents = IdentSet::new();
        let normalized: Vec<String> = raw.headers.iter().map(|h| idents.allocate(h)).collect();
        let has_natural_key = normalized.iter().any(|n| n == "id");

        let mut columns = Vec::with_capacity(raw.headers.len() + 3);
        for (idx, header) in raw.headers.iter().enumerate() {
            let name = normalized[idx].clone();
            let column = if name == "id" {
                // The natural key is always stored as UUID, malformed
                // source values get substituted per row below.
                ColumnSchema::from_source(header, name, idx, ColumnType::Uuid).primary_key()
            } else {
                let samples = raw
                    .rows
                    .iter()
                    .take(self.config.sample_size)
                    .map(|r| r.get(idx).map(|s| s.as_str()).unwrap_or(""));
                ColumnSchema::from_source(header, name, idx, infer::infer_column_type(samples))
            };
            columns.push(column);
        }

        if !has_natural_key {
            columns.insert(
                0,
                ColumnSchema::synthetic(idents.allocate("id"), ColumnType::Uuid).primary_key(),
            );
            columns.push(ColumnSchema::synthetic(
                idents.allocate("created_at"),
                ColumnType::Timestamp,
            ));
            columns.push(ColumnSchema::synthetic(
                idents.allocate("updated_at"),
                ColumnType::Timestamp,
            ));
        }

        let label_column = pick_label_column(&raw.headers, &normalized);

        let schema = TableSchema {
            name: table_name,
            original_name: raw.name.clone(),
            columns,
            has_natural_key,
            label_column,
        };

        let (key_name, key_index) = match schema.primary_key() {
            Some(column) => (column.name.clone(), column.source_index),
            None => ("id".to_string(), None),
        };

        let mut rows = Vec::with_capacity(raw.rows.len());
        let mut issues = Vec::new();

        for (row_idx, cells) in raw.rows.iter().enumerate() {
            let line = row_idx + 2;

            let (key, original_key, substituted) = match key_index {
                Some(idx) => {
                    let raw_id = cells.get(idx).map(|s| s.trim()).unwrap_or("");
                    if infer::UUID_RE.is_match(raw_id) {
                        (raw_id.to_lowercase(), Some(raw_id.to_string()), false)
                    } else {
                        issues.push(RowIssue::new(IssueKind::InvalidKey, line, &key_name, raw_id));
                        (Uuid::new_v4().to_string(), Some(raw_id.to_string()), true)
                    }
                }
                None => (Uuid::new_v4().to_string(), None, false),
            };

            let mut values: IndexMap<String, Option<Value>> = IndexMap::new();
            for column in &schema.columns {
                let raw_val = column
                    .source_index
                    .map(|idx| cells.get(idx).map(|s| s.as_str()).unwrap_or(""))
                    .unwrap_or("");

                if raw_val.contains('\'') || raw_val.contains('"') || raw_val.contains('\n') {
                    issues.push(RowIssue::new(
                        IssueKind::SpecialCharacters,
                        line,
                        &column.name,
                        raw_val,
                    ));
                }

                if column.is_primary_key {
                    values.insert(column.name.clone(), Some(Value::Uuid(key.clone())));
                    continue;
                }
                if column.source_index.is_none() {
                    // Audit timestamps are filled by database defaults.
                    continue;
                }

                if raw_val.trim().is_empty() {
                    values.insert(column.name.clone(), None);
                    continue;
                }
                match Value::coerce(raw_val, column.inferred_type) {
                    Some(value) => {
                        values.insert(column.name.clone(), Some(value));
                    }
                    None => {
                        issues.push(RowIssue::new(
                            IssueKind::CoercionFallback,
                            line,
                            &column.name,
                            raw_val,
                        ));
                        values.insert(column.name.clone(), None);
                    }
                }
            }

            if let Some(label) = &schema.label_column {
                let blank = schema
                    .get_column(label)
                    .and_then(|c| c.source_index)
                    .map(|idx| cells.get(idx).map(|s| s.trim().is_empty()).unwrap_or(true))
                    .unwrap_or(false);
                if blank {
                    issues.push(RowIssue::new(IssueKind::MissingLabel, line, label, ""));
                }
            }

            rows.push(NormalizedRow {
                table: schema.name.clone(),
                key,
                values,
                original_key,
                substituted,
            });
        }

        Ok(TableBuild { schema, rows, issues })
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the designated name/title column; falls back to the first one.
fn pick_label_column(headers: &[String], normalized: &[String]) -> Option<String> {
    let score = |header: &str| -> i32 {
        let lower = header.to_lowercase();
        let mut s = 0;
        if lower == "name" {
            s += 3;
        }
        if lower.contains("name") {
            s += 2;
        }
        if lower.contains("title") || lower.contains("libell") {
            s += 2;
        }
        if lower.contains("nom") {
            s += 2;
        }
        s
    };

    let mut best: Option<usize> = None;
    let mut best_score = -1;
    for (idx, header) in headers.iter().enumerate() {
        let sc = score(header);
        if sc > best_score {
            best = Some(idx);
            best_score = sc;
        }
    }

    best.map(|idx| normalized[idx].clone())
}
