//! Table-level schema definition.

use serde::{Deserialize, Serialize};

use super::column::ColumnSchema;

/// Schema for an entire table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Normalized table name, unique across the migration.
    pub name: String,
    /// Display name of the source table.
    pub original_name: String,
    /// Schemas for each column, in emission order.
    pub columns: Vec<ColumnSchema>,
    /// Whether the source supplied its own identifier column.
    pub has_natural_key: bool,
    /// Normalized name of the designated name/title column, used for
    /// display-name matching.
    pub label_column: Option<String>,
}

impl TableSchema {
    /// Get the primary key column. Every built table has exactly one.
    pub fn primary_key(&self) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.is_primary_key)
    }

    /// Get a column by normalized name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get all normalized column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get the number of columns, synthetic ones included.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}
