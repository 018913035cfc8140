//! Column schema definition.

use serde::{Deserialize, Serialize};

use super::types::ColumnType;

/// Schema for a single column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Name as it appeared in the source header.
    pub original_name: String,
    /// Normalized identifier, unique within the table.
    pub name: String,
    /// Index of the backing column in the raw table; `None` for
    /// builder-allocated columns.
    pub source_index: Option<usize>,
    /// Inferred scalar type.
    pub inferred_type: ColumnType,
    /// Whether this column is the table's primary key.
    pub is_primary_key: bool,
    /// True for builder-allocated columns (surrogate key, audit
    /// timestamps); the SQL writer gives these defaults.
    pub synthetic: bool,
}

impl ColumnSchema {
    /// A column backed by a source header.
    pub fn from_source(
        original_name: impl Into<String>,
        name: impl Into<String>,
        source_index: usize,
        inferred_type: ColumnType,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            name: name.into(),
            source_index: Some(source_index),
            inferred_type,
            is_primary_key: false,
            synthetic: false,
        }
    }

    /// A builder-allocated column with no source counterpart.
    pub fn synthetic(name: impl Into<String>, inferred_type: ColumnType) -> Self {
        let name = name.into();
        Self {
            original_name: String::new(),
            name,
            source_index: None,
            inferred_type,
            is_primary_key: false,
            synthetic: true,
        }
    }

    /// Mark this column as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }
}
