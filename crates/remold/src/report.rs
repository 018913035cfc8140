//! Structured diagnostics for a migration run.
//!
//! The report is the sole output of a dry run: counts of everything
//! that was recovered, skipped or left unmatched, serializable as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A table that could not be converted (no headers or no data rows).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedTable {
    /// Display name of the source table.
    pub name: String,
    pub reason: String,
}

/// Per-table diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    /// Normalized table name.
    pub table: String,
    /// Display name of the source table.
    pub original_name: String,
    pub rows: usize,
    pub columns: usize,
    pub invalid_keys: usize,
    pub coercion_fallbacks: usize,
    pub special_characters: usize,
    pub missing_labels: usize,
    pub artifacts: usize,
    pub orphan_artifacts: usize,
    pub rows_without_artifact: usize,
}

/// Unresolved references grouped by kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnresolvedCounts {
    pub source_key_invalid: usize,
    pub target_key_invalid: usize,
    pub display_name_not_found: usize,
}

impl UnresolvedCounts {
    pub fn total(&self) -> usize {
        self.source_key_invalid + self.target_key_invalid + self.display_name_not_found
    }
}

/// Grand totals across all tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportTotals {
    pub tables: usize,
    pub skipped_tables: usize,
    pub rows: usize,
    pub invalid_keys: usize,
    pub coercion_fallbacks: usize,
    pub special_characters: usize,
    pub missing_labels: usize,
    /// Detected relations, including those without a guessed target.
    pub relations: usize,
    /// Relations whose target table could not be guessed.
    pub unresolved_targets: usize,
    pub links: usize,
    pub unresolved_references: UnresolvedCounts,
    pub artifacts: usize,
    pub orphan_artifacts: usize,
    pub rows_without_artifact: usize,
}

/// Full diagnostic report for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    pub generated_at: DateTime<Utc>,
    pub tables: Vec<TableReport>,
    pub skipped: Vec<SkippedTable>,
    pub totals: ReportTotals,
}

impl MigrationReport {
    /// Whether anything needed corrective handling.
    pub fn has_problems(&self) -> bool {
        let t = &self.totals;
        t.skipped_tables > 0
            || t.invalid_keys > 0
            || t.coercion_fallbacks > 0
            || t.unresolved_references.total() > 0
            || t.orphan_artifacts > 0
    }
}
