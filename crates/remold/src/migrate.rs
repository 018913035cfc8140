//! Main Migrator struct and public API.
//!
//! Conversion is strictly two-phase: every table's schema and rows are
//! built before any relation or artifact work starts, because a single
//! relation needs the post-substitution key sets of two tables.

use chrono::Utc;

use crate::artifacts::{Artifact, ArtifactAssociator, AssociationSet};
use crate::builder::{BuilderConfig, IssueKind, SchemaBuilder, TableBuild};
use crate::error::RemoldError;
use crate::ident::IdentSet;
use crate::input::{RawTable, SourceMetadata, TableSource};
use crate::relations::{
    DetectorConfig, RelationDetector, RelationResolver, ResolvedRelation, UnresolvedKind,
    UnresolvedReference,
};
use crate::report::{
    MigrationReport, ReportTotals, SkippedTable, TableReport, UnresolvedCounts,
};

/// Configuration for a migration run.
#[derive(Debug, Clone, Default)]
pub struct MigratorConfig {
    pub builder: BuilderConfig,
    pub detector: DetectorConfig,
}

/// One fully converted table: raw input kept as the audit side-table,
/// the build output, and the artifact associations.
#[derive(Debug, Clone)]
pub struct TableConversion {
    pub raw: RawTable,
    pub metadata: Option<SourceMetadata>,
    pub artifacts: Vec<Artifact>,
    pub build: TableBuild,
    pub associations: AssociationSet,
}

impl TableConversion {
    pub fn new(raw: RawTable, build: TableBuild) -> Self {
        Self {
            raw,
            metadata: None,
            artifacts: Vec::new(),
            build,
            associations: AssociationSet::default(),
        }
    }
}

/// Result of converting an export.
#[derive(Debug, Clone)]
pub struct Migration {
    pub tables: Vec<TableConversion>,
    pub skipped: Vec<SkippedTable>,
    pub relations: Vec<ResolvedRelation>,
    pub unresolved: Vec<UnresolvedReference>,
    pub report: MigrationReport,
}

/// The conversion engine.
pub struct Migrator {
    builder: SchemaBuilder,
    detector: RelationDetector,
    resolver: RelationResolver,
    associator: ArtifactAssociator,
}

impl Migrator {
    /// Create a migrator with default configuration.
    pub fn new() -> Self {
        Self::with_config(MigratorConfig::default())
    }

    /// Create a migrator with custom configuration.
    pub fn with_config(config: MigratorConfig) -> Self {
        Self {
            builder: SchemaBuilder::with_config(config.builder),
            detector: RelationDetector::with_config(config.detector),
            resolver: RelationResolver::new(),
            associator: ArtifactAssociator::new(),
        }
    }

    /// Convert a set of table sources into the relational IR.
    ///
    /// Never fails: data-quality problems end up in the report, not in
    /// an error. Fatal conditions live with the input reader.
    pub fn convert(&self, sources: Vec<TableSource>) -> Migration {
        let mut table_names = IdentSet::new();
        let mut tables = Vec::with_capacity(sources.len());
        let mut skipped = Vec::new();

        // Phase 1: build every schema and row set.
        for source in sources {
            match self.builder.build(&source.table, &mut table_names) {
                Ok(build) => tables.push(TableConversion {
                    raw: source.table,
                    metadata: source.metadata,
                    artifacts: source.artifacts,
                    build,
                    associations: AssociationSet::default(),
                }),
                Err(RemoldError::EmptyTable(name)) => skipped.push(SkippedTable {
                    name,
                    reason: "no headers or no data rows".to_string(),
                }),
                Err(other) => skipped.push(SkippedTable {
                    name: source.table.name.clone(),
                    reason: other.to_string(),
                }),
            }
        }

        // Phase 2: relations and artifacts against the complete state.
        let detected = self.detector.detect(&tables);
        let (relations, unresolved) = self.resolver.resolve(detected, &tables);

        for conversion in &mut tables {
            conversion.associations = self
                .associator
                .associate(&conversion.artifacts, &conversion.build);
        }

        let report = build_report(&tables, &skipped, &relations, &unresolved);

        Migration {
            tables,
            skipped,
            relations,
            unresolved,
            report,
        }
    }
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new()
    }
}

fn build_report(
    tables: &[TableConversion],
    skipped: &[SkippedTable],
    relations: &[ResolvedRelation],
    unresolved: &[UnresolvedReference],
) -> MigrationReport {
    let mut totals = ReportTotals {
        tables: tables.len(),
        skipped_tables: skipped.len(),
        relations: relations.len(),
        ..ReportTotals::default()
    };

    let mut table_reports = Vec::with_capacity(tables.len());
    for conversion in tables {
        let build = &conversion.build;
        let report = TableReport {
            table: build.schema.name.clone(),
            original_name: build.schema.original_name.clone(),
            rows: build.rows.len(),
            columns: build.schema.column_count(),
            invalid_keys: build.issue_count(IssueKind::InvalidKey),
            coercion_fallbacks: build.issue_count(IssueKind::CoercionFallback),
            special_characters: build.issue_count(IssueKind::SpecialCharacters),
            missing_labels: build.issue_count(IssueKind::MissingLabel),
            artifacts: conversion.artifacts.len(),
            orphan_artifacts: conversion.associations.orphans.len(),
            rows_without_artifact: conversion.associations.rows_without_artifact.len(),
        };

        totals.rows += report.rows;
        totals.invalid_keys += report.invalid_keys;
        totals.coercion_fallbacks += report.coercion_fallbacks;
        totals.special_characters += report.special_characters;
        totals.missing_labels += report.missing_labels;
        totals.artifacts += report.artifacts;
        totals.orphan_artifacts += report.orphan_artifacts;
        totals.rows_without_artifact += report.rows_without_artifact;

        table_reports.push(report);
    }

    totals.unresolved_targets = relations
        .iter()
        .filter(|r| r.relation.target_table.is_none())
        .count();
    totals.links = relations.iter().map(|r| r.links.len()).sum();

    let mut counts = UnresolvedCounts::default();
    for reference in unresolved {
        match reference.kind {
            UnresolvedKind::SourceKeyInvalid => counts.source_key_invalid += 1,
            UnresolvedKind::TargetKeyInvalid => counts.target_key_invalid += 1,
            UnresolvedKind::DisplayNameNotFound => counts.display_name_not_found += 1,
        }
    }
    totals.unresolved_references = counts;

    MigrationReport {
        generated_at: Utc::now(),
        tables: table_reports,
        skipped: skipped.to_vec(),
        totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RawTable;

    const TOLKIEN: &str = "d47ec620-2190-11ef-910c-f1df4955273f";
    const LEWIS: &str = "11111111-2222-4333-8444-555555555555";
    const HOBBIT: &str = "a1b2c3d4-0000-4abc-8000-000000000001";

    fn source(name: &str, headers: Vec<&str>, rows: Vec<Vec<&str>>) -> TableSource {
        TableSource::from_table(RawTable::new(
            name,
            headers.into_iter().map(String::from).collect(),
            rows.into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
        ))
    }

    #[test]
    fn test_two_phase_conversion() {
        let migrator = Migrator::new();
        let migration = migrator.convert(vec![
            source(
                "Authors",
                vec!["Id", "Name"],
                vec![vec![TOLKIEN, "J.R.R. Tolkien"], vec![LEWIS, "C.S. Lewis"]],
            ),
            source(
                "Books",
                vec!["Id", "Name", "Authors"],
                vec![vec![HOBBIT, "The Hobbit", "J.R.R. Tolkien,C.S. Lewis"]],
            ),
        ]);

        assert_eq!(migration.tables.len(), 2);
        assert_eq!(migration.relations.len(), 1);
        assert_eq!(migration.report.totals.links, 2);
        assert!(migration.unresolved.is_empty());
    }

    #[test]
    fn test_empty_table_skipped_not_fatal() {
        let migrator = Migrator::new();
        let migration = migrator.convert(vec![
            source("Empty", vec!["Id", "Name"], vec![]),
            source(
                "Authors",
                vec!["Id", "Name"],
                vec![vec![TOLKIEN, "J.R.R. Tolkien"]],
            ),
        ]);

        assert_eq!(migration.tables.len(), 1);
        assert_eq!(migration.skipped.len(), 1);
        assert_eq!(migration.skipped[0].name, "Empty");
        assert_eq!(migration.report.totals.skipped_tables, 1);
    }

    #[test]
    fn test_duplicate_table_names_disambiguated() {
        let migrator = Migrator::new();
        let migration = migrator.convert(vec![
            source("Table A", vec!["Id"], vec![vec![TOLKIEN]]),
            source("Table-A", vec!["Id"], vec![vec![HOBBIT]]),
        ]);

        let names: Vec<&str> = migration
            .tables
            .iter()
            .map(|t| t.build.schema.name.as_str())
            .collect();
        assert_eq!(names, vec!["table_a", "table_a_2"]);
    }

    #[test]
    fn test_report_counts_issues() {
        let migrator = Migrator::new();
        let migration = migrator.convert(vec![source(
            "Books",
            vec!["Id", "Name", "Rating"],
            vec![vec!["bad-id", "The Hobbit", "9"]],
        )]);

        let row = &migration.tables[0].build.rows[0];
        assert!(row.substituted);
        assert_eq!(row.original_key.as_deref(), Some("bad-id"));
        assert_eq!(migration.report.totals.invalid_keys, 1);
        assert!(migration.report.has_problems());
    }
}
