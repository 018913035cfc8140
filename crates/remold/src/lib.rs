//! Remold: schema inference and relation resolution for flat-file exports.
//!
//! Remold takes a directory-per-table export (CSV tables plus loosely
//! associated Markdown descriptions) and converts it into a relational
//! intermediate representation: typed table schemas, normalized rows with
//! guaranteed-valid keys, inferred many-to-many relations, and artifact
//! associations. Everything that needed corrective handling lands in a
//! structured diagnostic report; SQL emission is a separate, final step.
//!
//! # Core Principles
//!
//! - **Best effort**: data-quality problems are recovered and reported,
//!   never fatal. Only a missing export root aborts a run.
//! - **Two-phase**: every table is fully built before any cross-table
//!   resolution starts.
//! - **Traceable**: substituted keys keep their original value, raw rows
//!   stay available next to the normalized ones.
//!
//! # Example
//!
//! ```no_run
//! use remold::{ExportReader, Migrator, SqlWriter};
//!
//! let scan = ExportReader::new().read("export/Important").unwrap();
//! let migration = Migrator::new().convert(scan.sources);
//!
//! println!("tables: {}", migration.tables.len());
//! println!("links: {}", migration.report.totals.links);
//!
//! let sql = SqlWriter::new().write_tables(&migration);
//! ```

pub mod artifacts;
pub mod builder;
pub mod error;
pub mod ident;
pub mod infer;
pub mod input;
pub mod relations;
pub mod report;
pub mod schema;
pub mod sql;

mod migrate;

pub use artifacts::{Artifact, ArtifactAssociator, Association, AssociationSet, MatchKind};
pub use builder::{BuilderConfig, IssueKind, RowIssue, SchemaBuilder, TableBuild};
pub use error::{RemoldError, Result};
pub use ident::{IdentSet, sanitize_name};
pub use input::{ExportReader, ExportScan, Parser, RawTable, SourceMetadata, TableSource};
pub use migrate::{Migration, Migrator, MigratorConfig, TableConversion};
pub use relations::{
    DetectorConfig, Link, Relation, RelationDetector, RelationResolver, ResolvedRelation,
    UnresolvedKind, UnresolvedReference,
};
pub use report::{MigrationReport, ReportTotals, SkippedTable, TableReport, UnresolvedCounts};
pub use schema::{ColumnSchema, ColumnType, NormalizedRow, TableSchema, Value};
pub use sql::{SqlOptions, SqlWriter};
