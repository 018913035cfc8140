//! PostgreSQL serialization of a finished migration.
//!
//! Straight string emission from the IR. Identifiers are already safe
//! (normalized upstream); values go through [`escape_value`].

use std::collections::HashSet;
use std::fmt::Write;

use crate::migrate::{Migration, TableConversion};
use crate::relations::ResolvedRelation;
use crate::schema::{ColumnSchema, ColumnType, Value};

/// Options for SQL emission.
#[derive(Debug, Clone)]
pub struct SqlOptions {
    /// Target schema name.
    pub schema: String,
    /// Rows per INSERT statement.
    pub batch_size: usize,
    /// Emit `DROP TABLE IF EXISTS ... CASCADE` before each table.
    pub drop_existing: bool,
}

impl Default for SqlOptions {
    fn default() -> Self {
        Self {
            schema: "export".to_string(),
            batch_size: 100,
            drop_existing: true,
        }
    }
}

/// Writes SQL scripts from a [`Migration`].
pub struct SqlWriter {
    options: SqlOptions,
}

impl SqlWriter {
    pub fn new() -> Self {
        Self::with_options(SqlOptions::default())
    }

    pub fn with_options(options: SqlOptions) -> Self {
        Self { options }
    }

    /// DDL and batched inserts for every converted table.
    pub fn write_tables(&self, migration: &Migration) -> String {
        let schema = &self.options.schema;
        let mut sql = String::new();

        let _ = writeln!(sql, "CREATE SCHEMA IF NOT EXISTS {schema};");
        let _ = writeln!(sql, "SET search_path TO {schema}, public;");
        sql.push('\n');

        for conversion in &migration.tables {
            sql.push_str(&self.table_ddl(conversion));
            sql.push_str(&self.table_inserts(conversion));
        }

        sql.push_str("RESET search_path;\n");
        sql
    }

    /// Junction tables and guarded inserts for resolved relations.
    pub fn write_relations(&self, migration: &Migration) -> String {
        let schema = &self.options.schema;
        let mut sql = String::new();

        let _ = writeln!(sql, "SET search_path TO {schema}, public;");
        sql.push('\n');

        let mut created: HashSet<String> = HashSet::new();
        for resolved in &migration.relations {
            let Some(junction) = self.junction_ddl(resolved, &mut created) else {
                continue;
            };
            sql.push_str(&junction);
        }

        for resolved in &migration.relations {
            sql.push_str(&self.junction_inserts(resolved));
        }

        sql.push_str("RESET search_path;\n");
        sql
    }

    /// Column additions and updates carrying artifact content.
    pub fn write_descriptions(&self, migration: &Migration) -> String {
        let schema = &self.options.schema;
        let mut sql = String::new();

        for conversion in &migration.tables {
            if conversion.associations.associations.is_empty() {
                continue;
            }
            let table = &conversion.build.schema.name;

            let _ = writeln!(
                sql,
                "-- Descriptions for {} ({} matched)",
                conversion.build.schema.original_name,
                conversion.associations.associations.len()
            );
            let _ = writeln!(
                sql,
                "ALTER TABLE {schema}.{table} ADD COLUMN IF NOT EXISTS description_content TEXT;"
            );
            sql.push('\n');

            for association in &conversion.associations.associations {
                let Some(artifact) = conversion
                    .artifacts
                    .iter()
                    .find(|a| a.path == association.path)
                else {
                    continue;
                };
                let _ = writeln!(sql, "UPDATE {schema}.{table}");
                let _ = writeln!(
                    sql,
                    "SET description_content = {}",
                    escape_text(&artifact.content)
                );
                let _ = writeln!(sql, "WHERE id = '{}';", association.row_key);
                sql.push('\n');
            }
        }

        sql
    }

    fn table_ddl(&self, conversion: &TableConversion) -> String {
        let schema = &self.options.schema;
        let table = &conversion.build.schema;
        let mut sql = String::new();

        let _ = writeln!(sql, "-- Table: {} (source: {})", table.name, table.original_name);
        if self.options.drop_existing {
            let _ = writeln!(sql, "DROP TABLE IF EXISTS {schema}.{} CASCADE;", table.name);
        }

        let _ = writeln!(sql, "CREATE TABLE {schema}.{} (", table.name);
        let defs: Vec<String> = table.columns.iter().map(column_def).collect();
        sql.push_str(&defs.join(",\n"));
        sql.push_str("\n);\n");

        let _ = writeln!(
            sql,
            "COMMENT ON TABLE {schema}.{} IS {};",
            table.name,
            escape_text(&format!(
                "Migrated from export: {} | {} rows",
                table.original_name,
                conversion.build.rows.len()
            ))
        );
        sql.push('\n');
        sql
    }

    fn table_inserts(&self, conversion: &TableConversion) -> String {
        let schema = &self.options.schema;
        let table = &conversion.build.schema;
        let mut sql = String::new();

        // Audit timestamps keep their defaults; everything else, the
        // surrogate key included, is inserted explicitly.
        let columns: Vec<&ColumnSchema> = table
            .columns
            .iter()
            .filter(|c| c.source_index.is_some() || c.is_primary_key)
            .collect();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();

        for batch in conversion.build.rows.chunks(self.options.batch_size.max(1)) {
            let _ = writeln!(
                sql,
                "INSERT INTO {schema}.{} ({}) VALUES",
                table.name,
                names.join(", ")
            );
            let lines: Vec<String> = batch
                .iter()
                .map(|row| {
                    let rendered: Vec<String> = columns
                        .iter()
                        .map(|c| escape_value(row.values.get(&c.name).and_then(|v| v.as_ref())))
                        .collect();
                    format!("  ({})", rendered.join(", "))
                })
                .collect();
            sql.push_str(&lines.join(",\n"));
            sql.push_str(";\n\n");
        }

        sql
    }

    fn junction_ddl(
        &self,
        resolved: &ResolvedRelation,
        created: &mut HashSet<String>,
    ) -> Option<String> {
        let schema = &self.options.schema;
        let relation = &resolved.relation;
        let target = relation.target_table.as_deref()?;

        let (name, left, right) = junction_parts(&relation.source_table, target);
        if !created.insert(name.clone()) {
            return None;
        }

        let mut sql = String::new();
        let _ = writeln!(sql, "-- Junction: {} <-> {}", relation.source_table, target);
        if self.options.drop_existing {
            let _ = writeln!(sql, "DROP TABLE IF EXISTS {schema}.{name} CASCADE;");
        }
        let _ = writeln!(sql, "CREATE TABLE {schema}.{name} (");
        let _ = writeln!(sql, "  {left} UUID NOT NULL,");
        let _ = writeln!(sql, "  {right} UUID NOT NULL,");
        let _ = writeln!(sql, "  created_at TIMESTAMPTZ DEFAULT NOW(),");
        let _ = writeln!(sql, "  PRIMARY KEY ({left}, {right})");
        let _ = writeln!(sql, ");");
        let _ = writeln!(sql, "CREATE INDEX idx_{name}_{left} ON {schema}.{name}({left});");
        let _ = writeln!(sql, "CREATE INDEX idx_{name}_{right} ON {schema}.{name}({right});");
        sql.push('\n');
        Some(sql)
    }

    fn junction_inserts(&self, resolved: &ResolvedRelation) -> String {
        let schema = &self.options.schema;
        let relation = &resolved.relation;
        let Some(target) = relation.target_table.as_deref() else {
            return String::new();
        };
        if resolved.links.is_empty() {
            return format!(
                "-- Relation {}.{}: no valid links\n\n",
                relation.source_table, relation.source_column
            );
        }

        let (name, left, right) = junction_parts(&relation.source_table, target);
        let left_table = junction_owner(&relation.source_table, target, true);
        let right_table = junction_owner(&relation.source_table, target, false);

        let mut sql = String::new();
        let _ = writeln!(
            sql,
            "-- Relation: {}.{} -> {}",
            relation.source_table, relation.source_column, target
        );
        let _ = writeln!(sql, "INSERT INTO {schema}.{name} ({left}, {right})");
        let _ = writeln!(sql, "SELECT * FROM (VALUES");

        let values: Vec<String> = resolved
            .links
            .iter()
            .map(|link| {
                // Links store source/target; junction columns follow the
                // sorted table-name order.
                let (a, b) = if relation.source_table.as_str() <= target {
                    (&link.source_key, &link.target_key)
                } else {
                    (&link.target_key, &link.source_key)
                };
                format!("  ('{a}'::UUID, '{b}'::UUID)")
            })
            .collect();
        sql.push_str(&values.join(",\n"));
        sql.push('\n');

        let _ = writeln!(sql, ") AS candidate_links({left}, {right})");
        let _ = writeln!(
            sql,
            "WHERE EXISTS (SELECT 1 FROM {schema}.{left_table} WHERE id = candidate_links.{left})"
        );
        let _ = writeln!(
            sql,
            "AND EXISTS (SELECT 1 FROM {schema}.{right_table} WHERE id = candidate_links.{right})"
        );
        let _ = writeln!(sql, "ON CONFLICT ({left}, {right}) DO NOTHING;");
        sql.push('\n');
        sql
    }
}

impl Default for SqlWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Junction name and id column names for a table pair, normalized by
/// sorting the table names. Self-relations get distinguishable columns.
fn junction_parts(source: &str, target: &str) -> (String, String, String) {
    let (a, b) = if source <= target {
        (source, target)
    } else {
        (target, source)
    };
    if a == b {
        (format!("{a}_{b}"), format!("{a}_source_id"), format!("{a}_target_id"))
    } else {
        (format!("{a}_{b}"), format!("{a}_id"), format!("{b}_id"))
    }
}

fn junction_owner(source: &str, target: &str, left: bool) -> String {
    let (a, b) = if source <= target {
        (source, target)
    } else {
        (target, source)
    };
    if left { a.to_string() } else { b.to_string() }
}

/// One column definition line.
fn column_def(column: &ColumnSchema) -> String {
    let mut def = format!("  {} {}", column.name, column.inferred_type.sql_type());
    if column.synthetic {
        match column.inferred_type {
            ColumnType::Uuid => def.push_str(" DEFAULT gen_random_uuid()"),
            ColumnType::Timestamp => def.push_str(" DEFAULT NOW()"),
            _ => {}
        }
    }
    if column.is_primary_key {
        def.push_str(" PRIMARY KEY");
    }
    def
}

/// Escape a typed value as a SQL literal. Nulls render as `NULL`.
pub fn escape_value(value: Option<&Value>) -> String {
    match value {
        None => "NULL".to_string(),
        Some(Value::Boolean(true)) => "TRUE".to_string(),
        Some(Value::Boolean(false)) => "FALSE".to_string(),
        Some(Value::Integer(i)) => i.to_string(),
        Some(Value::Decimal(d)) => d.to_string(),
        Some(Value::Date(d)) => format!("'{}'", d.format("%Y-%m-%d")),
        Some(Value::Timestamp(t)) => format!("'{}'", t.to_rfc3339()),
        Some(Value::Uuid(s)) => format!("'{s}'"),
        Some(Value::Text(s)) => escape_text(s),
    }
}

/// Quote a string literal, doubling embedded single quotes. Newlines
/// stay as-is inside the quotes.
pub fn escape_text(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{RawTable, TableSource};
    use crate::migrate::Migrator;

    const TOLKIEN: &str = "d47ec620-2190-11ef-910c-f1df4955273f";
    const LEWIS: &str = "11111111-2222-4333-8444-555555555555";
    const HOBBIT: &str = "a1b2c3d4-0000-4abc-8000-000000000001";

    fn migration() -> Migration {
        let source = |name: &str, headers: Vec<&str>, rows: Vec<Vec<&str>>| {
            TableSource::from_table(RawTable::new(
                name,
                headers.into_iter().map(String::from).collect(),
                rows.into_iter()
                    .map(|r| r.into_iter().map(String::from).collect())
                    .collect(),
            ))
        };
        Migrator::new().convert(vec![
            source(
                "Authors",
                vec!["Id", "Name"],
                vec![vec![TOLKIEN, "J.R.R. Tolkien"], vec![LEWIS, "C.S. Lewis"]],
            ),
            source(
                "Books",
                vec!["Id", "Name", "Authors", "Rating"],
                vec![vec![HOBBIT, "The Hobbit", "J.R.R. Tolkien,C.S. Lewis", "9"]],
            ),
        ])
    }

    #[test]
    fn test_escape_text_doubles_quotes() {
        assert_eq!(escape_text("it's"), "'it''s'");
        assert_eq!(escape_text("a''b"), "'a''''b'");
        assert_eq!(escape_text("line1\nline2"), "'line1\nline2'");
        assert_eq!(escape_text(""), "''");
    }

    #[test]
    fn test_escape_value_variants() {
        assert_eq!(escape_value(None), "NULL");
        assert_eq!(escape_value(Some(&Value::Boolean(true))), "TRUE");
        assert_eq!(escape_value(Some(&Value::Integer(-3))), "-3");
        assert_eq!(
            escape_value(Some(&Value::Uuid(TOLKIEN.into()))),
            format!("'{TOLKIEN}'")
        );
        assert_eq!(
            escape_value(Some(&Value::Text("O'Brien".into()))),
            "'O''Brien'"
        );
    }

    #[test]
    fn test_write_tables_contains_ddl_and_inserts() {
        let sql = SqlWriter::new().write_tables(&migration());

        assert!(sql.contains("CREATE SCHEMA IF NOT EXISTS export;"));
        assert!(sql.contains("CREATE TABLE export.authors ("));
        assert!(sql.contains("  id UUID PRIMARY KEY"));
        assert!(sql.contains("  rating INTEGER"));
        assert!(sql.contains("INSERT INTO export.books (id, name, authors, rating) VALUES"));
        assert!(sql.contains("'The Hobbit'"));
    }

    #[test]
    fn test_synthetic_columns_get_defaults() {
        let source = TableSource::from_table(RawTable::new(
            "Notes",
            vec!["Name".into()],
            vec![vec!["note one".into()]],
        ));
        let migration = Migrator::new().convert(vec![source]);
        let sql = SqlWriter::new().write_tables(&migration);

        assert!(sql.contains("id UUID DEFAULT gen_random_uuid() PRIMARY KEY"));
        assert!(sql.contains("created_at TIMESTAMPTZ DEFAULT NOW()"));
    }

    #[test]
    fn test_write_relations_junction() {
        let sql = SqlWriter::new().write_relations(&migration());

        assert!(sql.contains("CREATE TABLE export.authors_books ("));
        assert!(sql.contains("PRIMARY KEY (authors_id, books_id)"));
        assert!(sql.contains("ON CONFLICT (authors_id, books_id) DO NOTHING;"));
        // Two links from the single Books row.
        assert_eq!(sql.matches("::UUID)").count(), 2);
    }

    #[test]
    fn test_batching_splits_inserts() {
        let rows: Vec<Vec<String>> = (0..5)
            .map(|i| {
                vec![
                    format!("00000000-0000-4000-8000-00000000000{i}"),
                    format!("row {i}"),
                ]
            })
            .collect();
        let source = TableSource::from_table(RawTable::new(
            "Authors",
            vec!["Id".into(), "Name".into()],
            rows,
        ));
        let migration = Migrator::new().convert(vec![source]);

        let writer = SqlWriter::with_options(SqlOptions {
            batch_size: 2,
            ..SqlOptions::default()
        });
        let sql = writer.write_tables(&migration);

        assert_eq!(sql.matches("INSERT INTO export.authors").count(), 3);
    }
}
