//! Relations command - emit junction tables and link inserts.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;
use remold::{SqlOptions, SqlWriter};

pub fn run(
    export_dir: PathBuf,
    output: Option<PathBuf>,
    schema: String,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let migration = super::convert_export(&export_dir, verbose)?;

    let totals = &migration.report.totals;
    println!(
        "Detected {} relations, resolved {} links ({} unresolved references)",
        totals.relations.to_string().white().bold(),
        totals.links.to_string().white().bold(),
        totals.unresolved_references.total().to_string().yellow()
    );
    if verbose {
        for resolved in &migration.relations {
            let target = resolved
                .relation
                .target_table
                .as_deref()
                .unwrap_or("<unknown, kept as text>");
            println!(
                "  {}.{} -> {} ({} links)",
                resolved.relation.source_table,
                resolved.relation.source_column,
                target,
                resolved.links.len()
            );
        }
    }

    let writer = SqlWriter::with_options(SqlOptions {
        schema,
        ..SqlOptions::default()
    });
    let sql = writer.write_relations(&migration);

    let output_path = output.unwrap_or_else(|| PathBuf::from("relations-complete.sql"));
    fs::write(&output_path, sql)?;

    println!(
        "{} {}",
        "Wrote".green().bold(),
        output_path.display().to_string().white()
    );
    Ok(())
}
