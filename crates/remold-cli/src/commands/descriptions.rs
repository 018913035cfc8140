//! Descriptions command - attach Markdown artifacts to rows.

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
        "Artifacts: {} found, {} matched, {} orphans",
        totals.artifacts.to_string().white().bold(),
        (totals.artifacts - totals.orphan_artifacts)
            .to_string()
            .green(),
        totals.orphan_artifacts.to_string().yellow()
    );

    let writer = SqlWriter::with_options(SqlOptions {
        schema,
        ..SqlOptions::default()
    });
    let sql = writer.write_descriptions(&migration);

    let output_path = output.unwrap_or_else(|| PathBuf::from("descriptions-migration.sql"));
    fs::write(&output_path, sql)?;

    println!(
        "{} {}",
        "Wrote".green().bold(),
        output_path.display().to_string().white()
    );
    Ok(())
}
