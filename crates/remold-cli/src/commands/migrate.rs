//! Migrate command - emit table DDL and inserts.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;
use remold::{SqlOptions, SqlWriter};

pub fn run(
    export_dir: PathBuf,
    output: Option<PathBuf>,
    schema: String,
    batch_size: usize,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let migration = super::convert_export(&export_dir, verbose)?;
    super::print_summary(&migration);

    let writer = SqlWriter::with_options(SqlOptions {
        schema,
        batch_size,
        ..SqlOptions::default()
    });
    let sql = writer.write_tables(&migration);

    let output_path = output.unwrap_or_else(|| PathBuf::from("migration-complete.sql"));
    fs::write(&output_path, sql)?;

    println!(
        "{} {}",
        "Wrote".green().bold(),
        output_path.display().to_string().white()
    );
    Ok(())
}
