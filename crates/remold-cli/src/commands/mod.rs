//! Command implementations.

pub mod descriptions;
pub mod diagnose;
pub mod migrate;
pub mod relations;

use std::path::Path;

use colored::Colorize;
use remold::{Migration, Migrator};

/// Load the export root and run the full conversion.
pub fn convert_export(
    export_dir: &Path,
    verbose: bool,
) -> Result<Migration, Box<dyn std::error::Error>> {
    println!(
        "{} {}",
        "Reading".cyan().bold(),
        export_dir.display().to_string().white()
    );

    let scan = remold::ExportReader::new().read(export_dir)?;
    if verbose {
        for source in &scan.sources {
            println!(
                "  {:30} {} rows, {} artifacts",
                source.table.name,
                source.table.row_count(),
                source.artifacts.len()
            );
        }
    }
    for name in &scan.without_csv {
        println!("  {} {} (no CSV file)", "skipping".yellow(), name);
    }

    let migration = Migrator::new().convert(scan.sources);

    for skipped in &migration.skipped {
        println!(
            "  {} {} ({})",
            "skipping".yellow(),
            skipped.name,
            skipped.reason
        );
    }

    Ok(migration)
}

/// Print the shared one-line conversion summary.
pub fn print_summary(migration: &Migration) {
    let totals = &migration.report.totals;
    println!(
        "Converted {} tables, {} rows ({} invalid keys, {} coercion fallbacks)",
        totals.tables.to_string().white().bold(),
        totals.rows.to_string().white().bold(),
        totals.invalid_keys.to_string().yellow(),
        totals.coercion_fallbacks.to_string().yellow()
    );
}
