//! Diagnose command - dry run producing only the diagnostic report.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;

pub fn run(
    export_dir: PathBuf,
    output: Option<PathBuf>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let migration = super::convert_export(&export_dir, verbose)?;
    let report = &migration.report;
    let totals = &report.totals;

    println!();
    println!(
        "Tables: {} converted, {} skipped | Rows: {}",
        totals.tables.to_string().white().bold(),
        totals.skipped_tables.to_string().yellow(),
        totals.rows.to_string().white().bold()
    );
    println!(
        "Issues: {} invalid keys, {} coercion fallbacks, {} special characters, {} missing labels",
        totals.invalid_keys.to_string().yellow(),
        totals.coercion_fallbacks.to_string().yellow(),
        totals.special_characters.to_string().blue(),
        totals.missing_labels.to_string().blue()
    );
    println!(
        "Relations: {} detected ({} without target), {} links, {} unresolved references",
        totals.relations.to_string().white().bold(),
        totals.unresolved_targets.to_string().yellow(),
        totals.links.to_string().white().bold(),
        totals.unresolved_references.total().to_string().yellow()
    );
    println!(
        "Artifacts: {} found, {} orphans, {} rows without artifact",
        totals.artifacts.to_string().white().bold(),
        totals.orphan_artifacts.to_string().yellow(),
        totals.rows_without_artifact.to_string().blue()
    );

    if verbose {
        for table in &report.tables {
            println!(
                "  {:30} {:>6} rows  {:>3} invalid keys  {:>3} orphans",
                table.original_name, table.rows, table.invalid_keys, table.orphan_artifacts
            );
        }
    }

    if report.has_problems() {
        println!("{}", "Problems detected; review the report.".yellow().bold());
    } else {
        println!("{}", "No critical problems detected.".green().bold());
    }

    let output_path = output.unwrap_or_else(|| PathBuf::from("diagnostic-report.json"));
    fs::write(&output_path, serde_json::to_string_pretty(report)?)?;

    println!(
        "{} {}",
        "Wrote".green().bold(),
        output_path.display().to_string().white()
    );
    Ok(())
}
