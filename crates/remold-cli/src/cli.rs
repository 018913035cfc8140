//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Remold: convert flat-file exports into a relational schema
#[derive(Parser)]
#[command(name = "remold")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate table DDL and inserts from an export root
    Migrate {
        /// Path to the export root (one sub-directory per table)
        #[arg(value_name = "EXPORT_DIR")]
        export_dir: PathBuf,

        /// Output path for the SQL script (default: migration-complete.sql)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target schema name
        #[arg(long, default_value = "export")]
        schema: String,

        /// Rows per INSERT statement
        #[arg(long, default_value = "100")]
        batch_size: usize,
    },

    /// Generate junction tables and links for detected relations
    Relations {
        /// Path to the export root
        #[arg(value_name = "EXPORT_DIR")]
        export_dir: PathBuf,

        /// Output path for the SQL script (default: relations-complete.sql)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target schema name
        #[arg(long, default_value = "export")]
        schema: String,
    },

    /// Generate updates attaching Markdown descriptions to rows
    Descriptions {
        /// Path to the export root
        #[arg(value_name = "EXPORT_DIR")]
        export_dir: PathBuf,

        /// Output path for the SQL script (default: descriptions-migration.sql)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target schema name
        #[arg(long, default_value = "export")]
        schema: String,
    },

    /// Dry run: analyze the export and write a diagnostic report
    Diagnose {
        /// Path to the export root
        #[arg(value_name = "EXPORT_DIR")]
        export_dir: PathBuf,

        /// Output path for the JSON report (default: diagnostic-report.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
