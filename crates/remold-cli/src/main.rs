//! Remold CLI - flat-file export to relational schema.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Migrate {
            export_dir,
            output,
            schema,
            batch_size,
        } => commands::migrate::run(export_dir, output, schema, batch_size, cli.verbose),

        Commands::Relations {
            export_dir,
            output,
            schema,
        } => commands::relations::run(export_dir, output, schema, cli.verbose),

        Commands::Descriptions {
            export_dir,
            output,
            schema,
        } => commands::descriptions::run(export_dir, output, schema, cli.verbose),

        Commands::Diagnose { export_dir, output } => {
            commands::diagnose::run(export_dir, output, cli.verbose)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
