//! Input handling: CSV parsing and export-root discovery.

mod export;
mod parser;
mod source;

pub use export::{ExportReader, ExportScan, TableSource};
pub use parser::Parser;
pub use source::{RawTable, SourceMetadata};
