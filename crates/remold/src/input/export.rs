//! Export root discovery.
//!
//! The export format is one sub-directory per source table, each holding
//! a CSV file and optionally a `descriptions/` directory of Markdown
//! artifacts, one per entity.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use super::parser::Parser;
use super::source::{RawTable, SourceMetadata};
use crate::artifacts::Artifact;
use crate::error::{RemoldError, Result};

/// Name of the per-table artifact directory.
const DESCRIPTIONS_DIR: &str = "descriptions";

/// One table's worth of input: the parsed CSV plus its artifacts.
#[derive(Debug, Clone)]
pub struct TableSource {
    pub table: RawTable,
    pub artifacts: Vec<Artifact>,
    pub metadata: Option<SourceMetadata>,
}

impl TableSource {
    /// A source built directly from in-memory data (tests, embedding).
    pub fn from_table(table: RawTable) -> Self {
        Self {
            table,
            artifacts: Vec::new(),
            metadata: None,
        }
    }
}

/// Result of scanning an export root.
#[derive(Debug, Default)]
pub struct ExportScan {
    /// Tables found, in directory-name order.
    pub sources: Vec<TableSource>,
    /// Sub-directories without any CSV file, reported but not fatal.
    pub without_csv: Vec<String>,
}

/// Reads an export root directory into [`TableSource`] values.
pub struct ExportReader {
    parser: Parser,
}

impl ExportReader {
    pub fn new() -> Self {
        Self { parser: Parser::new() }
    }

    /// Scan the export root. A missing root is the one hard failure.
    pub fn read(&self, root: impl AsRef<Path>) -> Result<ExportScan> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(RemoldError::MissingRoot(root.to_path_buf()));
        }

        let mut dirs: Vec<_> = fs::read_dir(root)
            .map_err(|e| RemoldError::Io {
                path: root.to_path_buf(),
                source: e,
            })?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .map(|entry| entry.path())
            .collect();
        dirs.sort();

        let mut scan = ExportScan::default();
        for dir in dirs {
            let table_name = dir
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();

            let Some(csv_path) = find_csv(&dir)? else {
                scan.without_csv.push(table_name);
                continue;
            };

            // A headerless CSV still yields a source; the builder turns
            // the empty table into a recorded skip.
            let (table, metadata) = match self.parser.parse_file(&csv_path, &table_name) {
                Ok((table, metadata)) => (table, Some(metadata)),
                Err(RemoldError::EmptyTable(_)) => {
                    (RawTable::new(table_name.clone(), Vec::new(), Vec::new()), None)
                }
                Err(e) => return Err(e),
            };

            let artifacts = read_artifacts(&dir.join(DESCRIPTIONS_DIR))?;

            scan.sources.push(TableSource {
                table,
                artifacts,
                metadata,
            });
        }

        Ok(scan)
    }
}

impl Default for ExportReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the first CSV file (case-insensitive extension) in a directory.
fn find_csv(dir: &Path) -> Result<Option<std::path::PathBuf>> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .map_err(|e| RemoldError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    Ok(files.into_iter().next())
}

/// Collect `*.md` artifacts under a descriptions directory, recursively.
fn read_artifacts(dir: &Path) -> Result<Vec<Artifact>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut artifacts = Vec::new();
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file()
            || !path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
        {
            continue;
        }

        let content = fs::read_to_string(path).map_err(|e| RemoldError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        artifacts.push(Artifact {
            path: path.to_path_buf(),
            content,
        });
    }

    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_root_is_fatal() {
        let reader = ExportReader::new();
        let err = reader.read("/definitely/not/here").unwrap_err();
        assert!(matches!(err, RemoldError::MissingRoot(_)));
    }
}
