//! CSV parser for export tables.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use super::source::{RawTable, SourceMetadata};
use crate::error::{RemoldError, Result};

/// Parses the comma-separated, double-quoted CSV files the export format
/// produces.
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a file and return the raw table plus source metadata.
    pub fn parse_file(
        &self,
        path: impl AsRef<Path>,
        table_name: &str,
    ) -> Result<(RawTable, SourceMetadata)> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| RemoldError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(|e| RemoldError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let table = self.parse_bytes(table_name, &contents)?;

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            contents.len() as u64,
            table.row_count(),
            table.column_count(),
        );

        Ok((table, metadata))
    }

    /// Parse CSV bytes directly.
    pub fn parse_bytes(&self, table_name: &str, bytes: &[u8]) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .quote(b'"')
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Err(RemoldError::EmptyTable(table_name.to_string()));
        }

        let expected_cols = headers.len();
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();

            // Align short and long rows with the header.
            while row.len() < expected_cols {
                row.push(String::new());
            }
            row.truncate(expected_cols);

            // The flexible reader yields a record for blank lines too.
            if row.iter().all(|v| v.trim().is_empty()) {
                continue;
            }

            rows.push(row);
        }

        Ok(RawTable::new(table_name, headers, rows))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_csv() {
        let parser = Parser::new();
        let data = b"Id,Name,Rating\nr1,The Hobbit,9\nr2,Dune,8\n";
        let table = parser.parse_bytes("Books", data).unwrap();

        assert_eq!(table.headers, vec!["Id", "Name", "Rating"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, 1), "The Hobbit");
    }

    #[test]
    fn test_quoted_commas_and_escaped_quotes() {
        let parser = Parser::new();
        let data = b"Name,Tags\n\"Tolkien, J.R.R.\",\"fantasy,classic\"\n\"He said \"\"hi\"\"\",x\n";
        let table = parser.parse_bytes("Authors", data).unwrap();

        assert_eq!(table.cell(0, 0), "Tolkien, J.R.R.");
        assert_eq!(table.cell(0, 1), "fantasy,classic");
        assert_eq!(table.cell(1, 0), "He said \"hi\"");
    }

    #[test]
    fn test_short_rows_padded() {
        let parser = Parser::new();
        let data = b"a,b,c\n1,2\n";
        let table = parser.parse_bytes("t", data).unwrap();

        assert_eq!(table.rows[0], vec!["1", "2", ""]);
    }

    #[test]
    fn test_headerless_file_is_empty_table() {
        let parser = Parser::new();
        let err = parser.parse_bytes("t", b"").unwrap_err();
        assert!(matches!(err, RemoldError::EmptyTable(_)));
    }
}
