//! Tabular input rows and CSV reading.
//!
//! Sentinel "no value" cells (`NaN`, `None`, blanks, ...) are turned into
//! absent cells here, before any reconciliation logic sees them.

use crate::config::{ImportConfig, InventoryConfig};
use crate::error::Result;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Why a single row could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("Could not read row: {0}")]
    Unreadable(String),

    #[error("Row has {found} fields but the header has {expected}")]
    TooManyFields { expected: usize, found: usize },
}

/// One data row keyed by column name. Only present values are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRow {
    cells: BTreeMap<String, String>,
}

impl ImportRow {
    /// Build a row from raw `(column, value)` pairs.
    ///
    /// Values are trimmed and sentinel values dropped. When a column name
    /// repeats, the first occurrence wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut cells = BTreeMap::new();
        for (column, value) in pairs {
            let column = column.as_ref().trim();
            if column.is_empty() || cells.contains_key(column) {
                continue;
            }
            if let Some(value) = normalize_cell(value.as_ref()) {
                cells.insert(column.to_string(), value);
            }
        }
        Self { cells }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    /// True if every cell was absent.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A data row as read from the file, or the reason it could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    /// 0-based index among data rows.
    pub index: usize,
    pub cells: std::result::Result<ImportRow, RowError>,
}

impl SourceRow {
    pub fn ok(index: usize, row: ImportRow) -> Self {
        Self {
            index,
            cells: Ok(row),
        }
    }

    /// Row number as shown in a spreadsheet.
    pub fn row_number(&self) -> usize {
        self.index + ImportConfig::HEADER_ROW_OFFSET
    }
}

/// Normalize a raw cell: trimmed, or `None` for blanks and sentinels.
pub fn normalize_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || ImportConfig::ABSENT_SENTINELS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Read a CSV with a header row.
///
/// Only an unreadable header or an I/O failure is fatal. Rows that fail
/// to decode come back as `Err` entries so the batch can continue.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<SourceRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect();
    debug!("CSV columns: {}", headers.join(", "));

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let cells = match record {
            Ok(record) => {
                let extra = record
                    .iter()
                    .skip(headers.len())
                    .filter(|v| !v.trim().is_empty())
                    .count();
                if extra > 0 {
                    Err(RowError::TooManyFields {
                        expected: headers.len(),
                        found: record.len(),
                    })
                } else {
                    Ok(ImportRow::from_pairs(headers.iter().zip(record.iter())))
                }
            }
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => Err(RowError::Unreadable(e.to_string())),
        };
        rows.push(SourceRow { index, cells });
    }

    Ok(rows)
}

/// Read a CSV file from disk.
pub fn read_csv_file(path: &Path) -> Result<Vec<SourceRow>> {
    let file = File::open(path).map_err(|e| crate::InventoryError::io_with_path(e, path))?;
    read_csv(file)
}

/// Normalize a user-entered date to `YYYY-MM-DD`, or `None` if it is in
/// none of the accepted formats.
///
/// A trailing time part (`2024-01-05 00:00:00`) is ignored.
pub(crate) fn parse_date(value: &str) -> Option<String> {
    let date_part = value.split_whitespace().next().unwrap_or(value);
    ImportConfig::DATE_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .map(|d| d.format(InventoryConfig::DATE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_become_absent() {
        let row = ImportRow::from_pairs([
            ("Name", " SW1 "),
            ("Asset ID", "NaN"),
            ("Owner", "None"),
            ("Notes", "   "),
            ("Team", "nan"),
        ]);
        assert_eq!(row.get("Name"), Some("SW1"));
        assert_eq!(row.get("Asset ID"), None);
        assert_eq!(row.get("Owner"), None);
        assert_eq!(row.get("Notes"), None);
        assert_eq!(row.get("Team"), None);
        assert!(!row.is_empty());
    }

    #[test]
    fn test_all_sentinel_row_is_empty() {
        let row = ImportRow::from_pairs([("Name", ""), ("Location", "NaN")]);
        assert!(row.is_empty());
    }

    #[test]
    fn test_read_csv_rows() {
        let data = "Name,Location,Serial Number\nSW1,sf,ABC123\n,,\nSW2,SJ\n";
        let rows = read_csv(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);

        let first = rows[0].cells.as_ref().unwrap();
        assert_eq!(first.get("Name"), Some("SW1"));
        assert_eq!(first.get("Location"), Some("sf"));
        assert_eq!(rows[0].row_number(), 2);

        assert!(rows[1].cells.as_ref().unwrap().is_empty());

        let third = rows[2].cells.as_ref().unwrap();
        assert_eq!(third.get("Serial Number"), None);
        assert_eq!(rows[2].row_number(), 4);
    }

    #[test]
    fn test_extra_fields_fail_only_that_row() {
        let data = "Name,Category\nSW1,SFP,surprise\nSW2,SFP,\n";
        let rows = read_csv(data.as_bytes()).unwrap();
        assert_eq!(
            rows[0].cells,
            Err(RowError::TooManyFields {
                expected: 2,
                found: 3
            })
        );
        assert!(rows[1].cells.is_ok());
    }

    #[test]
    fn test_invalid_utf8_fails_only_that_row() {
        let mut data = b"Name,Category\n".to_vec();
        data.extend_from_slice(b"SW\xff1,SFP\n");
        data.extend_from_slice(b"SW2,SFP\n");
        let rows = read_csv(data.as_slice()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(matches!(rows[0].cells, Err(RowError::Unreadable(_))));
        assert_eq!(rows[1].cells.as_ref().unwrap().get("Name"), Some("SW2"));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-03-01").as_deref(), Some("2024-03-01"));
        assert_eq!(parse_date("2024/03/01").as_deref(), Some("2024-03-01"));
        assert_eq!(parse_date("3/1/2024").as_deref(), Some("2024-03-01"));
        assert_eq!(parse_date("2024-03-01 00:00:00").as_deref(), Some("2024-03-01"));
        assert_eq!(parse_date("next week"), None);
        assert_eq!(parse_date("2024-03-01T10:00"), None);
    }
}
