//! Header-addressed string tables

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use calamine::Reader;

use crate::error::{DevmatchError, Result};

/// Extensions read as spreadsheets rather than CSV
const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

/// A CSV file held as strings, with its header row
///
/// Columns the pipeline does not understand are carried through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Open a CSV file with a header row
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Open a CSV file, or the first worksheet of a workbook, by extension
    pub fn read_any(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let is_workbook = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| WORKBOOK_EXTENSIONS.iter().any(|w| ext.eq_ignore_ascii_case(w)));
        if is_workbook {
            Self::read_workbook(path)
        } else {
            Self::read(path)
        }
    }

    /// First worksheet of a workbook, its first row taken as the header
    ///
    /// A workbook without worksheets reads as an empty table.
    pub fn read_workbook(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut workbook = calamine::open_workbook_auto(path)?;
        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range?,
            None => return Ok(Self::default()),
        };

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<String>>());
        let headers = rows.next().unwrap_or_default();
        let width = headers.len();
        let rows: Vec<Vec<String>> = rows
            .map(|mut row| {
                row.resize(width.max(row.len()), String::new());
                row
            })
            .collect();

        tracing::debug!("Read {} rows from the first worksheet of {:?}", rows.len(), path);
        Ok(Self { headers, rows })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        let width = headers.len();
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
            row.resize(width.max(row.len()), String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.to_writer(File::create(path)?)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of a column that must be present
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| DevmatchError::MissingColumn(name.to_string()))
    }

    /// Cell value, empty when the row is short
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.headers.push(name.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
