//! CSV tables as ordered JSON records.
//!
//! Cell types are inferred per column: a column is integer when every
//! non-empty cell parses as one, float when every non-empty cell parses as a
//! number, and text otherwise. Empty cells become `null`.

use serde_json::{Number, Value};
use std::path::Path;

use crate::error::ServiceError;
use crate::types::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Text,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Table {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a CSV document with a header row.
    ///
    /// # Errors
    /// Returns `ServiceError::MalformedCsv` for unreadable CSV, ragged rows,
    /// a missing header, duplicate column names or non UTF-8 content.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, ServiceError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let columns: Vec<String> = reader
            .headers()
            .map_err(malformed)?
            .iter()
            .map(str::to_string)
            .collect();
        if columns.is_empty() || columns.iter().all(String::is_empty) {
            return Err(ServiceError::MalformedCsv("no columns to parse".to_string()));
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(ServiceError::MalformedCsv(format!(
                    "duplicate column '{column}'"
                )));
            }
        }

        let mut cells: Vec<Vec<String>> = Vec::new();
        for row in reader.records() {
            let row = row.map_err(malformed)?;
            cells.push(row.iter().map(str::to_string).collect());
        }

        let kinds: Vec<ColumnKind> = (0..columns.len())
            .map(|i| infer_kind(cells.iter().map(|row| row[i].as_str())))
            .collect();

        let records = cells
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .zip(&kinds)
                    .zip(row)
                    .map(|((column, kind), cell)| (column.clone(), convert(&cell, *kind)))
                    .collect()
            })
            .collect();

        Ok(Self { columns, records })
    }

    /// Read a CSV file from disk.
    ///
    /// # Errors
    /// Returns the I/O error when the file cannot be read, or the parse error.
    pub fn from_csv_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::from_csv_bytes(&bytes)?)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn malformed(err: csv::Error) -> ServiceError {
    ServiceError::MalformedCsv(err.to_string())
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind = ColumnKind::Integer;
    for cell in cells.filter(|c| !c.is_empty()) {
        if kind == ColumnKind::Integer && cell.parse::<i64>().is_err() {
            kind = ColumnKind::Float;
        }
        if kind == ColumnKind::Float && !cell.parse::<f64>().is_ok_and(f64::is_finite) {
            return ColumnKind::Text;
        }
    }
    kind
}

fn convert(cell: &str, kind: ColumnKind) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    match kind {
        ColumnKind::Integer => cell.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
        ColumnKind::Float => cell
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ColumnKind::Text => Value::String(cell.to_string()),
    }
}
