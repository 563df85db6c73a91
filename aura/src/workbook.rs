//! Excel export of spreadsheet rows.
//!
//! Rows become one worksheet named [`SHEET_NAME`]: a header row with the
//! union of all row keys in first-seen order, then one line per row.

use std::path::Path;

use rust_xlsxwriter::{ColNum, RowNum, Workbook};
use serde_json::Value;

use crate::analysis::SpreadsheetRow;
use crate::error::{Error, Result};

/// Name of the worksheet holding the rows.
pub const SHEET_NAME: &str = "Business Data";

/// File name used when the caller does not pick one.
pub const DEFAULT_FILE_NAME: &str = "business_analysis.xlsx";

/// A single worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing key or JSON `null`.
    Empty,
    /// Numeric value.
    Number(f64),
    /// Text; nested arrays and objects are written as JSON text.
    Text(String),
    /// Boolean value.
    Bool(bool),
}

impl From<&Value> for Cell {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n
                .as_f64()
                .map_or_else(|| Self::Text(n.to_string()), Self::Number),
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

/// Rows laid out as a grid under a header line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetData {
    /// Column names.
    pub headers: Vec<String>,
    /// One cell per header for every row.
    pub rows: Vec<Vec<Cell>>,
}

impl SheetData {
    /// Lays out `rows`; keys missing from a row leave an empty cell.
    #[must_use]
    pub fn from_rows(rows: &[SpreadsheetRow]) -> Self {
        let mut headers: Vec<String> = Vec::new();
        for key in rows.iter().flat_map(|row| row.keys()) {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }

        let rows = rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .map(|header| row.get(header).map_or(Cell::Empty, Cell::from))
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    /// Builds the workbook.
    ///
    /// # Errors
    ///
    /// [`Error::Workbook`] when the grid exceeds the worksheet limits.
    pub fn to_workbook(&self) -> Result<Workbook> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        for (col, header) in self.headers.iter().enumerate() {
            sheet.write_string(0, col_num(col)?, header.as_str())?;
        }

        for (idx, cells) in self.rows.iter().enumerate() {
            let row = row_num(idx + 1)?;
            for (col, cell) in cells.iter().enumerate() {
                let col = col_num(col)?;
                match cell {
                    Cell::Empty => {}
                    Cell::Number(n) => {
                        sheet.write_number(row, col, *n)?;
                    }
                    Cell::Text(s) => {
                        sheet.write_string(row, col, s.as_str())?;
                    }
                    Cell::Bool(b) => {
                        sheet.write_boolean(row, col, *b)?;
                    }
                }
            }
        }

        Ok(workbook)
    }

    /// Encodes the workbook as `.xlsx` bytes.
    ///
    /// # Errors
    ///
    /// See [`SheetData::to_workbook`].
    pub fn to_xlsx(&self) -> Result<Vec<u8>> {
        Ok(self.to_workbook()?.save_to_buffer()?)
    }

    /// Writes the workbook to `path`.
    ///
    /// # Errors
    ///
    /// [`Error::Workbook`] when the workbook cannot be built or written.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.to_workbook()?.save(path)?;
        tracing::debug!(path = %path.display(), rows = self.rows.len(), "saved workbook");
        Ok(())
    }
}

fn row_num(idx: usize) -> Result<RowNum> {
    RowNum::try_from(idx).map_err(|_| Error::workbook(format!("too many rows: {idx}")))
}

fn col_num(idx: usize) -> Result<ColNum> {
    ColNum::try_from(idx).map_err(|_| Error::workbook(format!("too many columns: {idx}")))
}
