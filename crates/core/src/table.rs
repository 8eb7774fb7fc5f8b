use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::brl::{parse_brl_decimal, parse_date_br};
use crate::value::CellValue;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

/// The canonical record table all parsers converge to: an ordered list of
/// uniquely named columns over rows of typed cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Table {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn empty() -> Table {
        Table::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Appends a row, padding with nulls or truncating to the column count.
    /// Length mismatches are a reconciliation policy here, not an error.
    pub fn push_row(&mut self, mut cells: Vec<CellValue>) {
        cells.resize(self.columns.len(), CellValue::Null);
        self.rows.push(cells);
    }

    /// Trims text cells; text that trims to nothing becomes null.
    pub fn trim_text(&mut self) {
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                if let CellValue::Text(s) = cell {
                    let trimmed = s.trim();
                    *cell = if trimmed.is_empty() {
                        CellValue::Null
                    } else {
                        CellValue::Text(trimmed.to_string())
                    };
                }
            }
        }
    }

    /// Converts the named columns to numbers via the Brazilian decimal
    /// parser. Cells that fail to parse become null; cells that are already
    /// numeric pass through. Returns the columns that were present.
    pub fn normalize_money(&mut self, names: &[&str]) -> Vec<String> {
        let mut converted = Vec::new();
        for name in names {
            let Some(idx) = self.column_index(name) else {
                continue;
            };
            for row in &mut self.rows {
                row[idx] = match &row[idx] {
                    CellValue::Number(n) => CellValue::Number(*n),
                    CellValue::Text(s) => match parse_brl_decimal(s) {
                        Some(n) => CellValue::Number(n),
                        None => CellValue::Null,
                    },
                    _ => CellValue::Null,
                };
            }
            converted.push((*name).to_string());
        }
        converted
    }

    /// Converts the named columns to day-first dates. Unparsable cells
    /// become null. Returns the columns that were present.
    pub fn normalize_dates(&mut self, names: &[&str]) -> Vec<String> {
        let mut converted = Vec::new();
        for name in names {
            let Some(idx) = self.column_index(name) else {
                continue;
            };
            for row in &mut self.rows {
                row[idx] = match &row[idx] {
                    CellValue::Date(d) => CellValue::Date(*d),
                    CellValue::DateTime(dt) => CellValue::DateTime(*dt),
                    CellValue::Text(s) => match parse_date_br(s) {
                        Some(d) => CellValue::Date(d),
                        None => CellValue::Null,
                    },
                    _ => CellValue::Null,
                };
            }
            converted.push((*name).to_string());
        }
        converted
    }

    /// Applies a transform to every cell of the named column. A missing
    /// column is a no-op; returns whether the column existed.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> bool
    where
        F: FnMut(&CellValue) -> CellValue,
    {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
        true
    }

    pub fn drop_empty_rows(&mut self) {
        self.rows.retain(|row| row.iter().any(|c| !c.is_null()));
    }

    pub fn drop_empty_columns(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| self.rows.iter().any(|row| !row[i].is_null()))
            .collect();
        if keep.len() == self.columns.len() {
            return;
        }
        self.columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        for row in &mut self.rows {
            *row = keep.iter().map(|&i| row[i].clone()).collect();
        }
    }

    /// Stable ascending sort by the named columns, nulls last. Missing
    /// columns are ignored.
    pub fn sort_by(&mut self, names: &[&str]) {
        let indices: Vec<usize> = names
            .iter()
            .filter_map(|n| self.column_index(n))
            .collect();
        if indices.is_empty() {
            return;
        }
        self.rows.sort_by(|a, b| {
            indices
                .iter()
                .map(|&i| a[i].cmp_nulls_last(&b[i]))
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// Sum of the numeric cells in a column; nulls and non-numbers are
    /// skipped, a missing column sums to zero.
    pub fn sum_column(&self, name: &str) -> Decimal {
        let Some(idx) = self.column_index(name) else {
            return Decimal::ZERO;
        };
        self.rows
            .iter()
            .filter_map(|row| row[idx].as_number())
            .sum()
    }

    /// Renders the table as delimited text. `with_bom` prepends the UTF-8
    /// byte-order mark the downstream spreadsheet tooling expects.
    pub fn to_csv(&self, delimiter: u8, with_bom: bool) -> Result<Vec<u8>, ExportError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|c| c.to_string()))?;
        }
        let body = writer
            .into_inner()
            .map_err(|e| ExportError::Buffer(e.to_string()))?;
        if with_bom {
            let mut out = Vec::with_capacity(body.len() + 3);
            out.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
            out.extend_from_slice(&body);
            Ok(out)
        } else {
            Ok(body)
        }
    }
}
