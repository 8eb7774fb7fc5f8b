use concilia_core::columns::canonicalize;
use concilia_core::{CellValue, Table};

/// Splits a single line with the csv parser so quoted fields survive.
pub(crate) fn parse_line(line: &str, delimiter: u8) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    match reader.records().next() {
        Some(Ok(record)) => record.iter().map(|f| f.to_string()).collect(),
        _ => Vec::new(),
    }
}

/// Reads a whole cleaned text as delimited records; rows the csv parser
/// chokes on are skipped, never fatal.
pub(crate) fn read_records(text: &str, delimiter: u8) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    reader
        .records()
        .filter_map(|r| r.ok())
        .map(|record| record.iter().map(|f| f.to_string()).collect())
        .collect()
}

/// Builds a table from a raw header row and data rows: empty-named source
/// columns are dropped, the rest are canonicalized, and every row is
/// padded or truncated to the header width.
pub(crate) fn table_from_records(header: &[String], rows: &[Vec<String>]) -> Table {
    let keep: Vec<usize> = header
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.trim().is_empty())
        .map(|(i, _)| i)
        .collect();
    let names: Vec<String> = keep.iter().map(|&i| header[i].trim().to_string()).collect();
    let mut table = Table::new(canonicalize(&names));
    for row in rows {
        let cells: Vec<CellValue> = keep
            .iter()
            .map(|&i| CellValue::from_field(row.get(i).map(String::as_str).unwrap_or("")))
            .collect();
        table.push_row(cells);
    }
    table
}
