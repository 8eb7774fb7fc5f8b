use concilia_core::{CellValue, Table};
use rust_decimal::Decimal;

use crate::decode::decode_bytes;
use crate::detect::FileKind;
use crate::generic::sniff_delimiter;
use crate::stats::ParseStats;
use crate::util::{read_records, table_from_records};

/// The Odontotech export opens with a three-line report banner before the
/// real header row.
const PREAMBLE_LINES: usize = 3;

const DATE_COLUMNS: [&str; 3] = ["Emissão", "Vencto", "Pagto"];

/// Parses the dental-clinic billing CSV: skips the report preamble, drops
/// rows whose first cell starts with `*` (voided entries), canonicalizes
/// the headers and types dates and the Valor column. Missing Valor cells
/// become 0.00, unlike every other format, because the downstream grouping
/// treats voids as zero-value payments.
pub fn parse(data: &[u8]) -> (Table, ParseStats) {
    let decoded = decode_bytes(data);
    let mut stats = ParseStats::new(FileKind::Odontotech);
    stats.encoding = decoded.encoding.to_string();

    let body = decoded
        .text
        .lines()
        .skip(PREAMBLE_LINES)
        .collect::<Vec<_>>()
        .join("\n");
    if body.trim().is_empty() {
        return (Table::empty(), stats);
    }

    let delimiter = sniff_delimiter(&body);
    let records = read_records(&body, delimiter);
    let Some((header, rows)) = records.split_first() else {
        return (Table::empty(), stats);
    };

    let mut table = table_from_records(header, rows);
    table.drop_empty_rows();
    table.drop_empty_columns();
    stats.initial_rows = table.n_rows();

    stats.dropped_star_rows = drop_star_rows(&mut table);
    table.trim_text();
    stats.parsed_date_columns = table.normalize_dates(&DATE_COLUMNS);
    if !table.normalize_money(&["Valor"]).is_empty() {
        fill_null_valor_with_zero(&mut table);
        stats.parsed_value_column = true;
    }
    stats.final_rows = table.n_rows();
    (table, stats)
}

/// Removes rows whose first column starts with `*`, returning how many.
fn drop_star_rows(table: &mut Table) -> usize {
    if table.n_cols() == 0 {
        return 0;
    }
    let keep: Vec<Vec<CellValue>> = table
        .rows()
        .iter()
        .filter(|row| {
            !matches!(&row[0], CellValue::Text(s) if s.trim_start().starts_with('*'))
        })
        .cloned()
        .collect();
    let dropped = table.n_rows() - keep.len();
    if dropped > 0 {
        let mut out = Table::new(table.columns().to_vec());
        for row in keep {
            out.push_row(row);
        }
        *table = out;
    }
    dropped
}

fn fill_null_valor_with_zero(table: &mut Table) {
    table.map_column("Valor", |cell| {
        if cell.is_null() {
            CellValue::Number(Decimal::ZERO)
        } else {
            cell.clone()
        }
    });
}
