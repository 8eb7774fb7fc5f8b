use concilia_core::brl::{parse_brl_decimal, parse_date_br};
use concilia_core::{CellValue, Table};

use crate::decode::decode_bytes;
use crate::detect::FileKind;
use crate::stats::ParseStats;
use crate::util::{read_records, table_from_records};

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];
const SNIFF_LINES: usize = 10;

/// Picks the delimiter whose field counts stay consistent across the first
/// lines, with higher field counts breaking ties.
pub fn sniff_delimiter(text: &str) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best = b',';
    let mut best_score = 0u64;
    for delim in CANDIDATE_DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|l| l.as_bytes().iter().filter(|&&b| b == delim).count() + 1)
            .collect();
        let Some(&target) = counts.first() else {
            continue;
        };
        if target < 2 {
            continue;
        }
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }
    best
}

/// Decides a column type from its non-null text cells: all dates → Date,
/// all Brazilian decimals → Number, anything else stays text. This is the
/// static-schema replacement for dynamic dataframe typing.
fn infer_column_types(table: &mut Table) -> (Vec<String>, bool) {
    let names: Vec<String> = table.columns().to_vec();
    let mut date_columns = Vec::new();
    let mut valor_numeric = false;
    for (idx, name) in names.iter().enumerate() {
        let mut saw_value = false;
        let mut all_dates = true;
        let mut all_numbers = true;
        for row in table.rows() {
            if let CellValue::Text(s) = &row[idx] {
                saw_value = true;
                if parse_date_br(s).is_none() {
                    all_dates = false;
                }
                if parse_brl_decimal(s).is_none() {
                    all_numbers = false;
                }
            }
        }
        if !saw_value {
            continue;
        }
        if all_dates {
            table.normalize_dates(&[name.as_str()]);
            date_columns.push(name.clone());
        } else if all_numbers {
            table.normalize_money(&[name.as_str()]);
            if name == "Valor" || name == "Valor (R$)" {
                valor_numeric = true;
            }
        }
    }
    (date_columns, valor_numeric)
}

/// Fallback parser for a plain delimited file: no preamble stripping, the
/// first row is the header.
pub fn parse(data: &[u8]) -> (Table, ParseStats) {
    let decoded = decode_bytes(data);
    let mut stats = ParseStats::new(FileKind::Csv);
    stats.encoding = decoded.encoding.to_string();

    let delimiter = sniff_delimiter(&decoded.text);
    let records = read_records(&decoded.text, delimiter);
    let Some((header, rows)) = records.split_first() else {
        return (Table::empty(), stats);
    };
    stats.initial_rows = rows.len();

    let mut table = table_from_records(header, rows);
    table.drop_empty_rows();
    table.drop_empty_columns();
    let (date_columns, valor_numeric) = infer_column_types(&mut table);
    stats.parsed_date_columns = date_columns;
    stats.parsed_value_column = valor_numeric;
    stats.final_rows = table.n_rows();
    (table, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    // ── sniff_delimiter ───────────────────────────────────────────────────────

    #[test]
    fn sniffs_semicolon() {
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3\n"), b';');
    }

    #[test]
    fn sniffs_comma() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3\n"), b',');
    }

    #[test]
    fn sniffs_tab_and_pipe() {
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n"), b'\t');
        assert_eq!(sniff_delimiter("a|b|c\n1|2|3\n"), b'|');
    }

    #[test]
    fn consistency_beats_raw_count() {
        // commas appear inside one field, but semicolons are consistent
        let text = "a;b\n\"x,y,z,w\";2\n1;2\n";
        assert_eq!(sniff_delimiter(text), b';');
    }

    // ── parse ─────────────────────────────────────────────────────────────────

    #[test]
    fn parses_with_inferred_types() {
        let text = "Data,Descricao,Valor\n15/01/2024,ALUGUEL,\"1.250,00\"\n16/01/2024,LUZ,\"89,90\"\n";
        let (t, stats) = parse(text.as_bytes());
        assert_eq!(t.n_rows(), 2);
        assert_eq!(
            t.cell(0, "Data").unwrap().as_date(),
            Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
        assert_eq!(
            t.cell(0, "Valor").unwrap().as_number(),
            Some(Decimal::from_str("1250.00").unwrap())
        );
        assert_eq!(t.cell(0, "Descricao").unwrap().as_text(), Some("ALUGUEL"));
        assert!(stats.parsed_value_column);
        assert_eq!(stats.parsed_date_columns, vec!["Data".to_string()]);
    }

    #[test]
    fn mixed_column_stays_text() {
        let text = "A,B\n15/01/2024,x\nnão-data,y\n";
        let (t, stats) = parse(text.as_bytes());
        assert_eq!(t.cell(0, "A").unwrap().as_text(), Some("15/01/2024"));
        assert!(stats.parsed_date_columns.is_empty());
    }

    #[test]
    fn empty_input_yields_empty_table() {
        let (t, stats) = parse(b"");
        assert!(t.is_empty());
        assert_eq!(stats.final_rows, 0);
    }

    #[test]
    fn blank_rows_and_columns_are_dropped() {
        let text = "A,B,C\n1,,\n2,,\n";
        let (t, _) = parse(text.as_bytes());
        assert_eq!(t.columns(), &["A".to_string()]);
        assert_eq!(t.n_rows(), 2);
    }
}
