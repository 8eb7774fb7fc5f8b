use regex::Regex;
use std::sync::OnceLock;

use concilia_core::Table;

use crate::decode::decode_bytes;
use crate::detect::FileKind;
use crate::stats::ParseStats;
use crate::util::{read_records, table_from_records};

const HEADER_SIGNATURE: &str = "Codigo Interno;";

const MONEY_COLUMNS: [&str; 8] = [
    "Valor",
    "Valor PPCNG",
    "Valor PIS",
    "Valor COFINS",
    "Valor CSLL",
    "Valor IRRF",
    "Valor ISS",
    "Valor INSS",
];
const DATE_COLUMNS: [&str; 4] = ["Emissão", "Vencto", "Pagto", "Pagamento do Boleto"];

fn date_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}/\d{2}/\d{4} a \d{2}/\d{2}/\d{4};").unwrap())
}

/// Parses the accounts-receivable ("contas a receber") report.
///
/// Subtotal and payment-group separator lines are interleaved with the
/// data; the `Codigo Interno;` header is kept only on first occurrence.
pub fn parse(data: &[u8]) -> (Table, ParseStats) {
    let decoded = decode_bytes(data);
    let mut stats = ParseStats::new(FileKind::ContasReceber);
    stats.encoding = decoded.encoding.to_string();

    let mut kept: Vec<&str> = Vec::new();
    let mut header_seen = false;
    for raw in decoded.text.lines() {
        let line = raw.trim_start_matches('\u{feff}');
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        if stripped.starts_with("Relatório Receber Recebido") {
            continue;
        }
        if date_range_re().is_match(stripped) {
            continue;
        }
        if stripped.starts_with("Tipo: ")
            || stripped.starts_with("** Subtotal")
            || stripped.starts_with("** Pagamento")
        {
            continue;
        }
        if stripped.starts_with(HEADER_SIGNATURE) {
            if header_seen {
                continue;
            }
            header_seen = true;
        }
        kept.push(line);
    }
    if !header_seen || kept.is_empty() {
        tracing::debug!("contas a receber: no header signature found");
        return (Table::empty(), stats);
    }

    let records = read_records(&kept.join("\n"), b';');
    let Some((header, rows)) = records.split_first() else {
        return (Table::empty(), stats);
    };
    stats.initial_rows = rows.len();

    let mut table = table_from_records(header, rows);
    table.drop_empty_rows();
    table.trim_text();
    stats.parsed_value_column = table
        .normalize_money(&MONEY_COLUMNS)
        .iter()
        .any(|c| c == "Valor");
    stats.parsed_date_columns = table.normalize_dates(&DATE_COLUMNS);
    stats.final_rows = table.n_rows();
    (table, stats)
}
