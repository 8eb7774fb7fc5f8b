use concilia_core::{CellValue, Table};

use crate::decode::decode_bytes;
use crate::detect::FileKind;
use crate::stats::ParseStats;
use crate::util::{read_records, table_from_records};

const SKIP_PREFIXES: [&str; 4] = [
    "Relatório de Contas Pagas",
    "Período Inicial",
    "Período Final",
    "Com posição em",
];
/// The report restates this header at every page break; only the first
/// occurrence is the real header.
const HEADER_SIGNATURE: &str = "Codigo;Pagamento;Classe Financeira;";

const MONEY_COLUMNS: [&str; 7] = [
    "Valor",
    "Valor PIS",
    "Valor COFINS",
    "Valor CSLL",
    "Valor IRRF",
    "Valor ISS",
    "Valor INSS",
];
// both spellings: the raw file says "Emissao", canonicalization accents it
const DATE_COLUMNS: [&str; 5] = [
    "Pagamento",
    "Emissão",
    "Emissao",
    "Vencimento",
    "Dt. Conciliação",
];

/// Parses the accounts-payable ("contas a pagar") report.
pub fn parse(data: &[u8]) -> (Table, ParseStats) {
    let decoded = decode_bytes(data);
    let mut stats = ParseStats::new(FileKind::ContasPagar);
    stats.encoding = decoded.encoding.to_string();

    let mut kept: Vec<&str> = Vec::new();
    let mut header_seen = false;
    for raw in decoded.text.lines() {
        let line = raw.trim_start_matches('\u{feff}');
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        if SKIP_PREFIXES.iter().any(|p| stripped.starts_with(p)) {
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
        tracing::debug!("contas a pagar: no header signature found");
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
    strip_parcela_quotes(&mut table);
    stats.final_rows = table.n_rows();
    (table, stats)
}

/// The `Parcela` field arrives quoted like `'01/03'` to stop spreadsheets
/// reading it as a date.
fn strip_parcela_quotes(table: &mut Table) {
    table.map_column("Parcela", |cell| match cell {
        CellValue::Text(s) => {
            let stripped = s.trim_matches('\'').trim();
            if stripped.is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(stripped.to_string())
            }
        }
        other => other.clone(),
    });
}
