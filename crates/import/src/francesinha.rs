use regex::Regex;
use std::sync::OnceLock;

use concilia_core::Table;

use crate::decode::decode_bytes;
use crate::detect::FileKind;
use crate::stats::ParseStats;
use crate::util::{parse_line, table_from_records};

/// Banner lines the bank prepends to the francesinha listing.
const SKIP_PREFIXES: [&str; 6] = [
    "Ordenado por",
    "Gerado em",
    "Relatório",
    "Cedente",
    "Tipo Consulta",
    "Conta Corrente",
];
/// Footer totals interleaved between pages.
const SKIP_CONTAINS: [&str; 3] = ["Total de Valores", "Total de Registros", "Total Geral"];

const MONEY_COLUMNS: [&str; 6] = [
    "Valor (R$)",
    "Vlr. Mora",
    "Vlr. Desc.",
    "Vlr. Outros Acresc.",
    "Vlr. Baixado",
    "Vlr. Cobrado",
];
const DATE_COLUMNS: [&str; 5] = [
    "Dt. Previsão Crédito",
    "Vencimento",
    "Dt. Limite Pgto",
    "Dt. Baixa",
    "Dt. Liquid.",
];

fn day_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,2}-").unwrap())
}

/// Parses the boleto ("francesinha") settlement report.
///
/// The true header is the first row whose leading cell starts with
/// `Sacado`; everything before it, and every banner/footer/date-group line
/// in between, is skipped. No header means an empty table, not an error.
pub fn parse(data: &[u8]) -> (Table, ParseStats) {
    let decoded = decode_bytes(data);
    let mut stats = ParseStats::new(FileKind::Francesinha);
    stats.encoding = decoded.encoding.to_string();

    let mut header: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<String>> = Vec::new();
    for raw in decoded.text.lines() {
        let line = raw.trim_start_matches('\u{feff}');
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        let normalized = stripped.trim_start_matches(',').trim();
        let first_cell = normalized.split(',').next().unwrap_or("").trim();
        if SKIP_PREFIXES.iter().any(|p| first_cell.starts_with(p)) {
            continue;
        }
        if first_cell.ends_with(':') {
            continue;
        }
        if SKIP_CONTAINS.iter().any(|t| normalized.contains(t)) {
            continue;
        }
        // date-group separator rows like "05-Segunda"
        if day_prefix_re().is_match(first_cell) {
            continue;
        }

        let parsed = parse_line(line, b',');
        if parsed
            .first()
            .map(|c| c.trim().starts_with("Sacado"))
            .unwrap_or(false)
        {
            header = Some(parsed);
            continue;
        }
        if header.is_some() {
            rows.push(parsed);
        }
    }

    let Some(header) = header else {
        tracing::debug!("francesinha: no Sacado header line found");
        return (Table::empty(), stats);
    };
    stats.initial_rows = rows.len();

    let mut table = table_from_records(&header, &rows);
    table.trim_text();
    stats.parsed_value_column = table
        .normalize_money(&MONEY_COLUMNS)
        .iter()
        .any(|c| c == "Vlr. Cobrado");
    stats.parsed_date_columns = table.normalize_dates(&DATE_COLUMNS);
    table.drop_empty_rows();
    stats.final_rows = table.n_rows();
    (table, stats)
}
