use chrono::{NaiveDate, NaiveDateTime};
use concilia_core::brl::parse_date_br;
use concilia_core::{CellValue, Table};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::decode::decode_bytes;
use crate::detect::FileKind;
use crate::stats::ParseStats;

pub const OFX_COLUMNS: [&str; 8] = [
    "Data",
    "Valor",
    "Tipo",
    "Descrição",
    "Documento",
    "Identificador",
    "Memo",
    "Nome",
];

/// Raw tag values accumulated for one `<STMTTRN>` block.
///
/// OFX is not XML: tags are often unclosed and a `<TAG>value` line is
/// valid, so this is a flat line scanner, not a tree parser.
#[derive(Debug, Default)]
struct RawTransaction {
    dtposted: Option<String>,
    dtuser: Option<String>,
    trnamt: Option<String>,
    trntype: Option<String>,
    name: Option<String>,
    memo: Option<String>,
    checknum: Option<String>,
    refnum: Option<String>,
    fitid: Option<String>,
}

impl RawTransaction {
    fn is_empty(&self) -> bool {
        self.dtposted.is_none()
            && self.dtuser.is_none()
            && self.trnamt.is_none()
            && self.trntype.is_none()
            && self.name.is_none()
            && self.memo.is_none()
            && self.checknum.is_none()
            && self.refnum.is_none()
            && self.fitid.is_none()
    }

    fn set(&mut self, tag: &str, value: String) {
        match tag {
            "DTPOSTED" => self.dtposted = Some(value),
            "DTUSER" => self.dtuser = Some(value),
            "TRNAMT" => self.trnamt = Some(value),
            "TRNTYPE" => self.trntype = Some(value),
            "NAME" => self.name = Some(value),
            "MEMO" => self.memo = Some(value),
            "CHECKNUM" => self.checknum = Some(value),
            "REFNUM" => self.refnum = Some(value),
            "FITID" => self.fitid = Some(value),
            _ => {}
        }
    }
}

fn scan_blocks(text: &str) -> Vec<RawTransaction> {
    let mut records = Vec::new();
    let mut current: Option<RawTransaction> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let upper = line.to_uppercase();
        if upper.starts_with("<STMTTRN>") {
            current = Some(RawTransaction::default());
            continue;
        }
        if upper.starts_with("</STMTTRN>") {
            if let Some(trx) = current.take() {
                if !trx.is_empty() {
                    records.push(trx);
                }
            }
            continue;
        }
        let Some(trx) = current.as_mut() else {
            continue;
        };
        let Some(rest) = line.strip_prefix('<') else {
            continue;
        };
        let Some((name, value)) = rest.split_once('>') else {
            continue;
        };
        // an unterminated tag on the same line leaves trailing markup
        let value = value.split('<').next().unwrap_or("").trim().to_string();
        trx.set(&name.trim().to_uppercase(), value);
    }

    // truncated file with an open block: flush it, don't lose the data
    if let Some(trx) = current.take() {
        if !trx.is_empty() {
            tracing::warn!("unterminated STMTTRN block at end of input, flushing");
            records.push(trx);
        }
    }

    records
}

/// OFX timestamp parse: strip a `[...]` timezone suffix and any `T`, keep
/// the digits, then try 14-, 12- and 8-digit prefixes in order. Falls back
/// to a generic day-first parse, and finally to null.
fn parse_ofx_date(value: &str) -> Option<NaiveDateTime> {
    let cleaned = value.trim();
    if cleaned.is_empty() {
        return None;
    }
    let cleaned = cleaned.split('[').next().unwrap_or("").trim();
    let base = cleaned.replace('T', "");
    let digits: String = base.chars().filter(|c| c.is_ascii_digit()).collect();

    for (len, fmt) in [(14, "%Y%m%d%H%M%S"), (12, "%Y%m%d%H%M")] {
        if digits.len() >= len {
            if let Ok(dt) = NaiveDateTime::parse_from_str(&digits[..len], fmt) {
                return Some(dt);
            }
        }
    }
    if digits.len() >= 8 {
        if let Ok(d) = NaiveDate::parse_from_str(&digits[..8], "%Y%m%d") {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    parse_date_br(cleaned).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Amount parse tolerant of either decimal separator.
fn parse_ofx_amount(value: &str) -> Option<Decimal> {
    let cleaned = value.trim().replace(',', ".");
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

fn text_or_null(value: Option<&String>) -> CellValue {
    match value.map(|s| s.trim()) {
        Some(t) if !t.is_empty() => CellValue::Text(t.to_string()),
        _ => CellValue::Null,
    }
}

/// Parses every `<STMTTRN>` block of an OFX buffer into the canonical
/// transaction table, sorted by (Data, Identificador) with nulls last.
pub fn read_ofx_transactions(data: &[u8]) -> Table {
    let decoded = decode_bytes(data);
    read_ofx_text(&decoded.text)
}

fn read_ofx_text(text: &str) -> Table {
    let mut table = Table::new(OFX_COLUMNS.iter().map(|c| c.to_string()).collect());
    for rec in scan_blocks(text) {
        let posted = rec
            .dtposted
            .as_deref()
            .or(rec.dtuser.as_deref())
            .and_then(parse_ofx_date);
        let amount = rec.trnamt.as_deref().and_then(parse_ofx_amount);
        let tipo = match rec.trntype.as_deref().map(|t| t.trim().to_uppercase()) {
            Some(t) if !t.is_empty() => CellValue::Text(t),
            _ => CellValue::Null,
        };
        let descricao = match text_or_null(rec.name.as_ref()) {
            CellValue::Null => text_or_null(rec.memo.as_ref()),
            name => name,
        };
        let documento = match text_or_null(rec.checknum.as_ref()) {
            CellValue::Null => text_or_null(rec.refnum.as_ref()),
            doc => doc,
        };
        let identificador = match text_or_null(rec.fitid.as_ref()) {
            CellValue::Null => text_or_null(rec.refnum.as_ref()),
            id => id,
        };

        table.push_row(vec![
            posted.map(CellValue::DateTime).unwrap_or(CellValue::Null),
            amount.map(CellValue::Number).unwrap_or(CellValue::Null),
            tipo,
            descricao,
            documento,
            identificador,
            text_or_null(rec.memo.as_ref()),
            text_or_null(rec.name.as_ref()),
        ]);
    }
    table.sort_by(&["Data", "Identificador"]);
    table
}

/// Full parse entry point with stats, mirroring the delimited formats.
pub fn parse(data: &[u8]) -> (Table, ParseStats) {
    let decoded = decode_bytes(data);
    let table = read_ofx_text(&decoded.text);
    let mut stats = ParseStats::new(FileKind::Ofx);
    stats.encoding = decoded.encoding.to_string();
    stats.initial_rows = table.n_rows();
    stats.final_rows = table.n_rows();
    stats.parsed_date_columns = vec!["Data".to_string()];
    stats.parsed_value_column = true;
    (table, stats)
}
