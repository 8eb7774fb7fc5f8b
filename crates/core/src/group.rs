use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

use crate::table::Table;
use crate::value::CellValue;

#[derive(Debug, Error)]
pub enum GroupError {
    /// The caller asked to group by columns none of which exist. This is a
    /// contract violation, not messy input, so it surfaces as a hard error
    /// while "zero rows parsed" never does.
    #[error("none of the requested grouping columns exist: {0:?}")]
    InvalidGrouping(Vec<String>),
}

/// Groups rows by the given columns and computes per-group row count (`qtd`)
/// and sum of the value column (`total`).
///
/// Nulls form their own group rather than being excluded. Requested columns
/// that are missing from the table are ignored; only when none remain does
/// the call fail. Output rows are ordered ascending by the grouping columns
/// with null groups last.
pub fn group_totals(
    table: &Table,
    by: &[&str],
    value_column: &str,
) -> Result<Table, GroupError> {
    let group_cols: Vec<(&str, usize)> = by
        .iter()
        .filter_map(|name| table.column_index(name).map(|idx| (*name, idx)))
        .collect();
    if group_cols.is_empty() {
        return Err(GroupError::InvalidGrouping(
            by.iter().map(|s| s.to_string()).collect(),
        ));
    }
    let value_idx = table.column_index(value_column);

    let mut order: Vec<Vec<CellValue>> = Vec::new();
    let mut groups: HashMap<Vec<CellValue>, (usize, Decimal)> = HashMap::new();
    for row in table.rows() {
        let key: Vec<CellValue> = group_cols.iter().map(|&(_, idx)| row[idx].clone()).collect();
        let entry = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            (0, Decimal::ZERO)
        });
        entry.0 += 1;
        if let Some(idx) = value_idx {
            if let Some(n) = row[idx].as_number() {
                entry.1 += n;
            }
        }
    }

    order.sort_by(|a, b| {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| x.cmp_nulls_last(y))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut columns: Vec<String> = group_cols.iter().map(|&(name, _)| name.to_string()).collect();
    columns.push("qtd".to_string());
    columns.push("total".to_string());
    let mut out = Table::new(columns);
    for key in order {
        let (count, total) = groups[&key];
        let mut row = key;
        row.push(CellValue::Number(Decimal::from(count as i64)));
        row.push(CellValue::Number(total));
        out.push_row(row);
    }
    Ok(out)
}

/// Picks the most appropriate bank column available, in preference order.
pub fn detect_bank_column(table: &Table) -> Option<&'static str> {
    ["Nome Banco", "NºBanco", "ID Banco", "ID Conta Corrente"]
        .into_iter()
        .find(|c| table.column_index(c).is_some())
}
