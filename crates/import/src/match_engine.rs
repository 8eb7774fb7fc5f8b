use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use concilia_core::columns::canonicalize;
use concilia_core::{CellValue, Table};

/// Which columns carry the match key on each side.
#[derive(Debug, Clone)]
pub struct MatchColumns {
    pub left_date: String,
    pub left_amount: String,
    pub right_date: String,
    pub right_amount: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconciliationSummary {
    pub matched: usize,
    pub source_only: usize,
    pub target_only: usize,
    pub matched_total: Decimal,
    pub source_only_total: Decimal,
    pub target_only_total: Decimal,
}

/// The three disjoint partitions of a reconciliation run. Every input row
/// from either side lands in exactly one of them.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub matched: Table,
    pub source_only: Table,
    pub target_only: Table,
    pub summary: ReconciliationSummary,
}

type MatchKey = (NaiveDate, Decimal);

/// Extracts the (date, 2-dp-rounded amount) key of a row, plus the raw
/// unrounded amount for difference reporting.
fn row_key(
    row: &[CellValue],
    date_idx: usize,
    amount_idx: usize,
) -> Option<(MatchKey, Decimal)> {
    let date = row[date_idx].as_date()?;
    let amount = row[amount_idx].as_number()?;
    Some(((date, amount.round_dp(2)), amount))
}

fn group_by_key(
    table: &Table,
    date_idx: usize,
    amount_idx: usize,
) -> HashMap<MatchKey, Vec<usize>> {
    let mut groups: HashMap<MatchKey, Vec<usize>> = HashMap::new();
    for (i, row) in table.rows().iter().enumerate() {
        if let Some((key, _)) = row_key(row, date_idx, amount_idx) {
            groups.entry(key).or_default().push(i);
        }
    }
    groups
}

/// Joins two canonical tables on (date, rounded amount, occurrence index).
///
/// Each side's rows are ranked within their (date, amount) group in
/// original row order; the k-th occurrence on the left pairs with the k-th
/// occurrence on the right, so N duplicate-valued rows match up
/// deterministically instead of ambiguously. Rows whose date or amount is
/// null can never match and are routed into their side's `-only` partition
/// so nothing silently disappears: `2·|matched| + |source_only| +
/// |target_only|` always equals the total input row count.
///
/// Matched rows carry both sides' columns (right side suffixed on
/// collision) plus a `Diferença` column computed from the unrounded
/// amounts; it is zero unless upstream values were rounded inconsistently.
pub fn reconcile(left: &Table, right: &Table, columns: &MatchColumns) -> Reconciliation {
    let left_idx = (
        left.column_index(&columns.left_date),
        left.column_index(&columns.left_amount),
    );
    let right_idx = (
        right.column_index(&columns.right_date),
        right.column_index(&columns.right_amount),
    );

    let mut matched_columns: Vec<String> = left.columns().to_vec();
    matched_columns.extend(right.columns().iter().cloned());
    matched_columns.push("Diferença".to_string());
    let mut matched = Table::new(canonicalize(&matched_columns));
    let mut source_only = Table::new(left.columns().to_vec());
    let mut target_only = Table::new(right.columns().to_vec());
    let mut summary = ReconciliationSummary::default();

    let ((Some(ld), Some(la)), (Some(rd), Some(ra))) = (left_idx, right_idx) else {
        // a missing key column keys nothing: everything is unmatched
        tracing::warn!("reconciliation key columns missing, no pairs possible");
        for row in left.rows() {
            source_only.push_row(row.clone());
        }
        for row in right.rows() {
            target_only.push_row(row.clone());
        }
        summary.source_only = source_only.n_rows();
        summary.target_only = target_only.n_rows();
        summary.source_only_total = source_only.sum_column(&columns.left_amount);
        summary.target_only_total = target_only.sum_column(&columns.right_amount);
        return Reconciliation {
            matched,
            source_only,
            target_only,
            summary,
        };
    };

    let left_groups = group_by_key(left, ld, la);
    let right_groups = group_by_key(right, rd, ra);

    let mut occurrence: HashMap<MatchKey, usize> = HashMap::new();
    for row in left.rows() {
        let Some((key, raw_amount)) = row_key(row, ld, la) else {
            source_only.push_row(row.clone());
            continue;
        };
        let occ = occurrence.entry(key).or_insert(0);
        let partner = right_groups.get(&key).and_then(|g| g.get(*occ)).copied();
        *occ += 1;
        match partner {
            Some(right_row) => {
                let right_cells = &right.rows()[right_row];
                let right_raw = right_cells[ra]
                    .as_number()
                    .unwrap_or(Decimal::ZERO);
                let mut cells = row.clone();
                cells.extend(right_cells.iter().cloned());
                cells.push(CellValue::Number(raw_amount - right_raw));
                matched.push_row(cells);
                summary.matched_total += raw_amount;
            }
            None => source_only.push_row(row.clone()),
        }
    }

    occurrence.clear();
    for row in right.rows() {
        let Some((key, _)) = row_key(row, rd, ra) else {
            target_only.push_row(row.clone());
            continue;
        };
        let occ = occurrence.entry(key).or_insert(0);
        let left_count = left_groups.get(&key).map(Vec::len).unwrap_or(0);
        if *occ >= left_count {
            target_only.push_row(row.clone());
        }
        *occ += 1;
    }

    summary.matched = matched.n_rows();
    summary.source_only = source_only.n_rows();
    summary.target_only = target_only.n_rows();
    summary.source_only_total = source_only.sum_column(&columns.left_amount);
    summary.target_only_total = target_only.sum_column(&columns.right_amount);
    Reconciliation {
        matched,
        source_only,
        target_only,
        summary,
    }
}
