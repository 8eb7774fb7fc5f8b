use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// One cell of a canonical record table.
///
/// Every parser converges to these five shapes; a cell that fails
/// normalization degrades to `Null` rather than aborting the row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Builds a cell from a raw delimited field: whitespace-only input is
    /// missing data, everything else is kept as trimmed text.
    pub fn from_field(field: &str) -> CellValue {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            CellValue::Null
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The calendar date of a `Date` or `DateTime` cell.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::DateTime(dt) => Some(dt.date()),
            _ => None,
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            CellValue::Number(_) => 0,
            CellValue::Date(_) => 1,
            CellValue::DateTime(_) => 2,
            CellValue::Text(_) => 3,
            CellValue::Null => 4,
        }
    }

    /// Total ordering used for sorting and grouping output: values of the
    /// same type compare naturally, nulls sort last, mixed types fall back
    /// to a fixed type rank so the result is deterministic.
    pub fn cmp_nulls_last(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => Ordering::Equal,
            (CellValue::Null, _) => Ordering::Greater,
            (_, CellValue::Null) => Ordering::Less,
            (CellValue::Number(a), CellValue::Number(b)) => a.cmp(b),
            (CellValue::Date(a), CellValue::Date(b)) => a.cmp(b),
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a.cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            (a, b) => a.type_rank().cmp(&b.type_rank()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn from_field_blank_is_null() {
        assert_eq!(CellValue::from_field(""), CellValue::Null);
        assert_eq!(CellValue::from_field("   "), CellValue::Null);
    }

    #[test]
    fn from_field_trims_text() {
        assert_eq!(
            CellValue::from_field("  abc  "),
            CellValue::Text("abc".to_string())
        );
    }

    #[test]
    fn nulls_sort_last() {
        let n = CellValue::Number(Decimal::from_str("1.5").unwrap());
        assert_eq!(CellValue::Null.cmp_nulls_last(&n), Ordering::Greater);
        assert_eq!(n.cmp_nulls_last(&CellValue::Null), Ordering::Less);
        assert_eq!(CellValue::Null.cmp_nulls_last(&CellValue::Null), Ordering::Equal);
    }

    #[test]
    fn same_type_compares_by_value() {
        let a = CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let b = CellValue::Date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(a.cmp_nulls_last(&b), Ordering::Less);
    }

    #[test]
    fn display_formats() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()).to_string(),
            "2024-01-15"
        );
        assert_eq!(
            CellValue::Number(Decimal::from_str("150.75").unwrap()).to_string(),
            "150.75"
        );
    }

    #[test]
    fn equal_decimals_with_different_scale_hash_alike() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(CellValue::Number(Decimal::from_str("1.50").unwrap()));
        assert!(set.contains(&CellValue::Number(Decimal::from_str("1.5").unwrap())));
    }
}
