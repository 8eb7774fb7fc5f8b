use serde::Serialize;

use crate::detect::FileKind;

/// What happened while turning a byte buffer into a canonical table.
///
/// `dropped_star_rows` is only ever non-zero for the Odontotech format,
/// whose report marks void rows with a leading `*`.
#[derive(Debug, Clone, Serialize)]
pub struct ParseStats {
    pub kind: FileKind,
    pub encoding: String,
    pub initial_rows: usize,
    pub dropped_star_rows: usize,
    pub final_rows: usize,
    pub parsed_date_columns: Vec<String>,
    pub parsed_value_column: bool,
}

impl ParseStats {
    pub fn new(kind: FileKind) -> ParseStats {
        ParseStats {
            kind,
            encoding: String::new(),
            initial_rows: 0,
            dropped_star_rows: 0,
            final_rows: 0,
            parsed_date_columns: Vec::new(),
            parsed_value_column: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_snake_case_kind() {
        let mut stats = ParseStats::new(FileKind::ContasPagar);
        stats.encoding = "utf-8".to_string();
        stats.final_rows = 3;
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["kind"], "contas_pagar");
        assert_eq!(json["final_rows"], 3);
    }
}
