use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use concilia_core::columns::strip_accents;
use concilia_core::{CellValue, Table};

/// One accounting-entry rule: a classification text mapped to the debit
/// and credit accounts and the history code its entries book under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRule {
    pub classification: String,
    pub debit_account: String,
    pub credit_account: String,
    pub history_code: String,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(rename = "rule", default)]
    rules: Vec<EntryRule>,
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("failed to parse rule table: {0}")]
    InvalidToml(String),
}

/// A lookup table of entry rules keyed by normalized classification text
/// (accent-stripped, uppercased, trimmed), so `Aluguél`, `ALUGUEL` and
/// `aluguel ` all hit the same rule.
pub struct EntryRuleSet {
    rules: HashMap<String, EntryRule>,
}

fn normalize_classification(text: &str) -> String {
    strip_accents(text).trim().to_uppercase()
}

impl EntryRuleSet {
    pub fn new(rules: Vec<EntryRule>) -> EntryRuleSet {
        let mut map = HashMap::new();
        for rule in rules {
            map.insert(normalize_classification(&rule.classification), rule);
        }
        EntryRuleSet { rules: map }
    }

    /// Loads `[[rule]]` tables from TOML text.
    pub fn from_toml(content: &str) -> Result<EntryRuleSet, RuleError> {
        let file: RuleFile =
            toml::from_str(content).map_err(|e| RuleError::InvalidToml(e.to_string()))?;
        Ok(EntryRuleSet::new(file.rules))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn lookup(&self, classification: &str) -> Option<&EntryRule> {
        self.rules.get(&normalize_classification(classification))
    }

    /// Maps each row of a table to an accounting-entry row by its
    /// classification column. Rows with no matching rule are skipped; the
    /// value column, when present, is carried through for the export.
    pub fn apply(&self, table: &Table, class_column: &str, value_column: &str) -> Table {
        let mut out = Table::new(vec![
            class_column.to_string(),
            "Conta Débito".to_string(),
            "Conta Crédito".to_string(),
            "Cod. Histórico".to_string(),
            value_column.to_string(),
        ]);
        let Some(class_idx) = table.column_index(class_column) else {
            return out;
        };
        let value_idx = table.column_index(value_column);

        let mut unmatched = 0usize;
        for row in table.rows() {
            let Some(class_text) = row[class_idx].as_text() else {
                unmatched += 1;
                continue;
            };
            let Some(rule) = self.lookup(class_text) else {
                unmatched += 1;
                continue;
            };
            out.push_row(vec![
                row[class_idx].clone(),
                CellValue::Text(rule.debit_account.clone()),
                CellValue::Text(rule.credit_account.clone()),
                CellValue::Text(rule.history_code.clone()),
                value_idx.map(|i| row[i].clone()).unwrap_or(CellValue::Null),
            ]);
        }
        if unmatched > 0 {
            tracing::debug!(unmatched, "rows without a matching entry rule were skipped");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const RULES_TOML: &str = r#"
[[rule]]
classification = "Aluguel"
debit_account = "3.1.1"
credit_account = "1.1.2"
history_code = "102"

[[rule]]
classification = "Mensalidade"
debit_account = "1.1.2"
credit_account = "4.1.1"
history_code = "201"
"#;

    #[test]
    fn lookup_is_accent_and_case_insensitive() {
        let rules = EntryRuleSet::from_toml(RULES_TOML).unwrap();
        assert_eq!(rules.len(), 2);
        let r = rules.lookup("  aluguel ").unwrap();
        assert_eq!(r.debit_account, "3.1.1");
        // accent variants hit the same rule
        assert!(rules.lookup("ALUGUÉL").is_some());
        assert!(rules.lookup("MENSALIDADE").is_some());
        assert!(rules.lookup("CONDOMINIO").is_none());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(matches!(
            EntryRuleSet::from_toml("not toml ["),
            Err(RuleError::InvalidToml(_))
        ));
    }

    #[test]
    fn apply_maps_rows_and_skips_unmatched() {
        let rules = EntryRuleSet::from_toml(RULES_TOML).unwrap();
        let mut t = Table::new(vec!["CLASSE".into(), "total".into()]);
        t.push_row(vec![
            CellValue::Text("Aluguel".into()),
            CellValue::Number(Decimal::from_str("3500.00").unwrap()),
        ]);
        t.push_row(vec![
            CellValue::Text("Desconhecida".into()),
            CellValue::Number(Decimal::from_str("1.00").unwrap()),
        ]);
        let entries = rules.apply(&t, "CLASSE", "total");
        assert_eq!(entries.n_rows(), 1);
        assert_eq!(
            entries.cell(0, "Conta Débito"),
            Some(&CellValue::Text("3.1.1".into()))
        );
        assert_eq!(
            entries.cell(0, "total").unwrap().as_number(),
            Some(Decimal::from_str("3500.00").unwrap())
        );
    }

    #[test]
    fn entries_export_semicolon_delimited() {
        let rules = EntryRuleSet::from_toml(RULES_TOML).unwrap();
        let mut t = Table::new(vec!["CLASSE".into(), "total".into()]);
        t.push_row(vec![
            CellValue::Text("Mensalidade".into()),
            CellValue::Number(Decimal::from_str("350.00").unwrap()),
        ]);
        let entries = rules.apply(&t, "CLASSE", "total");
        let csv = entries.to_csv(b';', true).unwrap();
        let body = String::from_utf8(csv[3..].to_vec()).unwrap();
        assert!(body.starts_with("CLASSE;Conta Débito;Conta Crédito;Cod. Histórico;total\n"));
        assert!(body.contains("Mensalidade;1.1.2;4.1.1;201;350.00"));
    }
}
