pub mod contas_pagar;
pub mod contas_receber;
pub mod decode;
pub mod detect;
pub mod francesinha;
pub mod generic;
pub mod match_engine;
pub mod odontotech;
pub mod ofx;
pub mod rules;
pub mod stats;
pub(crate) mod util;

pub use decode::{decode_bytes, Decoded};
pub use detect::{detect_kind, FileKind};
pub use match_engine::{reconcile, MatchColumns, Reconciliation, ReconciliationSummary};
pub use ofx::read_ofx_transactions;
pub use rules::{EntryRule, EntryRuleSet, RuleError};
pub use stats::ParseStats;

pub mod import {
    use crate::*;
    use concilia_core::Table;

    /// Sniffs the format of a named byte buffer and parses it into a
    /// canonical table with parse stats. Total: unusable input comes back
    /// as a zero-row table, never an error.
    pub fn parse(data: &[u8], filename: &str) -> (Table, ParseStats) {
        let decoded = decode_bytes(data);
        let kind = detect_kind(filename, &decoded.text);
        tracing::debug!(%kind, filename, "classified upload");
        match kind {
            FileKind::Ofx => ofx::parse(data),
            FileKind::Francesinha => francesinha::parse(data),
            FileKind::ContasPagar => contas_pagar::parse(data),
            FileKind::ContasReceber => contas_receber::parse(data),
            FileKind::Odontotech => odontotech::parse(data),
            FileKind::Csv => generic::parse(data),
        }
    }

    /// Parses the Odontotech billing export, which callers select
    /// explicitly rather than through the sniffer.
    pub fn parse_odontotech(data: &[u8]) -> (Table, ParseStats) {
        odontotech::parse(data)
    }
}
