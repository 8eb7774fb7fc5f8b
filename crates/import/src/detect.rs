use serde::Serialize;
use std::fmt;

/// The file shapes the sniffer can classify an upload into.
///
/// `Odontotech` is never returned by [`detect_kind`]: the dental-billing
/// export has no reliable banner, so callers select it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Ofx,
    ContasPagar,
    ContasReceber,
    Francesinha,
    Csv,
    Odontotech,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Ofx => "ofx",
            FileKind::ContasPagar => "contas_pagar",
            FileKind::ContasReceber => "contas_receber",
            FileKind::Francesinha => "francesinha",
            FileKind::Csv => "csv",
            FileKind::Odontotech => "odontotech",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a named payload by its first ~20 lines.
///
/// Check order matters: the extension and the explicit `<OFX` tag win over
/// the banner substrings, which could coincidentally appear in unrelated
/// files.
pub fn detect_kind(name: &str, text: &str) -> FileKind {
    if name.to_lowercase().ends_with(".ofx") {
        return FileKind::Ofx;
    }
    let head = text.lines().take(20).collect::<Vec<_>>().join("\n");
    if head.to_uppercase().contains("<OFX") {
        return FileKind::Ofx;
    }
    if head.contains("Relatório de Contas Pagas") {
        return FileKind::ContasPagar;
    }
    if head.contains("Relatório Receber Recebido") {
        return FileKind::ContasReceber;
    }
    if head.contains("Sacado,,,Nosso Número") || head.starts_with("Sacado,") {
        return FileKind::Francesinha;
    }
    FileKind::Csv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ofx_by_extension_regardless_of_content() {
        assert_eq!(detect_kind("extrato.OFX", "Sacado,algo"), FileKind::Ofx);
        assert_eq!(detect_kind("extrato.ofx", ""), FileKind::Ofx);
    }

    #[test]
    fn ofx_by_tag_in_head() {
        let text = "OFXHEADER:100\nDATA:OFXSGML\n<OFX>\n<STMTTRN>";
        assert_eq!(detect_kind("extrato.txt", text), FileKind::Ofx);
        assert_eq!(detect_kind("extrato.txt", "<ofx>"), FileKind::Ofx);
    }

    #[test]
    fn ofx_tag_beyond_head_is_ignored() {
        let mut text = "linha\n".repeat(25);
        text.push_str("<OFX>");
        assert_eq!(detect_kind("extrato.csv", &text), FileKind::Csv);
    }

    #[test]
    fn contas_pagar_banner() {
        let text = "Relatório de Contas Pagas\nPeríodo Inicial: 01/01/2024\n";
        assert_eq!(detect_kind("contas.csv", text), FileKind::ContasPagar);
    }

    #[test]
    fn contas_receber_banner() {
        let text = "Relatório Receber Recebido\n01/01/2024 a 31/01/2024;\n";
        assert_eq!(detect_kind("contas.csv", text), FileKind::ContasReceber);
    }

    #[test]
    fn francesinha_header_signature() {
        assert_eq!(
            detect_kind("fran.csv", "Sacado,,,Nosso Número,Seu Número\n"),
            FileKind::Francesinha
        );
        assert_eq!(
            detect_kind("fran.csv", "Sacado,Valor (R$)\n"),
            FileKind::Francesinha
        );
    }

    #[test]
    fn everything_else_is_generic_csv() {
        assert_eq!(detect_kind("dados.csv", "a,b,c\n1,2,3\n"), FileKind::Csv);
    }
}
