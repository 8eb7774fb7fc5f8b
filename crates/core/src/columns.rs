use std::collections::HashSet;

/// Folds the Latin accents that show up in the report headers. The corpus
/// only ever sees Portuguese text, so a fixed table beats pulling in a full
/// Unicode normalization pass.
pub fn strip_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            'ñ' => 'n',
            'Ñ' => 'N',
            'º' => 'o',
            'ª' => 'a',
            other => other,
        })
        .collect()
}

/// Lowercases, strips accents, and collapses `.`, `_`, `-`, `/` and
/// whitespace runs into single spaces. This is the lookup key for the
/// canonical column dictionary.
pub fn normalize_key(header: &str) -> String {
    let folded = strip_accents(&header.to_lowercase());
    let mut out = String::with_capacity(folded.len());
    let mut pending_space = false;
    for ch in folded.chars() {
        if ch.is_whitespace() || matches!(ch, '.' | '_' | '-' | '/') {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}

/// The fixed vocabulary of known header spellings, keyed by normalized form.
fn canonical_target(key: &str) -> Option<&'static str> {
    let target = match key {
        "codigo interno" => "Codigo Interno",
        "emissao" => "Emissão",
        "vencto" => "Vencto",
        "pagto" => "Pagto",
        "doc" => "Doc.",
        "historico" => "Historico",
        "valor" => "Valor",
        "classe" => "CLASSE",
        "parc" => "Parc.",
        "orcamento" => "Orçamento.",
        "fat ant" => "Fat. Ant.",
        "gerar rps" => "Gerar RPS",
        "nome plano" => "Nome Plano",
        "adm benef" => "ADM.Benef.",
        "valor ppcng" => "Valor PPCNG",
        "vo tid" => "VO TID",
        "vindi tid" => "VINDI TID",
        "forma de pagamento" => "Forma de Pagamento",
        "id banco" => "ID Banco",
        "n banco" | "no banco" | "nobanco" => "NºBanco",
        "nome banco" => "Nome Banco",
        "id conta corrente" => "ID Conta Corrente",
        "cpf" => "CPF",
        "fone1" => "Fone1",
        "fone2" => "Fone2",
        "fone3" => "Fone3",
        "fone4" => "Fone4",
        "celular" => "Celular",
        "razao social" => "Razão Social",
        _ => return None,
    };
    Some(target)
}

/// Maps raw headers onto the canonical vocabulary.
///
/// Unknown headers pass through trimmed. A second historico-like column
/// takes the accented `Histórico` once plain `Historico` is claimed, and
/// any remaining collision gets a deterministic `_2`, `_3`, … suffix so no
/// source column is ever overwritten. First-seen-wins, so the mapping is
/// stable for a given header sequence.
pub fn canonicalize(headers: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(headers.len());

    for header in headers {
        let key = normalize_key(header);
        let mut target = match canonical_target(&key) {
            Some("Historico") if taken.contains("Historico") => "Histórico".to_string(),
            Some(t) => t.to_string(),
            None => header.trim().to_string(),
        };
        if taken.contains(&target) {
            let base = target;
            let mut suffix = 2;
            while taken.contains(&format!("{base}_{suffix}")) {
                suffix += 1;
            }
            target = format!("{base}_{suffix}");
        }
        taken.insert(target.clone());
        out.push(target);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(headers: &[&str]) -> Vec<String> {
        canonicalize(&headers.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    // ── normalize_key ─────────────────────────────────────────────────────────

    #[test]
    fn strips_accents_and_case() {
        assert_eq!(normalize_key("Emissão"), "emissao");
        assert_eq!(normalize_key("EMISSÃO"), "emissao");
        assert_eq!(normalize_key("Orçamento."), "orcamento");
    }

    #[test]
    fn collapses_punctuation_runs() {
        assert_eq!(normalize_key("Fat. Ant."), "fat ant");
        assert_eq!(normalize_key("ADM.Benef."), "adm benef");
        assert_eq!(normalize_key("id_conta-corrente"), "id conta corrente");
        assert_eq!(normalize_key("  Doc.  "), "doc");
    }

    #[test]
    fn ordinal_indicator_folds_to_o() {
        assert_eq!(normalize_key("NºBanco"), "nobanco");
    }

    // ── canonicalize ──────────────────────────────────────────────────────────

    #[test]
    fn known_synonyms_map_to_canonical_names() {
        assert_eq!(
            canon(&["emissão", "vencto", "PAGTO", "valor", "classe"]),
            vec!["Emissão", "Vencto", "Pagto", "Valor", "CLASSE"]
        );
    }

    #[test]
    fn unknown_headers_pass_through_trimmed() {
        assert_eq!(
            canon(&["  Sacado ", "Classe Financeira"]),
            vec!["Sacado", "Classe Financeira"]
        );
    }

    #[test]
    fn collision_gets_numeric_suffix() {
        assert_eq!(canon(&["Valor", "valor"]), vec!["Valor", "Valor_2"]);
        assert_eq!(
            canon(&["Valor", "valor", "VALOR"]),
            vec!["Valor", "Valor_2", "Valor_3"]
        );
    }

    #[test]
    fn second_historico_takes_accented_variant() {
        assert_eq!(
            canon(&["Historico", "HISTÓRICO"]),
            vec!["Historico", "Histórico"]
        );
    }

    #[test]
    fn canonical_headers_are_fixed_points() {
        let first = canon(&["Historico", "Histórico", "Valor", "Valor_2", "Doc.", "NºBanco"]);
        let second = canonicalize(&first);
        assert_eq!(first, second);
    }
}
