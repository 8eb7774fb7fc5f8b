use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a Brazilian-formatted decimal like `1.234,56` or `R$ 1.234,56`.
///
/// Dots followed by exactly three digits are thousands separators and are
/// dropped; the remaining comma becomes the decimal point. Returns `None`
/// (never zero) when the residue is not a number, so re-parsing an
/// already-normalized value like `1234.56` is a no-op.
pub fn parse_brl_decimal(text: &str) -> Option<Decimal> {
    let cleaned = text.replace('\u{a0}', "");
    let cleaned = cleaned.trim();
    let cleaned = cleaned
        .strip_prefix("R$")
        .or_else(|| cleaned.strip_prefix("r$"))
        .unwrap_or(cleaned)
        .trim();
    if cleaned.is_empty() {
        return None;
    }
    let compact: Vec<char> = cleaned.chars().filter(|c| !c.is_whitespace()).collect();
    if !compact
        .iter()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'))
    {
        return None;
    }

    let mut out = String::with_capacity(compact.len());
    let mut i = 0;
    while i < compact.len() {
        if compact[i] == '.' {
            let digit_run = compact[i + 1..]
                .iter()
                .take_while(|c| c.is_ascii_digit())
                .count();
            // exactly three digits after the dot: thousands separator
            if digit_run == 3 {
                i += 1;
                continue;
            }
        }
        out.push(compact[i]);
        i += 1;
    }

    Decimal::from_str(&out.replace(',', ".")).ok()
}

const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%d/%m/%y", "%d-%m-%Y", "%Y-%m-%d"];

/// Day-first date parse (`dd/mm/yyyy` primary). Total: bad input is `None`.
pub fn parse_date_br(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Renders a value the way the reports display money: `R$ 1.234,56`.
pub fn format_brl(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let sign = if rounded.is_sign_negative() { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*ch);
    }

    format!("R$ {sign}{grouped},{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ── parse_brl_decimal ─────────────────────────────────────────────────────

    #[test]
    fn thousands_and_decimal_separators() {
        assert_eq!(parse_brl_decimal("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_brl_decimal("12.345.678,90"), Some(dec("12345678.90")));
    }

    #[test]
    fn comma_only_decimal() {
        assert_eq!(parse_brl_decimal("150,75"), Some(dec("150.75")));
        assert_eq!(parse_brl_decimal("-0,01"), Some(dec("-0.01")));
    }

    #[test]
    fn plain_dot_decimal_passes_through() {
        // two digits after the dot: not a thousands separator
        assert_eq!(parse_brl_decimal("1234.56"), Some(dec("1234.56")));
    }

    #[test]
    fn bare_thousands_dot_is_dropped() {
        assert_eq!(parse_brl_decimal("1.234"), Some(dec("1234")));
    }

    #[test]
    fn currency_prefix_and_nbsp() {
        assert_eq!(parse_brl_decimal("R$ 1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_brl_decimal("R$\u{a0}99,90"), Some(dec("99.90")));
    }

    #[test]
    fn garbage_is_none_not_zero() {
        assert_eq!(parse_brl_decimal(""), None);
        assert_eq!(parse_brl_decimal("   "), None);
        assert_eq!(parse_brl_decimal("abc"), None);
        assert_eq!(parse_brl_decimal("ABC123"), None);
        assert_eq!(parse_brl_decimal("12,34,56"), None);
    }

    #[test]
    fn reparse_is_stable() {
        for s in ["1.234,56", "150,75", "-99,90", "0,01"] {
            let first = parse_brl_decimal(s).unwrap();
            let second = parse_brl_decimal(&first.to_string()).unwrap();
            assert_eq!(first, second, "unstable for {s}");
        }
    }

    // ── parse_date_br ─────────────────────────────────────────────────────────

    #[test]
    fn day_first_slash() {
        assert_eq!(
            parse_date_br("15/01/2024"),
            Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
    }

    #[test]
    fn iso_fallback() {
        assert_eq!(
            parse_date_br("2024-01-15"),
            Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
    }

    #[test]
    fn invalid_dates_are_none() {
        assert_eq!(parse_date_br(""), None);
        assert_eq!(parse_date_br("32/01/2024"), None);
        assert_eq!(parse_date_br("not a date"), None);
    }

    // ── format_brl ────────────────────────────────────────────────────────────

    #[test]
    fn formats_with_brazilian_separators() {
        assert_eq!(format_brl(dec("1234.5")), "R$ 1.234,50");
        assert_eq!(format_brl(dec("1234567.89")), "R$ 1.234.567,89");
        assert_eq!(format_brl(dec("-99.9")), "R$ -99,90");
        assert_eq!(format_brl(dec("0")), "R$ 0,00");
    }

    #[test]
    fn format_parse_round_trip() {
        let v = dec("12345.67");
        assert_eq!(parse_brl_decimal(&format_brl(v)), Some(v));
    }
}
