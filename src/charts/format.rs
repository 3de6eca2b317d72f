//! Display formatting shared by charts, tables and the map panel.

/// Group digits with commas: 12345.6 -> "12,346".
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// "$104,300", or "N/A" when there is no income.
pub fn format_currency(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("${}", format_thousands(v)),
        None => "N/A".to_string(),
    }
}

/// Share as stored (a percentage number): 35.2 -> "35.2%".
pub fn format_share(value: f64) -> String {
    format!("{value}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_grouping() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(1234.4), "1,234");
        assert_eq!(format_thousands(80_000.0), "80,000");
        assert_eq!(format_thousands(-1_234_567.0), "-1,234,567");
    }

    #[test]
    fn currency_and_share() {
        assert_eq!(format_currency(Some(104_300.0)), "$104,300");
        assert_eq!(format_currency(None), "N/A");
        assert_eq!(format_share(35.2), "35.2%");
        assert_eq!(format_share(40.0), "40%");
    }
}
