//! Number formatting for the dashboard, en-US style.

/// Fixed decimals with comma thousands separators: `95000.12` with 1
/// decimal is `95,000.1`.
pub fn grouped(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if value.is_sign_negative() && value != 0.0 {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac_part) = frac_part {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Fixed decimals, no grouping.
pub fn fixed(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

pub fn dollars_grouped(value: f64, decimals: usize) -> String {
    format!("${}", grouped(value, decimals))
}

pub fn dollars_fixed(value: f64, decimals: usize) -> String {
    format!("${}", fixed(value, decimals))
}

/// Shortest text for a number: `1.5`, `3` (not `3.0`).
pub fn plain(value: f64) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped() {
        assert_eq!(grouped(100.0, 1), "100.0");
        assert_eq!(grouped(95000.12, 1), "95,000.1");
        assert_eq!(grouped(1234567.891, 2), "1,234,567.89");
        assert_eq!(grouped(999.96, 1), "1,000.0");
        assert_eq!(grouped(12.0, 0), "12");
        assert_eq!(grouped(-4321.5, 1), "-4,321.5");
    }

    #[test]
    fn test_fixed_and_dollars() {
        assert_eq!(fixed(0.4567, 2), "0.46");
        assert_eq!(dollars_fixed(1234.5, 2), "$1234.50");
        assert_eq!(dollars_grouped(100.0, 1), "$100.0");
        assert_eq!(dollars_grouped(95000.15, 2), "$95,000.15");
    }

    #[test]
    fn test_plain() {
        assert_eq!(plain(1.5), "1.5");
        assert_eq!(plain(3.0), "3");
        assert_eq!(plain(0.00012), "0.00012");
    }
}
