//! Display formatting for report cells.
//!
//! Numbers are grouped with a space every three digits (the grouping of
//! the source locale) and carry two decimals; ratios render as
//! whole-number percentages. A missing value renders as the empty
//! string, never as a zero, so an absent figure stays distinguishable
//! from a real zero in the table.

/// Decimal places used for numeric cells.
pub const VALUE_DECIMALS: u8 = 2;

/// Format a number with a space thousands separator and the given number
/// of decimals.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_number_with_decimals(1234567.891, 2), "1 234 567.89");
/// ```
pub fn format_number_with_decimals(value: f64, decimals: u8) -> String {
    let formatted = format!("{:.*}", decimals as usize, value);

    let (integer_part, decimal_part) = match formatted.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (formatted.as_str(), None),
    };

    // Insert a space every 3 digits from the right, keeping a leading
    // minus sign attached to the first group.
    let mut grouped = String::new();
    let chars: Vec<char> = integer_part.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 && *c != '-' {
            grouped.push(' ');
        }
        grouped.push(*c);
    }
    let grouped: String = grouped.chars().rev().collect();

    match decimal_part {
        Some(d) => format!("{}.{}", grouped, d),
        None => grouped,
    }
}

/// Format a numeric cell: two decimals, or empty when missing.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format_number_with_decimals(v, VALUE_DECIMALS),
        None => String::new(),
    }
}

/// Format a ratio cell as a whole-number percentage, empty when undefined.
pub fn format_ratio(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format!("{:.0}%", r * 100.0),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_with_decimals() {
        assert_eq!(format_number_with_decimals(1234.567, 2), "1 234.57");
        assert_eq!(format_number_with_decimals(1234567.89, 2), "1 234 567.89");
        assert_eq!(format_number_with_decimals(0.0, 2), "0.00");
        assert_eq!(format_number_with_decimals(999.0, 2), "999.00");
        assert_eq!(format_number_with_decimals(1234567.0, 0), "1 234 567");
    }

    #[test]
    fn test_negative_numbers_keep_sign_attached() {
        assert_eq!(format_number_with_decimals(-1234.56, 2), "-1 234.56");
        assert_eq!(format_number_with_decimals(-123456.0, 0), "-123 456");
    }

    #[test]
    fn test_format_value_missing_is_empty() {
        assert_eq!(format_value(Some(1234.5)), "1 234.50");
        assert_eq!(format_value(None), "");
    }

    #[test]
    fn test_format_ratio_whole_percent() {
        assert_eq!(format_ratio(Some(1.2)), "120%");
        assert_eq!(format_ratio(Some(1.05)), "105%");
        assert_eq!(format_ratio(Some(0.8)), "80%");
        assert_eq!(format_ratio(Some(1.0)), "100%");
        assert_eq!(format_ratio(None), "");
    }

    #[test]
    fn test_format_ratio_rounds_to_whole() {
        assert_eq!(format_ratio(Some(0.666)), "67%");
        assert_eq!(format_ratio(Some(-0.5)), "-50%");
    }
}
