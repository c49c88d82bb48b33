//! Numeric text formatting for document fields

use serde::{Deserialize, Serialize};

/// How numeric values are rendered into document text fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NumberFormat {
    /// Shortest representation at six significant digits, trailing zeros
    /// trimmed ("36", "51.3", "1.71429")
    #[default]
    General,
    /// Fixed five decimal places ("51.30000"), as some template-driven
    /// exports expect
    Fixed5,
}

/// Render a value with the given format
pub fn format_number(value: f64, format: NumberFormat) -> String {
    match format {
        NumberFormat::General => {
            // Round to six significant digits, then let Display drop the
            // trailing zeros and float noise.
            let rounded: f64 = format!("{value:.5e}").parse().unwrap_or(value);
            format!("{rounded}")
        }
        NumberFormat::Fixed5 => format!("{value:.5}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(36.0, "36")]
    #[case(0.0, "0")]
    #[case(7.2, "7.2")]
    // 54 * 0.95 carries binary representation error
    #[case(54.0_f64 * 0.95, "51.3")]
    #[case(12.0 / 7.0, "1.71429")]
    fn test_general(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_number(value, NumberFormat::General), expected);
    }

    #[rstest]
    #[case(51.3, "51.30000")]
    #[case(36.0, "36.00000")]
    #[case(26.0 / 30.0, "0.86667")]
    fn test_fixed5(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_number(value, NumberFormat::Fixed5), expected);
    }
}
