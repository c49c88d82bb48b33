//! Dose-phrase micro-parser

use clinprot_diagnostics::{ClinProtError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static DOSE_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<dose>\d+(?:\.\d+)?)\s+Gy").expect("dose grammar"));

/// Parse a phrase of the form `"<number> Gy"` and return the dose in Gy.
///
/// The numeric token may carry a decimal part and leading or trailing
/// whitespace is tolerated. A phrase without a numeric token before the unit
/// (`"Gy"` alone, `"- Gy"`) is malformed.
///
/// ```
/// use clinprot_parser::parse_dose_phrase;
///
/// assert_eq!(parse_dose_phrase("36 Gy").unwrap(), 36.0);
/// assert_eq!(parse_dose_phrase(" 7.20 Gy ").unwrap(), 7.2);
/// assert!(parse_dose_phrase("Gy").is_err());
/// ```
pub fn parse_dose_phrase(text: &str) -> Result<f64> {
    let caps = DOSE_RX
        .captures(text)
        .ok_or_else(|| ClinProtError::malformed("Dose", text))?;
    caps["dose"]
        .parse::<f64>()
        .map_err(|_| ClinProtError::malformed("Dose", text))
}
