//! Conversion between human decimal amounts and integer base units.
//!
//! Token amounts arrive from the editor as decimal strings ("80", "0.25")
//! and must be scaled by the asset's decimal count before they reach the
//! chain client. Arithmetic is done on the digits directly so no precision
//! is lost to floating point.

use std::fmt;

/// Errors from unit conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    /// The input was empty or whitespace.
    Empty,
    /// The input contained something other than digits and one decimal point.
    InvalidDigit { input: String },
    /// The fractional part has more digits than the asset supports.
    TooPrecise { input: String, decimals: u8 },
    /// The scaled value does not fit in 128 bits.
    Overflow { input: String },
}

impl fmt::Display for UnitsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "amount is empty"),
            Self::InvalidDigit { input } => write!(f, "invalid amount '{input}'"),
            Self::TooPrecise { input, decimals } => {
                write!(f, "amount '{input}' has more than {decimals} decimal places")
            }
            Self::Overflow { input } => write!(f, "amount '{input}' is too large"),
        }
    }
}

impl std::error::Error for UnitsError {}

/// Parses a decimal string into base units with the given number of decimals.
///
/// # Errors
///
/// Returns an error for empty input, non-digit characters, more fractional
/// digits than `decimals`, or a result that overflows `u128`.
pub fn parse_units(input: &str, decimals: u8) -> Result<u128, UnitsError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };

    let invalid = || UnitsError::InvalidDigit {
        input: input.to_string(),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    // Trailing zeros never change the value, so "1.500000" is fine for 6 decimals
    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > usize::from(decimals) {
        return Err(UnitsError::TooPrecise {
            input: input.to_string(),
            decimals,
        });
    }

    let overflow = || UnitsError::Overflow {
        input: input.to_string(),
    };
    let mut value: u128 = 0;
    let padding = usize::from(decimals) - fraction.len();
    let digits = whole
        .bytes()
        .chain(fraction.bytes())
        .chain(std::iter::repeat_n(b'0', padding));
    for digit in digits {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u128::from(digit - b'0')))
            .ok_or_else(overflow)?;
    }

    Ok(value)
}

/// Formats base units as a decimal string, trimming trailing zeros.
#[must_use]
pub fn format_units(value: u128, decimals: u8) -> String {
    let (whole, fraction) = match 10u128.checked_pow(u32::from(decimals)) {
        Some(scale) => (value / scale, value % scale),
        // the scale exceeds u128, so every value is below one whole unit
        None => (0, value),
    };
    if fraction == 0 {
        return whole.to_string();
    }

    let fraction = format!("{fraction:0width$}", width = usize::from(decimals));
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_amounts() {
        assert_eq!(parse_units("80", 6), Ok(80_000_000));
        assert_eq!(parse_units("1", 18), Ok(1_000_000_000_000_000_000));
    }

    #[test]
    fn parses_fractional_amounts() {
        assert_eq!(parse_units("0.25", 6), Ok(250_000));
        assert_eq!(parse_units(".5", 2), Ok(50));
        assert_eq!(parse_units("3.", 2), Ok(300));
    }

    #[test]
    fn ignores_surrounding_whitespace_and_trailing_zeros() {
        assert_eq!(parse_units(" 1.500000000 ", 6), Ok(1_500_000));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_units("", 6), Err(UnitsError::Empty)));
        assert!(matches!(
            parse_units("12a", 6),
            Err(UnitsError::InvalidDigit { .. })
        ));
        assert!(matches!(
            parse_units("-1", 6),
            Err(UnitsError::InvalidDigit { .. })
        ));
        assert!(matches!(
            parse_units(".", 6),
            Err(UnitsError::InvalidDigit { .. })
        ));
        assert!(matches!(
            parse_units("1.2.3", 6),
            Err(UnitsError::InvalidDigit { .. })
        ));
    }

    #[test]
    fn rejects_excess_precision() {
        let err = parse_units("0.0000001", 6).unwrap_err();
        assert_eq!(
            err,
            UnitsError::TooPrecise {
                input: "0.0000001".to_string(),
                decimals: 6
            }
        );
    }

    #[test]
    fn rejects_overflow() {
        let huge = "9".repeat(40);
        assert!(matches!(
            parse_units(&huge, 18),
            Err(UnitsError::Overflow { .. })
        ));
    }

    #[test]
    fn formats_units() {
        assert_eq!(format_units(80_000_000, 6), "80");
        assert_eq!(format_units(250_000, 6), "0.25");
        assert_eq!(format_units(1_000_000_000_000_000_001, 18), "1.000000000000000001");
        assert_eq!(format_units(0, 18), "0");
    }

    #[test]
    fn formats_units_beyond_u128_scale() {
        assert_eq!(format_units(1, 40), format!("0.{}1", "0".repeat(39)));
        assert_eq!(format_units(0, 40), "0");
        assert_eq!(format_units(u128::MAX, 39), format!("0.{}", u128::MAX));
    }
}
