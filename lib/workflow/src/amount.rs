//! Amount strings as entered in the editor.
//!
//! An amount is one of:
//! - a decimal in human units (`"80"`, `"0.25"`)
//! - a percentage of the account's balance (`"50%"`)
//! - the keyword `"max"` for the whole position

use std::fmt;
use std::str::FromStr;
use vaultflow_core::{UnitsError, parse_units};

/// Basis points in one whole.
pub const BPS_SCALE: u128 = 10_000;

/// Error returned when an amount string cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountError {
    /// The rejected input.
    pub input: String,
    /// What was wrong with it.
    pub reason: String,
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid amount '{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for AmountError {}

/// A parsed amount, not yet tied to an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Amount {
    /// A decimal in human units, scaled once the asset's decimals are known.
    Exact(String),
    /// A share of the balance in basis points (`5000` is 50%).
    Percent(u128),
    /// The whole position.
    Max,
}

impl Amount {
    /// Scales an exact amount to base units.
    ///
    /// # Errors
    ///
    /// Returns an error for non-numeric input or more fractional digits than
    /// the asset has decimals.
    pub fn to_units(exact: &str, decimals: u8) -> Result<u128, AmountError> {
        parse_units(exact, decimals).map_err(|e| AmountError {
            input: exact.to_string(),
            reason: match e {
                UnitsError::TooPrecise { decimals, .. } => {
                    format!("more than {decimals} decimal places")
                }
                other => other.to_string(),
            },
        })
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = |reason: &str| AmountError {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid("empty"));
        }
        if trimmed.eq_ignore_ascii_case("max") {
            return Ok(Self::Max);
        }
        if let Some(percent) = trimmed.strip_suffix('%') {
            // two decimals of a percent are basis points
            let bps = parse_units(percent.trim(), 2).map_err(|e| invalid(&e.to_string()))?;
            if bps > BPS_SCALE {
                return Err(invalid("percentage above 100%"));
            }
            return Ok(Self::Percent(bps));
        }

        // Precision is checked later against the asset's decimals
        match parse_units(trimmed, 0) {
            Ok(_) | Err(UnitsError::TooPrecise { .. }) => Ok(Self::Exact(trimmed.to_string())),
            Err(e) => Err(invalid(&e.to_string())),
        }
    }
}

/// Returns `value * bps / 10_000`, rounding down.
///
/// Splits `value` so the intermediate product stays in range for any
/// realistic token amount.
#[must_use]
pub fn scale_bps(value: u128, bps: u128) -> Option<u128> {
    let whole = (value / BPS_SCALE).checked_mul(bps)?;
    let part = (value % BPS_SCALE).checked_mul(bps)? / BPS_SCALE;
    whole.checked_add(part)
}

/// Applies a slippage bound to a quote: `quote * keep_bps / 10_000`, rounding
/// down. `keep_bps` above 10 000 is clamped.
#[must_use]
pub fn min_amount_out(quote: u128, keep_bps: u128) -> u128 {
    let keep = keep_bps.min(BPS_SCALE);
    (quote / BPS_SCALE) * keep + (quote % BPS_SCALE) * keep / BPS_SCALE
}

/// Converts a slippage tolerance in percent to the basis points kept, so
/// 0.5% becomes 9950.
#[must_use]
pub fn slippage_keep_bps(slippage_percent: f64) -> Option<u128> {
    if !(0.0..100.0).contains(&slippage_percent) {
        return None;
    }
    let lost = (slippage_percent * 100.0).round() as u128;
    Some(BPS_SCALE - lost.min(BPS_SCALE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_form() {
        assert_eq!("80".parse::<Amount>().unwrap(), Amount::Exact("80".to_string()));
        assert_eq!(" 0.25 ".parse::<Amount>().unwrap(), Amount::Exact("0.25".to_string()));
        assert_eq!("50%".parse::<Amount>().unwrap(), Amount::Percent(5_000));
        assert_eq!("12.5 %".parse::<Amount>().unwrap(), Amount::Percent(1_250));
        assert_eq!("MAX".parse::<Amount>().unwrap(), Amount::Max);
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<Amount>().is_err());
        assert!("abc".parse::<Amount>().is_err());
        assert!("150%".parse::<Amount>().is_err());
        assert!("1.2.3".parse::<Amount>().is_err());
    }

    #[test]
    fn to_units_respects_decimals() {
        assert_eq!(Amount::to_units("80", 6).unwrap(), 80_000_000);
        let err = Amount::to_units("0.0000001", 6).unwrap_err();
        assert!(err.reason.contains("6 decimal places"));
    }

    #[test]
    fn scale_bps_rounds_down() {
        assert_eq!(scale_bps(1_000, 9_950), Some(995));
        assert_eq!(scale_bps(3, 5_000), Some(1));
        assert_eq!(scale_bps(10u128.pow(30), 20_000), Some(2 * 10u128.pow(30)));
    }

    #[test]
    fn min_amount_out_never_overflows() {
        assert_eq!(min_amount_out(3_000_000_000, 9_950), 2_985_000_000);
        assert_eq!(min_amount_out(u128::MAX, 10_000), u128::MAX);
        assert_eq!(min_amount_out(7, 20_000), 7);
    }

    #[test]
    fn slippage_to_bps() {
        assert_eq!(slippage_keep_bps(0.5), Some(9_950));
        assert_eq!(slippage_keep_bps(0.0), Some(10_000));
        assert_eq!(slippage_keep_bps(100.0), None);
        assert_eq!(slippage_keep_bps(-1.0), None);
        assert_eq!(slippage_keep_bps(f64::NAN), None);
    }
}
