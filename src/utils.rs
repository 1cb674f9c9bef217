// src/utils.rs
use ethers::types::U256;
use ethers::utils::parse_units;

use crate::errors::{DappError, DappResult};

/// Placeholder shown wherever an amount cannot be computed.
pub const ZERO_AMOUNT: &str = "0.0";

/// Largest scale whose power of ten still fits in a `U256`.
pub const MAX_DECIMALS: u8 = 77;

/// Accepts a reported token scale only if amounts at that scale can be
/// formatted.
pub fn checked_decimals(decimals: u8) -> DappResult<u8> {
    if decimals > MAX_DECIMALS {
        return Err(DappError::Binding(format!(
            "token reports {} decimals, at most {} are supported",
            decimals, MAX_DECIMALS
        )));
    }
    Ok(decimals)
}

/// Formats a fixed-point integer as a decimal string, keeping at most
/// `max_fraction` fractional digits (truncated) and dropping trailing zeros.
pub fn u256_to_human(value: U256, decimals: u8, max_fraction: usize) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let divisor = U256::exp10(decimals as usize);
    let integer = value / divisor;
    let mut fraction = format!("{:0>width$}", (value % divisor).to_string(), width = decimals as usize);
    fraction.truncate(max_fraction);
    while fraction.ends_with('0') {
        fraction.pop();
    }
    if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{}.{}", integer, fraction)
    }
}

/// Parses user-entered decimal text into a fixed-point integer.
pub fn human_to_u256(amount: &str, decimals: u8) -> DappResult<U256> {
    let trimmed = amount.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return Err(DappError::InvalidAmount(amount.to_string()));
    }
    let parsed = parse_units(trimmed, decimals as u32)
        .map_err(|_| DappError::InvalidAmount(amount.to_string()))?;
    let value: U256 = parsed.into();
    if value.is_zero() {
        return Err(DappError::InvalidAmount(amount.to_string()));
    }
    Ok(value)
}

/// Reads `raw` the way a browser coerces text to a number: surrounding
/// whitespace is ignored and empty text counts as zero.
pub fn numeric_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => None,
    }
}

pub fn is_positive_amount(raw: &str) -> bool {
    numeric_value(raw).is_some_and(|value| value > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_and_truncates_fraction() {
        let value = U256::from_dec_str("1234567890000000000").unwrap();
        assert_eq!(u256_to_human(value, 18, 18), "1.23456789");
        assert_eq!(u256_to_human(value, 18, 4), "1.2345");
        assert_eq!(u256_to_human(U256::exp10(18), 18, 4), "1");
        assert_eq!(u256_to_human(U256::from(5u64), 18, 18), "0.000000000000000005");
        assert_eq!(u256_to_human(U256::from(42u64), 0, 4), "42");
    }

    #[test]
    fn rejects_unrepresentable_decimals() {
        assert_eq!(checked_decimals(18).unwrap(), 18);
        assert_eq!(checked_decimals(MAX_DECIMALS).unwrap(), 77);
        assert_eq!(u256_to_human(U256::MAX, MAX_DECIMALS, 4), "1.1579");
        for decimals in [78, 200, u8::MAX] {
            assert!(matches!(checked_decimals(decimals), Err(DappError::Binding(_))), "{decimals}");
        }
    }

    #[test]
    fn parses_user_amounts() {
        assert_eq!(human_to_u256("1.5", 18).unwrap(), U256::from(15u64) * U256::exp10(17));
        assert_eq!(human_to_u256(" 10 ", 6).unwrap(), U256::from(10_000_000u64));
        assert!(human_to_u256("", 18).is_err());
        assert!(human_to_u256("-1", 18).is_err());
        assert!(human_to_u256("abc", 18).is_err());
        assert!(human_to_u256("0", 18).is_err());
    }

    #[test]
    fn positive_amount_follows_numeric_coercion() {
        for raw in ["10", " 2.5 ", "1e3", ".5"] {
            assert!(is_positive_amount(raw), "{raw}");
        }
        for raw in ["", "0", "-3", "abc", "NaN", "inf", "1,5"] {
            assert!(!is_positive_amount(raw), "{raw}");
        }
    }
}
