//! # Fixed-point currency arithmetic
//!
//! "all monetary math in contracts uses a decimal fixed-point
//! library with user-selectable precision; no binary floating point." Every
//! operation here takes and returns decimal strings so a contract never
//! round-trips through a JS `number` (an IEEE-754 double) for a balance.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a decimal string, rejecting anything that isn't a finite base-10
/// number — in particular, JS `NaN`/`Infinity` string forms are rejected.
fn parse(value: &str) -> Result<Decimal, String> {
    Decimal::from_str(value).map_err(|_| format!("invalid decimal: {value}"))
}

/// Round `value` to `precision` fractional digits, rounding half away from
/// zero (matches the reference library's `toFixed` convention).
pub fn to_fixed(value: &str, precision: u32) -> Result<String, String> {
    let decimal = parse(value)?;
    Ok(decimal.round_dp(precision).to_string())
}

/// `a + b`, rounded to `precision`.
pub fn add(a: &str, b: &str, precision: u32) -> Result<String, String> {
    let result = parse(a)? + parse(b)?;
    Ok(result.round_dp(precision).to_string())
}

/// `a - b`, rounded to `precision`.
pub fn subtract(a: &str, b: &str, precision: u32) -> Result<String, String> {
    let result = parse(a)? - parse(b)?;
    Ok(result.round_dp(precision).to_string())
}

/// `a * b`, rounded to `precision`.
pub fn multiply(a: &str, b: &str, precision: u32) -> Result<String, String> {
    let result = parse(a)? * parse(b)?;
    Ok(result.round_dp(precision).to_string())
}

/// `a / b`, rounded to `precision`. Division by zero is an error, not an
/// `Infinity`/`NaN` value.
pub fn divide(a: &str, b: &str, precision: u32) -> Result<String, String> {
    let divisor = parse(b)?;
    if divisor.is_zero() {
        return Err("division by zero".to_string());
    }
    let result = parse(a)? / divisor;
    Ok(result.round_dp(precision).to_string())
}

/// `true` iff `a` and `b` are numerically equal at full precision (not
/// merely string-equal — `"1.0"` and `"1"` compare equal).
pub fn equals(a: &str, b: &str) -> Result<bool, String> {
    Ok(parse(a)? == parse(b)?)
}

/// `true` iff `a > b`.
pub fn greater_than(a: &str, b: &str) -> Result<bool, String> {
    Ok(parse(a)? > parse(b)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_rounds_to_precision() {
        assert_eq!(add("1.2345", "0.0001", 3).unwrap(), "1.235");
    }

    #[test]
    fn divide_by_zero_errors() {
        assert!(divide("1", "0", 3).is_err());
    }

    #[test]
    fn equals_ignores_trailing_zero_formatting() {
        assert!(equals("1.0", "1").unwrap());
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert!(add("not-a-number", "1", 3).is_err());
    }

    #[test]
    fn no_binary_float_drift_across_many_additions() {
        let mut total = "0".to_string();
        for _ in 0..10 {
            total = add(&total, "0.1", 8).unwrap();
        }
        assert_eq!(total, "1");
    }
}
