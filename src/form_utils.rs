//! Serde helpers and parsers for HTML form input.
//!
//! HTML `<select>` elements with an empty `<option value="">` send an empty
//! string for the field, which `serde_urlencoded` cannot parse as an integer.
//! These helpers treat empty strings as `None`.
use serde::{Deserialize, Deserializer};

use crate::error::AppError;

pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
    }
}

pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
}

/// Checkboxes are only submitted when ticked, with any value.
pub fn deserialize_checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(matches!(
        s.as_deref(),
        Some("on") | Some("true") | Some("1") | Some("yes")
    ))
}

/// Largest amount a form may submit, in minor units.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;

/// Parse a decimal money amount ("120", "99.5", "1,250.00") into minor units.
///
/// Rounds half away from zero on the third decimal place. Rejects empty,
/// non-numeric, negative and oversized input.
pub fn parse_amount_cents(input: &str, field: &str) -> Result<i64, AppError> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }

    let (negative, unsigned) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(AppError::Validation(format!("{} must be a number", field)));
    }
    if negative {
        return Err(AppError::Validation(format!("{} cannot be negative", field)));
    }

    let too_large = || AppError::Validation(format!("{} is too large", field));
    let whole: i64 = match whole {
        "" => 0,
        digits => digits.parse().map_err(|_| too_large())?,
    };

    let mut places = fraction.bytes().map(|b| i64::from(b - b'0'));
    let tenths = places.next().unwrap_or(0);
    let hundredths = places.next().unwrap_or(0);
    let round_up = places.next().is_some_and(|d| d >= 5);

    whole
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
        .filter(|cents| *cents <= MAX_AMOUNT_CENTS)
        .ok_or_else(too_large)
}

/// Require a non-blank text field, returning it trimmed.
pub fn require_text(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_and_fractional_amounts() {
        assert_eq!(parse_amount_cents("120", "Amount").unwrap(), 12000);
        assert_eq!(parse_amount_cents("99.5", "Amount").unwrap(), 9950);
        assert_eq!(parse_amount_cents(" 1,250.00 ", "Amount").unwrap(), 125000);
        assert_eq!(parse_amount_cents(".75", "Amount").unwrap(), 75);
        // third decimal rounds half away from zero
        assert_eq!(parse_amount_cents("1.005", "Amount").unwrap(), 101);
        assert_eq!(parse_amount_cents("0.285", "Amount").unwrap(), 29);
        assert_eq!(parse_amount_cents("0.2849", "Amount").unwrap(), 28);
        assert_eq!(parse_amount_cents("9.999", "Amount").unwrap(), 1000);
    }

    #[test]
    fn test_parse_enforces_ceiling() {
        assert_eq!(
            parse_amount_cents("10000000000", "Amount").unwrap(),
            MAX_AMOUNT_CENTS
        );
        for huge in [
            "10000000000.01",
            "92233720368547758.07",
            "99999999999999999999999",
        ] {
            let err = parse_amount_cents(huge, "Amount").unwrap_err();
            assert!(err.to_string().contains("too large"), "{:?}", huge);
        }
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for bad in ["", "   ", "abc", "12..5", "-5", "NaN", "inf", ".", "+5", "1e3", "1.2.3"] {
            assert!(
                matches!(parse_amount_cents(bad, "Amount"), Err(AppError::Validation(_))),
                "expected validation error for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("  Paneer Tikka ", "Name").unwrap(), "Paneer Tikka");
        assert!(require_text(" \t", "Name").is_err());
    }
}
