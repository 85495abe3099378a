//! Field-level validation rules.
//!
//! Every rule appends its violations to a shared list instead of failing
//! fast, so callers can reject input all-or-nothing with one
//! [`ValidationError`](crate::error::ValidationError) naming each field.

use core::str::FromStr;

use rust_decimal::Decimal;

use crate::error::FieldError;

/// Largest purchase price a product can carry (9999999999.99, the widest
/// value the twelve-digit money columns hold).
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Largest margin percentage a product can carry (99999.99).
pub const MAX_PROFIT_MARGIN: Decimal = Decimal::from_parts(9_999_999, 0, 0, false, 2);

/// Reject an empty or non-uppercase name-like field.
///
/// Uppercase normalization is the caller's contract, not a transformation
/// this system performs: `"arroz"` is rejected, never folded to `"ARROZ"`.
pub fn require_uppercase(field: &'static str, value: &str, errors: &mut Vec<FieldError>) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "must not be empty"));
    } else if value != value.to_uppercase() {
        errors.push(FieldError::new(field, "must be uppercase"));
    }
}

/// Reject an empty or whitespace-only field.
pub fn require_non_empty(field: &'static str, value: &str, errors: &mut Vec<FieldError>) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "must not be empty"));
    }
}

/// Password contract: at least 8 characters, uppercase letters and digits
/// only. Both violations are reported when both apply.
pub fn require_password(field: &'static str, value: &str, errors: &mut Vec<FieldError>) {
    if value.chars().count() < 8 {
        errors.push(FieldError::new(field, "must be at least 8 characters"));
    }
    if !value.is_empty() && !value.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        errors.push(FieldError::new(
            field,
            "must contain only uppercase letters and digits",
        ));
    }
}

/// Parse a price field: non-empty, numeric, strictly positive, within
/// [`MAX_PRICE`] and at most two decimal places.
///
/// Returns `None` exactly when a violation was recorded.
pub fn parse_positive_decimal(
    field: &'static str,
    value: &str,
    errors: &mut Vec<FieldError>,
) -> Option<Decimal> {
    let raw = value.trim();
    if raw.is_empty() {
        errors.push(FieldError::new(field, "must not be empty"));
        return None;
    }
    let parsed = match Decimal::from_str(raw) {
        Ok(parsed) => parsed,
        Err(_) => {
            errors.push(FieldError::new(field, "must be a valid number"));
            return None;
        }
    };
    if parsed <= Decimal::ZERO {
        errors.push(FieldError::new(field, "must be greater than zero"));
        return None;
    }
    bounded_to_cents(field, parsed, MAX_PRICE, "must be at most 9999999999.99", errors)
}

/// Parse a margin percentage: numeric, non-negative, within
/// [`MAX_PROFIT_MARGIN`] and at most two decimal places.
///
/// Returns `None` exactly when a violation was recorded.
pub fn parse_margin(
    field: &'static str,
    value: &str,
    errors: &mut Vec<FieldError>,
) -> Option<Decimal> {
    let parsed = match Decimal::from_str(value.trim()) {
        Ok(parsed) => parsed,
        Err(_) => {
            errors.push(FieldError::new(field, "must be a valid number"));
            return None;
        }
    };
    if parsed < Decimal::ZERO {
        errors.push(FieldError::new(field, "must not be negative"));
        return None;
    }
    bounded_to_cents(field, parsed, MAX_PROFIT_MARGIN, "must be at most 99999.99", errors)
}

/// Money fields hold two decimal places and a bounded magnitude. Accepted
/// values are rescaled to cents so both store backends persist the exact
/// value validation saw.
fn bounded_to_cents(
    field: &'static str,
    parsed: Decimal,
    max: Decimal,
    too_large: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<Decimal> {
    let mut ok = true;
    if parsed > max {
        errors.push(FieldError::new(field, too_large));
        ok = false;
    }
    if parsed.normalize().scale() > 2 {
        errors.push(FieldError::new(field, "must have at most two decimal places"));
        ok = false;
    }
    if !ok {
        return None;
    }
    let mut value = parsed;
    value.rescale(2);
    Some(value)
}
