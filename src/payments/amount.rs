//! Charge amount normalization
//!
//! Callers send the amount either in major units (`32.8`) or in minor units
//! (`3280`). Integral values at or above [`MINOR_UNIT_THRESHOLD`] are read as
//! minor units. This misreads a genuine R$1000.00 sent as `1000`.

use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::types::decimal_from_json;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value as JsonValue;
use tracing::debug;

/// Smallest integral amount interpreted as minor units (centavos)
pub const MINOR_UNIT_THRESHOLD: i64 = 1000;

/// Normalize a caller-supplied amount to major units with two decimals.
pub fn normalize_amount(raw: &JsonValue) -> PaymentResult<Decimal> {
    let amount = match raw {
        JsonValue::Number(_) | JsonValue::String(_) => decimal_from_json(raw),
        _ => None,
    }
    .ok_or_else(|| unrepresentable(raw))?;

    if amount <= Decimal::ZERO {
        return Err(PaymentError::validation("must be > 0", "amount"));
    }

    let major = if amount.fract().is_zero() && amount >= Decimal::from(MINOR_UNIT_THRESHOLD) {
        let converted = amount / Decimal::ONE_HUNDRED;
        debug!(raw = %amount, normalized = %converted, "amount read as minor units");
        converted
    } else {
        amount
    };

    let mut rounded = major.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    if rounded.is_zero() {
        return Err(PaymentError::validation("must be > 0", "amount"));
    }

    Ok(rounded)
}

/// Why a value that `Decimal` cannot hold was refused.
fn unrepresentable(raw: &JsonValue) -> PaymentError {
    let float = match raw {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match float.filter(|f| f.is_finite()) {
        Some(f) if f <= 0.0 || f.abs() < 1.0 => PaymentError::validation("must be > 0", "amount"),
        Some(_) => PaymentError::validation("is out of range", "amount"),
        None => PaymentError::validation("must be a number", "amount"),
    }
}
