use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::RawCell;

/// Characters dropped from amount text before parsing.
///
/// Parentheses are removed without flipping the sign: "(55,662)" normalizes to 55662.
const STRIPPED: &[char] = &['(', ')', ',', '$', '€', '£', '¥'];

/// Result of normalizing one amount cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amount {
    Value(i64),
    NotANumber,
}

/// Convert a raw cell into a whole-unit amount, rounding half away from zero.
pub fn normalize(cell: &RawCell) -> Amount {
    match cell {
        RawCell::Empty => Amount::Value(0),
        RawCell::Number(n) => round_float(*n),
        RawCell::Text(s) => normalize_str(s),
    }
}

pub fn normalize_str(raw: &str) -> Amount {
    let cleaned: String = raw.chars().filter(|c| !STRIPPED.contains(c)).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Amount::Value(0);
    }
    let parsed = Decimal::from_str(cleaned).or_else(|_| Decimal::from_scientific(cleaned));
    match parsed {
        Ok(d) => d
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map_or(Amount::NotANumber, Amount::Value),
        Err(_) => Amount::NotANumber,
    }
}

fn round_float(n: f64) -> Amount {
    if !n.is_finite() || n.abs() >= i64::MAX as f64 {
        return Amount::NotANumber;
    }
    // f64::round is half away from zero, matching the text path.
    Amount::Value(n.round() as i64)
}
