//! Monetary rounding and display formatting.
//!
//! All monetary output uses half-up rounding (midpoint away from zero),
//! applied through `rust_decimal` to avoid binary floating point surprises
//! at the midpoint.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Round `value` to `dp` fractional digits, half-up.
///
/// Goes through `from_f64` (shortest round-trip representation) so that a
/// literal like 1.005 is treated as the midpoint it reads as, not as its
/// slightly-below binary expansion.
pub fn round_half_up(value: f64, dp: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Format with thousands separators and a fixed number of decimals,
/// e.g. `137250000.0` -> `"137,250,000.00"`.
pub fn format_thousands(value: f64, dp: usize) -> String {
    let rounded = round_half_up(value, dp as u32);
    let formatted = format!("{rounded:.dp$}");
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Settlement-currency display string, e.g. `"₦147,000.00"`.
pub fn format_ngn(value: f64) -> String {
    format!("\u{20a6}{}", format_thousands(value, 2))
}
