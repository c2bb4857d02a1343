//! Rounding and human-readable formatting.
//!
//! This is the only place values get rounded. Percentages arrive as
//! fractions and leave in percent-space with one decimal; counts and currency
//! leave as integers.

use serde::{Deserialize, Serialize};

/// How an element value is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    #[default]
    Count,
    Currency,
    Percentage,
    Decimal,
}

pub const CURRENCY_SYMBOL: &str = "€";

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    // no "-0.0" in output
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Numeric value as exposed in API responses.
pub fn display_value(value: f64, format: ValueFormat) -> f64 {
    match format {
        ValueFormat::Percentage => round_to(value * 100.0, 1),
        ValueFormat::Count | ValueFormat::Currency => round_to(value, 0),
        ValueFormat::Decimal => round_to(value, 2),
    }
}

/// Human-readable string for a raw value.
pub fn format_value(value: f64, format: ValueFormat) -> String {
    let shown = display_value(value, format);
    match format {
        ValueFormat::Percentage => format!("{:.1}%", shown),
        ValueFormat::Count => group_thousands(shown as i64),
        ValueFormat::Currency => format!("{}{}", CURRENCY_SYMBOL, group_thousands(shown as i64)),
        ValueFormat::Decimal => format!("{:.2}", shown),
    }
}

/// Signed percentage of a fraction, e.g. `0.25` -> `+25.0%`.
pub fn format_signed_percentage(fraction: f64) -> String {
    let shown = display_value(fraction, ValueFormat::Percentage);
    if shown > 0.0 {
        format!("+{:.1}%", shown)
    } else {
        format!("{:.1}%", shown)
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
