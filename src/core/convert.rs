//! Pure conversions between a base-asset quantity and its fiat value.
//!
//! [`forward`] and [`reverse`] never call each other. Each one produces the
//! text for exactly one field, so wiring them to separate input events
//! cannot create an update loop.

use crate::core::currency::{self, CurrencyMeta};
use crate::core::error::ConvertError;
use crate::core::rates::ExchangeRate;
use tracing::debug;

/// Fractional digits shown for the base asset (1 satoshi = 1e-8 BTC).
pub const QUANTITY_DECIMALS: usize = 8;

/// Converts `quantity` into the formatted value of `currency`.
///
/// Zero-decimal currencies are rounded to the nearest integer, the rest
/// to two fractional digits. The result carries the currency symbol.
pub fn forward(quantity: f64, currency: &str, rates: &ExchangeRate) -> Result<String, ConvertError> {
    let (meta, rate) = resolve(currency, rates)?;
    let value = quantity * rate;
    if !value.is_finite() {
        return Err(ConvertError::OutOfRange(meta.code.to_string()));
    }
    Ok(format_fiat(value, meta))
}

/// Converts a formatted fiat value back into a base-asset quantity with
/// eight fractional digits.
pub fn reverse(
    formatted_value: &str,
    currency: &str,
    rates: &ExchangeRate,
) -> Result<String, ConvertError> {
    let (meta, rate) = resolve(currency, rates)?;
    if rate <= 0.0 {
        return Err(ConvertError::NonPositiveRate {
            currency: meta.code.to_string(),
            rate,
        });
    }

    let quantity = parse_value(formatted_value) / rate;
    if !quantity.is_finite() {
        return Err(ConvertError::OutOfRange(meta.code.to_string()));
    }
    Ok(format_quantity(quantity))
}

fn resolve(currency: &str, rates: &ExchangeRate) -> Result<(&'static CurrencyMeta, f64), ConvertError> {
    let unsupported = || ConvertError::UnsupportedCurrency(currency.trim().to_uppercase());
    let meta = currency::lookup(currency).ok_or_else(unsupported)?;
    let rate = rates.get(meta.code).ok_or_else(unsupported)?;
    Ok((meta, rate))
}

/// Parses a quantity typed by the user. Blank or unparseable input is 0.
pub fn parse_quantity(text: &str) -> f64 {
    leading_float(text.trim()).unwrap_or_else(|| {
        debug!(input = %text, "Quantity not numeric, using 0");
        0.0
    })
}

/// Parses a fiat value that may carry symbols and thousands separators.
///
/// Everything except digits, `.` and `-` is dropped before parsing.
pub fn parse_value(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    leading_float(&cleaned).unwrap_or_else(|| {
        debug!(input = %text, "Value not numeric, using 0");
        0.0
    })
}

/// Longest numeric prefix of `text`, so "0.5btc" reads as 0.5.
///
/// Accepts an optional sign, digits with at most one `.`, and an optional
/// exponent. The prefix is found in a single pass.
fn leading_float(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let digits_end = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let sign_end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let mut end = digits_end(sign_end);
    let mut mantissa_digits = end - sign_end;
    if bytes.get(end) == Some(&b'.') {
        let fraction_end = digits_end(end + 1);
        mantissa_digits += fraction_end - end - 1;
        end = fraction_end;
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let exponent_end = digits_end(exponent);
        if exponent_end > exponent {
            end = exponent_end;
        }
    }

    text[..end].parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Formats an amount of fiat with its symbol and en-US digit grouping.
pub fn format_fiat(amount: f64, meta: &CurrencyMeta) -> String {
    let decimals = if meta.zero_decimal { 0 } else { 2 };
    format!("{}{}", meta.symbol, group_thousands(amount, decimals))
}

pub fn format_quantity(quantity: f64) -> String {
    format!("{:.*}", QUANTITY_DECIMALS, quantity)
}

/// Rounds to `decimals` places and inserts `,` between thousands.
pub fn group_thousands(amount: f64, decimals: usize) -> String {
    let scale = 10f64.powi(decimals as i32);
    let rounded = (amount.abs() * scale).round() / scale;
    let digits = format!("{:.*}", decimals, rounded);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits.as_str(), None),
    };

    let mut grouped = String::with_capacity(digits.len() + int_part.len() / 3 + 1);
    if amount < 0.0 && rounded > 0.0 {
        grouped.push('-');
    }
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(frac_part) = frac_part {
        grouped.push('.');
        grouped.push_str(frac_part);
    }
    grouped
}
