//! Conversion failures. All of them are recoverable: callers leave the
//! affected field untouched.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// No rate (or no display metadata) for the selected currency.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Rate is zero or negative, so the value cannot be divided back.
    #[error("Non-positive rate {rate} for currency: {currency}")]
    NonPositiveRate { currency: String, rate: f64 },

    /// The converted amount overflowed.
    #[error("Converted amount out of range for currency: {0}")]
    OutOfRange(String),
}
