//! Display metadata for the supported fiat currencies.

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyMeta {
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
    /// Displayed without fractional sub-units (e.g. JPY, KRW).
    pub zero_decimal: bool,
}

impl Display for CurrencyMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code, self.name)
    }
}

const fn meta(
    code: &'static str,
    symbol: &'static str,
    name: &'static str,
    zero_decimal: bool,
) -> CurrencyMeta {
    CurrencyMeta {
        code,
        symbol,
        name,
        zero_decimal,
    }
}

pub const CURRENCIES: [CurrencyMeta; 12] = [
    meta("USD", "$", "US Dollar", false),
    meta("EUR", "€", "Euro", false),
    meta("GBP", "£", "British Pound", false),
    meta("JPY", "¥", "Japanese Yen", true),
    meta("AUD", "A$", "Australian Dollar", false),
    meta("CAD", "C$", "Canadian Dollar", false),
    meta("CHF", "CHF", "Swiss Franc", false),
    meta("CNY", "¥", "Chinese Yuan", false),
    meta("INR", "₹", "Indian Rupee", false),
    meta("KRW", "₩", "South Korean Won", true),
    meta("NGN", "₦", "Nigerian Naira", false),
    meta("ZAR", "R", "South African Rand", false),
];

/// Looks up a currency by code, ignoring case.
pub fn lookup(code: &str) -> Option<&'static CurrencyMeta> {
    CURRENCIES
        .iter()
        .find(|meta| meta.code.eq_ignore_ascii_case(code.trim()))
}

/// All supported codes, in display order.
pub fn codes() -> Vec<String> {
    CURRENCIES.iter().map(|meta| meta.code.to_string()).collect()
}
