//! Exchange rate snapshots as returned by a price feed.

use std::collections::HashMap;

/// Fiat-per-unit rates for one base asset, keyed by uppercase currency code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExchangeRate {
    rates: HashMap<String, f64>,
    changes_24h: HashMap<String, f64>,
}

impl ExchangeRate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from `(code, rate)` pairs.
    pub fn from_rates<I, S>(rates: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut snapshot = Self::new();
        for (code, rate) in rates {
            snapshot.insert(code.as_ref(), rate);
        }
        snapshot
    }

    pub fn insert(&mut self, code: &str, rate: f64) {
        self.rates.insert(code.trim().to_uppercase(), rate);
    }

    pub fn insert_change(&mut self, code: &str, change_pct: f64) {
        self.changes_24h.insert(code.trim().to_uppercase(), change_pct);
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(&code.trim().to_uppercase()).copied()
    }

    /// 24h change in percent, when the feed was asked for it.
    pub fn change_24h(&self, code: &str) -> Option<f64> {
        self.changes_24h.get(&code.trim().to_uppercase()).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Rates for several base assets, keyed by asset id (e.g. `bitcoin`).
pub type PriceTable = HashMap<String, ExchangeRate>;
