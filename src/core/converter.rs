//! Stateful calculator that keeps a quantity field and a value field in
//! step under the latest exchange rate snapshot.

use crate::core::convert::{self, format_quantity, parse_quantity};
use crate::core::currency;
use crate::core::price::{FeedQuery, PriceFeed};
use crate::core::rates::{ExchangeRate, PriceTable};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Shown in place of the value while a failed refresh is being reported.
pub const ERROR_MESSAGE: &str = "Error loading data";

/// How long a failed refresh keeps the value field in the alert state.
pub const ERROR_DISPLAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStyle {
    Normal,
    Alert,
}

/// Inputs the converter reacts to. Each maps to a single conversion.
#[derive(Debug)]
pub enum ConverterEvent {
    QuantityChanged(String),
    ValueChanged(String),
    CurrencyChanged(String),
    RefreshTick(Result<PriceTable>),
}

#[derive(Debug)]
pub struct Converter {
    asset: String,
    currency: String,
    quantity: f64,
    quantity_field: String,
    value_field: String,
    rates: Arc<ExchangeRate>,
    last_updated: Option<DateTime<Local>>,
    error_since: Option<Instant>,
}

impl Converter {
    pub fn new(asset: &str, currency: &str) -> Self {
        Self {
            asset: asset.trim().to_lowercase(),
            currency: currency.trim().to_uppercase(),
            quantity: 0.0,
            quantity_field: String::new(),
            value_field: String::new(),
            rates: Arc::new(ExchangeRate::new()),
            last_updated: None,
            error_since: None,
        }
    }

    /// Query covering every supported currency for this converter's asset.
    pub fn feed_query(&self) -> FeedQuery {
        FeedQuery::new([self.asset.clone()], currency::codes())
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn quantity_field(&self) -> &str {
        &self.quantity_field
    }

    /// Last converted value, regardless of any error being reported.
    pub fn value_field(&self) -> &str {
        &self.value_field
    }

    pub fn rates(&self) -> Arc<ExchangeRate> {
        Arc::clone(&self.rates)
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    pub fn last_updated_label(&self) -> Option<String> {
        self.last_updated
            .map(|ts| ts.format("%H:%M:%S %:z").to_string())
    }

    pub fn handle(&mut self, event: ConverterEvent, now: Instant) {
        match event {
            ConverterEvent::QuantityChanged(text) => self.on_quantity_changed(&text),
            ConverterEvent::ValueChanged(text) => self.on_value_changed(&text),
            ConverterEvent::CurrencyChanged(code) => self.on_currency_changed(&code),
            ConverterEvent::RefreshTick(result) => {
                self.on_refresh_tick(result, now);
            }
        }
    }

    pub fn on_quantity_changed(&mut self, text: &str) {
        self.quantity_field = text.to_string();
        self.quantity = parse_quantity(text);
        self.recalculate();
    }

    /// Updates the quantity from an edited value. Never touches the value
    /// field beyond storing the user's text.
    pub fn on_value_changed(&mut self, text: &str) {
        self.value_field = text.to_string();
        match convert::reverse(text, &self.currency, &self.rates) {
            Ok(quantity) => {
                self.quantity = parse_quantity(&quantity);
                self.quantity_field = quantity;
            }
            Err(e) => debug!(error = %e, "Reverse conversion skipped"),
        }
    }

    pub fn on_currency_changed(&mut self, code: &str) {
        self.currency = code.trim().to_uppercase();
        self.recalculate();
    }

    /// Applies a feed result. The snapshot is replaced only when the table
    /// carries rates for this converter's asset. Returns whether it was.
    pub fn on_refresh_tick(&mut self, result: Result<PriceTable>, now: Instant) -> bool {
        let snapshot = result.and_then(|mut table| {
            table
                .remove(&self.asset)
                .ok_or_else(|| anyhow!("No rates for asset: {}", self.asset))
        });

        match snapshot {
            Ok(rates) => {
                info!(asset = %self.asset, currencies = rates.len(), "Exchange rates refreshed");
                self.rates = Arc::new(rates);
                self.last_updated = Some(Local::now());
                self.error_since = None;
                self.recalculate();
                true
            }
            Err(e) => {
                warn!(error = %e, "Price feed unavailable, keeping previous rates");
                self.error_since = Some(now);
                false
            }
        }
    }

    /// Queries the feed right away and applies the result.
    pub async fn refresh(&mut self, feed: &dyn PriceFeed) -> bool {
        let result = feed.fetch_rates(&self.feed_query()).await;
        self.on_refresh_tick(result, Instant::now())
    }

    /// Replaces the authoritative quantity outright.
    pub fn set_base_quantity(&mut self, amount: f64) {
        self.quantity = amount;
        self.quantity_field = format_quantity(amount);
        self.recalculate();
    }

    pub fn error_active(&self, now: Instant) -> bool {
        self.error_since
            .is_some_and(|since| now.saturating_duration_since(since) < ERROR_DISPLAY)
    }

    pub fn displayed_value(&self, now: Instant) -> &str {
        if self.error_active(now) {
            ERROR_MESSAGE
        } else {
            &self.value_field
        }
    }

    pub fn value_style(&self, now: Instant) -> FieldStyle {
        if self.error_active(now) {
            FieldStyle::Alert
        } else {
            FieldStyle::Normal
        }
    }

    fn recalculate(&mut self) {
        match convert::forward(self.quantity, &self.currency, &self.rates) {
            Ok(value) => self.value_field = value,
            Err(e) => debug!(error = %e, "Forward conversion skipped"),
        }
    }
}
