//! Mock portfolio card derived from a base quantity and the live price.
//!
//! The split between available and in-order balances and the volume are
//! fixed decoration. Only the total and the daily P&L follow the market.

use crate::core::price::{FeedQuery, PriceFeed};
use anyhow::{Context, Result};
use tracing::{debug, warn};

pub const AVAILABLE_SHARE: f64 = 0.658;
pub const IN_ORDERS_SHARE: f64 = 0.342;
pub const VOLUME_SHARE: f64 = 0.15;

/// Price used when no quote was ever fetched.
pub const FALLBACK_PRICE: f64 = 45000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioValues {
    pub base_quantity: f64,
    pub price: f64,
    pub total_value: f64,
    pub available_balance: f64,
    pub in_orders: f64,
    pub daily_pnl: f64,
    pub volume_24h: f64,
    pub change_24h: f64,
}

impl PortfolioValues {
    pub fn calculate(base_quantity: f64, price: f64, change_24h: f64) -> Self {
        let total_value = base_quantity * price;
        Self {
            base_quantity,
            price,
            total_value,
            available_balance: total_value * AVAILABLE_SHARE,
            in_orders: total_value * IN_ORDERS_SHARE,
            daily_pnl: change_24h / 100.0 * total_value,
            volume_24h: total_value * VOLUME_SHARE,
            change_24h,
        }
    }
}

/// Tracks the last BTC/USD quote for the portfolio card.
#[derive(Debug, Default)]
pub struct PortfolioTracker {
    base_quantity: f64,
    last_price: Option<f64>,
    change_24h: f64,
}

impl PortfolioTracker {
    pub fn new(base_quantity: f64) -> Self {
        Self {
            base_quantity,
            ..Self::default()
        }
    }

    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    /// Fetches the latest quote. On failure the previous price is kept and
    /// the error is returned for logging only.
    pub async fn update(&mut self, feed: &dyn PriceFeed) -> Result<f64> {
        let query = FeedQuery::new(["bitcoin"], ["USD"]).with_24h_change();
        let fetched = feed.fetch_rates(&query).await.and_then(|table| {
            let rates = table.get("bitcoin").context("No bitcoin quote in response")?;
            let price = rates.get("USD").context("No USD price for bitcoin")?;
            Ok((price, rates.change_24h("USD").unwrap_or(0.0)))
        });

        match fetched {
            Ok((price, change)) => {
                if let Some(previous) = self.last_price {
                    let moved = (price - previous) / previous * 100.0;
                    debug!(price, moved, "BTC price update");
                }
                self.last_price = Some(price);
                self.change_24h = change;
                Ok(price)
            }
            Err(e) => {
                warn!(error = %e, "Error fetching bitcoin price, keeping last price");
                Err(e)
            }
        }
    }

    pub fn values(&self) -> PortfolioValues {
        PortfolioValues::calculate(
            self.base_quantity,
            self.last_price.unwrap_or(FALLBACK_PRICE),
            self.change_24h,
        )
    }
}
