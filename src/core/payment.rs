//! Verifies that an address has received at least a minimum USD value.

use crate::core::price::{FeedQuery, PriceFeed};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, instrument};

pub const SATOSHIS_PER_BTC: f64 = 100_000_000.0;

/// Source of on-chain address totals.
#[async_trait]
pub trait AddressProvider: Send + Sync {
    /// Total satoshis ever received by `address`.
    async fn total_received(&self, address: &str) -> Result<u64>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentStatus {
    Confirmed {
        received_btc: f64,
        received_usd: f64,
    },
    Insufficient {
        received_btc: f64,
        received_usd: f64,
        min_usd: f64,
    },
}

impl PaymentStatus {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, PaymentStatus::Confirmed { .. })
    }

    pub fn received_usd(&self) -> f64 {
        match self {
            PaymentStatus::Confirmed { received_usd, .. }
            | PaymentStatus::Insufficient { received_usd, .. } => *received_usd,
        }
    }
}

#[instrument(skip(addresses, feed))]
pub async fn check_payment(
    address: &str,
    min_usd: f64,
    addresses: &dyn AddressProvider,
    feed: &dyn PriceFeed,
) -> Result<PaymentStatus> {
    let satoshis = addresses.total_received(address).await?;
    let received_btc = satoshis as f64 / SATOSHIS_PER_BTC;

    let query = FeedQuery::new(["bitcoin"], ["USD"]);
    let btc_usd = feed
        .fetch_rates(&query)
        .await?
        .get("bitcoin")
        .and_then(|rates| rates.get("USD"))
        .context("No BTC/USD rate in price feed response")?;

    let received_usd = received_btc * btc_usd;
    debug!(received_btc, received_usd, "Computed received value");

    if received_usd >= min_usd {
        Ok(PaymentStatus::Confirmed {
            received_btc,
            received_usd,
        })
    } else {
        Ok(PaymentStatus::Insufficient {
            received_btc,
            received_usd,
            min_usd,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::{ExchangeRate, PriceTable};
    use anyhow::anyhow;

    struct FixedAddress(Result<u64, String>);

    #[async_trait]
    impl AddressProvider for FixedAddress {
        async fn total_received(&self, _address: &str) -> Result<u64> {
            self.0.clone().map_err(|e| anyhow!(e))
        }
    }

    struct FixedFeed(f64);

    #[async_trait]
    impl PriceFeed for FixedFeed {
        async fn fetch_rates(&self, _query: &FeedQuery) -> Result<PriceTable> {
            let mut table = PriceTable::new();
            table.insert(
                "bitcoin".to_string(),
                ExchangeRate::from_rates([("USD", self.0)]),
            );
            Ok(table)
        }
    }

    #[tokio::test]
    async fn test_payment_confirmed_at_minimum() {
        // 0.02 BTC at 50,000 USD is exactly 1,000 USD.
        let status = check_payment("addr", 1000.0, &FixedAddress(Ok(2_000_000)), &FixedFeed(50000.0))
            .await
            .unwrap();
        assert!(status.is_confirmed());
        assert_eq!(status.received_usd(), 1000.0);
    }

    #[tokio::test]
    async fn test_payment_insufficient() {
        let status = check_payment("addr", 1000.0, &FixedAddress(Ok(1_000_000)), &FixedFeed(50000.0))
            .await
            .unwrap();
        assert_eq!(
            status,
            PaymentStatus::Insufficient {
                received_btc: 0.01,
                received_usd: 500.0,
                min_usd: 1000.0,
            }
        );
    }

    #[tokio::test]
    async fn test_address_failure_propagates() {
        let result = check_payment(
            "addr",
            1000.0,
            &FixedAddress(Err("HTTP error: 404".to_string())),
            &FixedFeed(50000.0),
        )
        .await;
        assert_eq!(result.unwrap_err().to_string(), "HTTP error: 404");
    }
}
