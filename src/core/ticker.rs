//! Live price tickers for the dashboard.

use crate::core::price::{FeedQuery, PriceFeed};
use anyhow::{Result, anyhow};
use tracing::instrument;

pub const DEFAULT_ASSETS: [&str; 4] = ["bitcoin", "ethereum", "binancecoin", "solana"];

#[derive(Debug, Clone, PartialEq)]
pub struct TickerQuote {
    pub asset: String,
    pub label: String,
    pub price: f64,
    pub change_24h: Option<f64>,
}

/// Short ticker label for a feed asset id.
pub fn label_for(asset: &str) -> String {
    match asset {
        "bitcoin" => "BTC".to_string(),
        "ethereum" => "ETH".to_string(),
        "binancecoin" => "BNB".to_string(),
        "solana" => "SOL".to_string(),
        other => other.to_uppercase(),
    }
}

/// Fetches one quote per asset, in the order given, with a single request.
#[instrument(skip(feed))]
pub async fn fetch_quotes(
    feed: &dyn PriceFeed,
    assets: &[String],
    currency: &str,
) -> Result<Vec<TickerQuote>> {
    let query = FeedQuery::new(assets.iter().cloned(), [currency.to_string()]).with_24h_change();
    let table = feed.fetch_rates(&query).await?;

    assets
        .iter()
        .map(|asset| {
            let rates = table
                .get(&asset.to_lowercase())
                .ok_or_else(|| anyhow!("No quote for asset: {}", asset))?;
            let price = rates
                .get(currency)
                .ok_or_else(|| anyhow!("No {} price for asset: {}", currency, asset))?;
            Ok(TickerQuote {
                asset: asset.clone(),
                label: label_for(&asset.to_lowercase()),
                price,
                change_24h: rates.change_24h(currency),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::{ExchangeRate, PriceTable};
    use async_trait::async_trait;

    struct StaticFeed;

    #[async_trait]
    impl PriceFeed for StaticFeed {
        async fn fetch_rates(&self, query: &FeedQuery) -> Result<PriceTable> {
            assert!(query.include_24h_change);
            Ok(query
                .assets
                .iter()
                .enumerate()
                .filter(|(_, asset)| asset.as_str() != "dogecoin")
                .map(|(i, asset)| {
                    let mut rates = ExchangeRate::from_rates([("USD", 100.0 * (i + 1) as f64)]);
                    rates.insert_change("USD", i as f64 - 1.0);
                    (asset.clone(), rates)
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_quotes_follow_request_order() {
        let assets: Vec<String> = DEFAULT_ASSETS.iter().map(|a| a.to_string()).collect();
        let quotes = fetch_quotes(&StaticFeed, &assets, "USD").await.unwrap();
        let labels: Vec<&str> = quotes.iter().map(|q| q.label.as_str()).collect();
        assert_eq!(labels, vec!["BTC", "ETH", "BNB", "SOL"]);
        assert_eq!(quotes[2].price, 300.0);
        assert_eq!(quotes[0].change_24h, Some(-1.0));
    }

    #[tokio::test]
    async fn test_missing_asset_fails_whole_fetch() {
        let assets = vec!["bitcoin".to_string(), "dogecoin".to_string()];
        let result = fetch_quotes(&StaticFeed, &assets, "USD").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No quote for asset: dogecoin"
        );
    }

    #[test]
    fn test_label_for_unknown_asset() {
        assert_eq!(label_for("cardano"), "CARDANO");
    }
}
