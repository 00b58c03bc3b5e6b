use crate::core::price::{FeedQuery, PriceFeed};
use crate::core::rates::{ExchangeRate, PriceTable};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// `{ asset: { "usd": 45000.0, "usd_24h_change": -1.2, ... } }`
#[derive(Deserialize, Debug)]
#[serde(transparent)]
struct SimplePriceResponse {
    assets: HashMap<String, HashMap<String, Option<f64>>>,
}

// CoinGeckoProvider implementation for PriceFeed
pub struct CoinGeckoProvider {
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str) -> Self {
        CoinGeckoProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Turns the raw response into a table. Any requested asset or currency
/// missing from the response fails the whole conversion.
fn into_price_table(response: SimplePriceResponse, query: &FeedQuery) -> Result<PriceTable> {
    let mut table = PriceTable::new();

    for asset in &query.assets {
        let key = asset.to_lowercase();
        let quotes = response
            .assets
            .get(&key)
            .ok_or_else(|| anyhow!("No price data found for asset: {}", asset))?;

        let mut rates = ExchangeRate::new();
        for currency in &query.currencies {
            let code = currency.to_lowercase();
            let rate = quotes
                .get(&code)
                .copied()
                .flatten()
                .filter(|r| r.is_finite())
                .ok_or_else(|| anyhow!("Incomplete price data: no {} rate for {}", code, asset))?;
            rates.insert(&code, rate);

            if query.include_24h_change {
                if let Some(change) = quotes.get(&format!("{code}_24h_change")).copied().flatten() {
                    rates.insert_change(&code, change);
                }
            }
        }
        table.insert(key, rates);
    }

    Ok(table)
}

#[async_trait]
impl PriceFeed for CoinGeckoProvider {
    #[instrument(
        name = "CoinGeckoPriceFetch",
        skip(self, query),
        fields(assets = ?query.assets)
    )]
    async fn fetch_rates(&self, query: &FeedQuery) -> Result<PriceTable> {
        let ids = query
            .assets
            .iter()
            .map(|a| a.to_lowercase())
            .collect::<Vec<_>>()
            .join(",");
        let vs_currencies = query
            .currencies
            .iter()
            .map(|c| c.to_lowercase())
            .collect::<Vec<_>>()
            .join(",");

        let url = format!("{}/api/v3/simple/price", self.base_url);
        let mut params = vec![("ids", ids.clone()), ("vs_currencies", vs_currencies)];
        if query.include_24h_change {
            params.push(("include_24hr_change", "true".to_string()));
        }
        debug!("Requesting prices from {} for {}", url, ids);

        let client = reqwest::Client::builder().user_agent("satcalc/0.1").build()?;
        let response = client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for assets: {} URL: {}", e, ids, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for assets: {}",
                response.status(),
                ids
            ));
        }

        let text = response.text().await?;
        let data: SimplePriceResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", ids, e))?;

        into_price_table(data, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(ids: &str, status: u16, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/simple/price"))
            .and(query_param("ids", ids))
            .respond_with(ResponseTemplate::new(status).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let mock_response = r#"{
            "bitcoin": { "usd": 45000.0, "jpy": 6500000, "eur": 41000.5 }
        }"#;
        let mock_server = create_mock_server("bitcoin", 200, mock_response).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let query = FeedQuery::new(["bitcoin"], ["USD", "JPY", "EUR"]);
        let table = provider.fetch_rates(&query).await.unwrap();

        let rates = &table["bitcoin"];
        assert_eq!(rates.len(), 3);
        assert_eq!(rates.get("USD"), Some(45000.0));
        assert_eq!(rates.get("JPY"), Some(6_500_000.0));
        assert_eq!(rates.get("EUR"), Some(41000.5));
        assert_eq!(rates.change_24h("USD"), None);
    }

    #[tokio::test]
    async fn test_fetch_with_24h_change() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/simple/price"))
            .and(query_param("ids", "bitcoin,ethereum"))
            .and(query_param("vs_currencies", "usd"))
            .and(query_param("include_24hr_change", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{
                    "bitcoin": { "usd": 45000.0, "usd_24h_change": -1.5 },
                    "ethereum": { "usd": 3000.0, "usd_24h_change": null }
                }"#,
            ))
            .mount(&mock_server)
            .await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let query = FeedQuery::new(["bitcoin", "ethereum"], ["USD"]).with_24h_change();
        let table = provider.fetch_rates(&query).await.unwrap();

        assert_eq!(table["bitcoin"].change_24h("USD"), Some(-1.5));
        assert_eq!(table["ethereum"].get("USD"), Some(3000.0));
        assert_eq!(table["ethereum"].change_24h("USD"), None);
    }

    #[tokio::test]
    async fn test_partial_currency_list_is_rejected() {
        let mock_response = r#"{ "bitcoin": { "usd": 45000.0 } }"#;
        let mock_server = create_mock_server("bitcoin", 200, mock_response).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let query = FeedQuery::new(["bitcoin"], ["USD", "KRW"]);
        let result = provider.fetch_rates(&query).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Incomplete price data: no krw rate for bitcoin"
        );
    }

    #[tokio::test]
    async fn test_missing_asset_is_rejected() {
        let mock_server = create_mock_server("bitcoin", 200, "{}").await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let query = FeedQuery::new(["bitcoin"], ["USD"]);
        let result = provider.fetch_rates(&query).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No price data found for asset: bitcoin"
        );
    }

    #[tokio::test]
    async fn test_api_error_response() {
        let mock_server = create_mock_server("bitcoin", 429, "").await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let query = FeedQuery::new(["bitcoin"], ["USD"]);
        let result = provider.fetch_rates(&query).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 429 Too Many Requests for assets: bitcoin"
        );
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_response = r#"{ "bitcoin": [45000] }"#;
        let mock_server = create_mock_server("bitcoin", 200, mock_response).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let query = FeedQuery::new(["bitcoin"], ["USD"]);
        let result = provider.fetch_rates(&query).await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for bitcoin")
        );
    }
}
