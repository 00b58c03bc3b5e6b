use crate::core::payment::AddressProvider;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

pub struct BlockCypherProvider {
    base_url: String,
}

impl BlockCypherProvider {
    pub fn new(base_url: &str) -> Self {
        BlockCypherProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddressResponse {
    /// Satoshis.
    total_received: u64,
}

#[async_trait]
impl AddressProvider for BlockCypherProvider {
    #[instrument(name = "BlockCypherAddressFetch", skip(self))]
    async fn total_received(&self, address: &str) -> Result<u64> {
        let address = address.trim();
        if address.is_empty() {
            return Err(anyhow!("No address given"));
        }

        let url = format!("{}/v1/btc/main/addrs/{}", self.base_url, address);
        debug!("Requesting address totals from {}", url);

        let client = reqwest::Client::builder().user_agent("satcalc/0.1").build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for address: {}", e, address))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for address: {}",
                response.status(),
                address
            ));
        }

        let text = response.text().await?;
        let data: AddressResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", address, e))?;

        Ok(data.total_received)
    }
}
