//! Price feed abstraction

use crate::core::rates::PriceTable;
use anyhow::Result;
use async_trait::async_trait;

/// One request to a price feed: every asset priced in every currency.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedQuery {
    pub assets: Vec<String>,
    pub currencies: Vec<String>,
    pub include_24h_change: bool,
}

impl FeedQuery {
    pub fn new<A, C>(assets: A, currencies: C) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            assets: assets.into_iter().map(Into::into).collect(),
            currencies: currencies.into_iter().map(Into::into).collect(),
            include_24h_change: false,
        }
    }

    pub fn with_24h_change(mut self) -> Self {
        self.include_24h_change = true;
        self
    }
}

/// Source of exchange rates.
///
/// Implementations return either a table with every requested asset and
/// currency, or an error. Partial tables are never returned.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn fetch_rates(&self, query: &FeedQuery) -> Result<PriceTable>;
}
