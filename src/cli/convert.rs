use super::ui;
use crate::core::currency::{self, CURRENCIES};
use crate::core::{Converter, PriceFeed};
use anyhow::{Result, bail};

/// Which field the user filled in.
#[derive(Debug, Clone)]
pub enum ConversionInput {
    Quantity(String),
    Value(String),
}

/// Loads rates and applies a single edit, returning the converter so the
/// caller can read both fields.
pub async fn convert_once(
    feed: &dyn PriceFeed,
    asset: &str,
    currency_code: &str,
    input: ConversionInput,
) -> Result<Converter> {
    if currency::lookup(currency_code).is_none() {
        bail!("Unsupported currency: {}", currency_code);
    }

    let mut converter = Converter::new(asset, currency_code);
    let pb = ui::new_spinner("Fetching current prices...");
    let loaded = converter.refresh(feed).await;
    pb.finish_and_clear();
    if !loaded {
        bail!("Unable to fetch current prices. Please try again later.");
    }

    match input {
        ConversionInput::Quantity(text) => converter.on_quantity_changed(&text),
        ConversionInput::Value(text) => converter.on_value_changed(&text),
    }
    Ok(converter)
}

pub async fn run(
    feed: &dyn PriceFeed,
    asset: &str,
    currency_code: &str,
    input: ConversionInput,
) -> Result<()> {
    let converter = convert_once(feed, asset, currency_code, input.clone()).await?;

    let (quantity, value) = match input {
        ConversionInput::Quantity(_) => (
            converter.quantity_field().to_string(),
            ui::style_text(converter.value_field(), ui::StyleType::Value),
        ),
        ConversionInput::Value(_) => (
            ui::style_text(converter.quantity_field(), ui::StyleType::Value),
            converter.value_field().to_string(),
        ),
    };
    println!(
        "{} {} = {} {}",
        quantity,
        ui::style_text(&crate::core::ticker::label_for(asset), ui::StyleType::Label),
        value,
        ui::style_text(converter.currency(), ui::StyleType::Subtle),
    );
    if let Some(updated) = converter.last_updated_label() {
        println!("{}", ui::style_text(&format!("Last updated: {updated}"), ui::StyleType::Subtle));
    }
    Ok(())
}

/// Prints the supported currencies.
pub fn run_currencies() {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Symbol"),
        ui::header_cell("Name"),
        ui::header_cell("Decimals"),
    ]);
    for meta in CURRENCIES.iter() {
        table.add_row(vec![
            meta.code,
            meta.symbol,
            meta.name,
            if meta.zero_decimal { "0" } else { "2" },
        ]);
    }
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::price::FeedQuery;
    use crate::core::rates::{ExchangeRate, PriceTable};
    use anyhow::anyhow;
    use async_trait::async_trait;

    struct StaticFeed(Option<PriceTable>);

    #[async_trait]
    impl PriceFeed for StaticFeed {
        async fn fetch_rates(&self, _query: &FeedQuery) -> Result<PriceTable> {
            self.0.clone().ok_or_else(|| anyhow!("HTTP error: 503"))
        }
    }

    fn feed() -> StaticFeed {
        let mut table = PriceTable::new();
        table.insert(
            "bitcoin".to_string(),
            ExchangeRate::from_rates([("USD", 45000.0), ("JPY", 6_500_000.0)]),
        );
        StaticFeed(Some(table))
    }

    #[tokio::test]
    async fn test_convert_quantity() {
        let converter = convert_once(
            &feed(),
            "bitcoin",
            "jpy",
            ConversionInput::Quantity("0.001".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(converter.value_field(), "¥6,500");
    }

    #[tokio::test]
    async fn test_convert_value() {
        let converter = convert_once(
            &feed(),
            "bitcoin",
            "USD",
            ConversionInput::Value("$22,500.00".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(converter.quantity_field(), "0.50000000");
    }

    #[tokio::test]
    async fn test_unknown_currency_rejected_before_fetch() {
        let result = convert_once(
            &StaticFeed(None),
            "bitcoin",
            "XYZ",
            ConversionInput::Quantity("1".to_string()),
        )
        .await;
        assert_eq!(result.unwrap_err().to_string(), "Unsupported currency: XYZ");
    }

    #[tokio::test]
    async fn test_feed_failure_is_reported() {
        let result = convert_once(
            &StaticFeed(None),
            "bitcoin",
            "USD",
            ConversionInput::Quantity("1".to_string()),
        )
        .await;
        assert!(result.unwrap_err().to_string().contains("Unable to fetch"));
    }
}
