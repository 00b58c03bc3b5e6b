use super::ui;
use crate::core::PriceFeed;
use crate::core::convert::{format_fiat, group_thousands};
use crate::core::currency;
use crate::core::ticker::{TickerQuote, fetch_quotes};
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

fn format_price(price: f64, currency_code: &str) -> String {
    match currency::lookup(currency_code) {
        Some(meta) => format_fiat(price, meta),
        None => format!("{} {}", group_thousands(price, 2), currency_code.to_uppercase()),
    }
}

pub fn display_as_table(quotes: &[TickerQuote], currency_code: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Asset"),
        ui::header_cell(&format!("Price ({})", currency_code.to_uppercase())),
        ui::header_cell("24h"),
    ]);

    for quote in quotes {
        table.add_row(vec![
            comfy_table::Cell::new(&quote.label),
            ui::amount_cell(&format_price(quote.price, currency_code)),
            ui::change_cell(quote.change_24h),
        ]);
    }
    table.to_string()
}

pub async fn run(
    feed: &dyn PriceFeed,
    assets: &[String],
    currency_code: &str,
    watch: Option<Duration>,
) -> Result<()> {
    let Some(period) = watch else {
        let pb = ui::new_spinner("Fetching live prices...");
        let quotes = fetch_quotes(feed, assets, currency_code).await;
        pb.finish_and_clear();
        let quotes = quotes.context("Failed to fetch live prices")?;
        println!("{}", display_as_table(&quotes, currency_code));
        return Ok(());
    };

    watch_quotes(feed, assets, currency_code, period, super::ctrl_c()).await;
    Ok(())
}

/// Refreshes the table every `period` until `shutdown` resolves, including
/// while a fetch is still in flight. Returns the last quotes shown.
async fn watch_quotes(
    feed: &dyn PriceFeed,
    assets: &[String],
    currency_code: &str,
    period: Duration,
    shutdown: impl Future<Output = ()>,
) -> Option<Vec<TickerQuote>> {
    tokio::pin!(shutdown);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_quotes: Option<Vec<TickerQuote>> = None;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => break,
        }

        let fetched = tokio::select! {
            fetched = fetch_quotes(feed, assets, currency_code) => fetched,
            _ = &mut shutdown => {
                debug!("Interrupted while fetching live prices");
                break;
            }
        };

        match fetched {
            Ok(quotes) => {
                println!("{}", display_as_table(&quotes, currency_code));
                println!(
                    "{}",
                    ui::style_text(
                        &format!("Last updated: {}", chrono::Local::now().format("%H:%M:%S")),
                        ui::StyleType::Subtle
                    )
                );
                last_quotes = Some(quotes);
            }
            Err(e) => {
                // Keep showing whatever was last fetched.
                warn!(error = %e, "Failed to fetch live prices");
                if last_quotes.is_none() {
                    println!(
                        "{}",
                        ui::style_text("Unable to fetch live prices", ui::StyleType::Error)
                    );
                }
            }
        }
    }
    last_quotes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::price::FeedQuery;
    use crate::core::rates::{ExchangeRate, PriceTable};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StalledFeed;

    #[async_trait]
    impl PriceFeed for StalledFeed {
        async fn fetch_rates(&self, _query: &FeedQuery) -> Result<PriceTable> {
            std::future::pending().await
        }
    }

    /// Succeeds once, then fails on every later call.
    struct FlakyFeed(AtomicUsize);

    #[async_trait]
    impl PriceFeed for FlakyFeed {
        async fn fetch_rates(&self, _query: &FeedQuery) -> Result<PriceTable> {
            if self.0.fetch_add(1, Ordering::SeqCst) > 0 {
                return Err(anyhow!("HTTP error: 503 Service Unavailable"));
            }
            let mut table = PriceTable::new();
            table.insert(
                "bitcoin".to_string(),
                ExchangeRate::from_rates([("USD", 45000.0)]),
            );
            Ok(table)
        }
    }

    #[tokio::test]
    async fn test_watch_stops_during_stalled_fetch() {
        let assets = vec!["bitcoin".to_string()];
        let shutdown = tokio::time::sleep(Duration::from_millis(50));
        let watched = tokio::time::timeout(
            Duration::from_secs(5),
            watch_quotes(&StalledFeed, &assets, "USD", Duration::from_secs(30), shutdown),
        )
        .await;
        assert!(matches!(watched, Ok(None)));
    }

    #[tokio::test]
    async fn test_watch_keeps_last_quotes_after_failure() {
        let feed = FlakyFeed(AtomicUsize::new(0));
        let assets = vec!["bitcoin".to_string()];
        let shutdown = tokio::time::sleep(Duration::from_millis(200));
        let last = watch_quotes(&feed, &assets, "USD", Duration::from_millis(20), shutdown)
            .await
            .unwrap();
        assert!(feed.0.load(Ordering::SeqCst) >= 3);
        assert_eq!(last[0].label, "BTC");
        assert_eq!(last[0].price, 45000.0);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(45123.456, "USD"), "$45,123.46");
        assert_eq!(format_price(6_500_000.4, "jpy"), "¥6,500,000");
        assert_eq!(format_price(1234.5, "sek"), "1,234.50 SEK");
    }

    #[test]
    fn test_table_lists_every_quote() {
        let quotes = vec![
            TickerQuote {
                asset: "bitcoin".to_string(),
                label: "BTC".to_string(),
                price: 45000.0,
                change_24h: Some(1.25),
            },
            TickerQuote {
                asset: "solana".to_string(),
                label: "SOL".to_string(),
                price: 150.5,
                change_24h: None,
            },
        ];
        let table = display_as_table(&quotes, "USD");
        assert!(table.contains("BTC"));
        assert!(table.contains("$45,000.00"));
        assert!(table.contains("+1.25%"));
        assert!(table.contains("SOL"));
        assert!(table.contains("N/A"));
    }
}
