use super::ui;
use crate::core::PriceFeed;
use crate::core::convert::group_thousands;
use crate::core::portfolio::{PortfolioTracker, PortfolioValues};
use anyhow::Result;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::debug;

fn usd(amount: f64) -> String {
    format!("${}", group_thousands(amount, 2))
}

/// P&L with an explicit sign: `+$900.00` / `-$900.00`.
fn signed_usd(amount: f64) -> String {
    let sign = if amount >= 0.0 { "+" } else { "-" };
    format!("{sign}{}", usd(amount.abs()))
}

impl PortfolioValues {
    pub fn display_as_card(&self) -> String {
        let arrow = if self.change_24h >= 0.0 { "▲" } else { "▼" };
        let sign = if self.change_24h >= 0.0 { "+" } else { "" };
        let change = format!("{arrow} {sign}{:.2}% (24h)", self.change_24h);
        let change_style = if self.change_24h >= 0.0 {
            ui::StyleType::Positive
        } else {
            ui::StyleType::Error
        };

        let mut output = format!(
            "Total Balance: {}\n{} BTC  {}\n\n",
            ui::style_text(&usd(self.total_value), ui::StyleType::Value),
            ui::style_text(&format!("{:.4}", self.base_quantity), ui::StyleType::Label),
            ui::style_text(&change, change_style),
        );

        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Stat"), ui::header_cell("Value")]);
        table.add_row(vec![
            comfy_table::Cell::new("Available Balance"),
            ui::amount_cell(&usd(self.available_balance)),
        ]);
        table.add_row(vec![
            comfy_table::Cell::new("In Orders"),
            ui::amount_cell(&usd(self.in_orders)),
        ]);
        table.add_row(vec![
            comfy_table::Cell::new("Today's P&L"),
            ui::amount_cell(&signed_usd(self.daily_pnl)),
        ]);
        table.add_row(vec![
            comfy_table::Cell::new("24h Volume"),
            ui::amount_cell(&usd(self.volume_24h)),
        ]);
        output.push_str(&table.to_string());
        output
    }
}

/// Fetches a fresh quote and renders the card. A failed fetch keeps the
/// last good price and adds a notice above the card.
pub async fn refresh_card(tracker: &mut PortfolioTracker, feed: &dyn PriceFeed) -> String {
    let notice = match tracker.update(feed).await {
        Ok(_) => String::new(),
        Err(_) if tracker.last_price().is_some() => format!(
            "{}\n",
            ui::style_text("Live price unavailable, showing last price", ui::StyleType::Error)
        ),
        Err(_) => format!(
            "{}\n",
            ui::style_text(
                "Live price unavailable, showing fallback values",
                ui::StyleType::Error
            )
        ),
    };
    notice + &tracker.values().display_as_card()
}

pub async fn run(feed: &dyn PriceFeed, base_quantity: f64, watch: Option<Duration>) -> Result<()> {
    let mut tracker = PortfolioTracker::new(base_quantity);

    let Some(period) = watch else {
        let pb = ui::new_spinner("Fetching BTC price...");
        let card = refresh_card(&mut tracker, feed).await;
        pb.finish_and_clear();
        println!("{card}");
        return Ok(());
    };

    let shutdown = super::ctrl_c();
    tokio::pin!(shutdown);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => break,
        }
        tokio::select! {
            card = refresh_card(&mut tracker, feed) => println!("{card}"),
            _ = &mut shutdown => {
                debug!("Interrupted while fetching BTC price");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::price::FeedQuery;
    use crate::core::rates::{ExchangeRate, PriceTable};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Quotes 60000 USD (+1.5 %) once, then fails.
    struct OneShotFeed(AtomicUsize);

    #[async_trait]
    impl PriceFeed for OneShotFeed {
        async fn fetch_rates(&self, _query: &FeedQuery) -> Result<PriceTable> {
            if self.0.fetch_add(1, Ordering::SeqCst) > 0 {
                return Err(anyhow!("HTTP error: 429 Too Many Requests"));
            }
            let mut rates = ExchangeRate::from_rates([("USD", 60000.0)]);
            rates.insert_change("USD", 1.5);
            let mut table = PriceTable::new();
            table.insert("bitcoin".to_string(), rates);
            Ok(table)
        }
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_card() {
        let feed = OneShotFeed(AtomicUsize::new(0));
        let mut tracker = PortfolioTracker::new(1.0);

        let first = refresh_card(&mut tracker, &feed).await;
        assert!(first.contains("$60,000.00"));
        assert!(first.contains("+1.50% (24h)"));
        assert!(!first.contains("unavailable"));

        let second = refresh_card(&mut tracker, &feed).await;
        assert!(second.contains("Live price unavailable, showing last price"));
        assert!(second.contains("$60,000.00"));
        assert!(second.contains("+$900.00"));
        assert!(second.ends_with(&first));
    }

    #[tokio::test]
    async fn test_first_failure_uses_fallback_price() {
        let feed = OneShotFeed(AtomicUsize::new(1));
        let mut tracker = PortfolioTracker::new(1.0);
        let card = refresh_card(&mut tracker, &feed).await;
        assert!(card.contains("showing fallback values"));
        assert!(card.contains("$45,000.00"));
    }

    #[test]
    fn test_signed_usd() {
        assert_eq!(signed_usd(900.0), "+$900.00");
        assert_eq!(signed_usd(-1234.5), "-$1,234.50");
    }

    #[test]
    fn test_card_contains_stats() {
        let card = PortfolioValues::calculate(1.0, 50000.0, -2.0).display_as_card();
        assert!(card.contains("$50,000.00"));
        assert!(card.contains("1.0000"));
        assert!(card.contains("-2.00% (24h)"));
        assert!(card.contains("$32,900.00"));
        assert!(card.contains("$17,100.00"));
        assert!(card.contains("-$1,000.00"));
        assert!(card.contains("$7,500.00"));
    }
}
