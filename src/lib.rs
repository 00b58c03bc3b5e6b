pub mod cli;
pub mod core;
pub mod providers;

use crate::core::PriceFeed;
use crate::core::config::AppConfig;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Commands that need a loaded configuration.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Currencies,
    Convert {
        quantity: String,
        currency: Option<String>,
    },
    Reverse {
        value: String,
        currency: Option<String>,
    },
    Calc {
        currency: Option<String>,
    },
    Ticker {
        watch: bool,
    },
    Portfolio {
        base_quantity: Option<f64>,
        watch: bool,
    },
    Address,
    CheckPayment {
        address: Option<String>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("satcalc starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let feed: Arc<dyn PriceFeed> = Arc::new(providers::CoinGeckoProvider::new(
        config.coingecko_base_url(),
    ));

    match command {
        AppCommand::Currencies => {
            cli::convert::run_currencies();
            Ok(())
        }
        AppCommand::Convert { quantity, currency } => {
            cli::convert::run(
                feed.as_ref(),
                &config.asset,
                currency.as_deref().unwrap_or(&config.currency),
                cli::convert::ConversionInput::Quantity(quantity),
            )
            .await
        }
        AppCommand::Reverse { value, currency } => {
            cli::convert::run(
                feed.as_ref(),
                &config.asset,
                currency.as_deref().unwrap_or(&config.currency),
                cli::convert::ConversionInput::Value(value),
            )
            .await
        }
        AppCommand::Calc { currency } => {
            cli::calc::run(
                feed,
                &config.asset,
                currency.as_deref().unwrap_or(&config.currency),
                Duration::from_secs(config.refresh.calculator_secs.max(1)),
            )
            .await
        }
        AppCommand::Ticker { watch } => {
            let period = watch.then(|| Duration::from_secs(config.refresh.ticker_secs.max(1)));
            cli::ticker::run(
                feed.as_ref(),
                &config.ticker.assets,
                &config.ticker.currency,
                period,
            )
            .await
        }
        AppCommand::Portfolio {
            base_quantity,
            watch,
        } => {
            let period = watch.then(|| Duration::from_secs(config.refresh.portfolio_secs.max(1)));
            cli::portfolio::run(
                feed.as_ref(),
                base_quantity.unwrap_or(config.portfolio.base_quantity),
                period,
            )
            .await
        }
        AppCommand::Address => cli::payment::run_address(config.payment.address.as_deref()),
        AppCommand::CheckPayment { address } => {
            let Some(address) = address.or_else(|| config.payment.address.clone()) else {
                anyhow::bail!("No payment address given or configured");
            };
            let addresses =
                providers::BlockCypherProvider::new(config.blockcypher_base_url());
            cli::payment::run(&address, config.payment.min_usd, &addresses, feed.as_ref()).await
        }
    }
}
