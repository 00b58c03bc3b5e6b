use crate::core::ticker::DEFAULT_ASSETS;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinGeckoProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BlockCypherProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub coingecko: Option<CoinGeckoProviderConfig>,
    pub blockcypher: Option<BlockCypherProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            coingecko: Some(CoinGeckoProviderConfig {
                base_url: "https://api.coingecko.com".to_string(),
            }),
            blockcypher: Some(BlockCypherProviderConfig {
                base_url: "https://api.blockcypher.com".to_string(),
            }),
        }
    }
}

/// Polling periods, in seconds.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RefreshConfig {
    #[serde(default = "default_calculator_secs")]
    pub calculator_secs: u64,
    #[serde(default = "default_ticker_secs")]
    pub ticker_secs: u64,
    #[serde(default = "default_portfolio_secs")]
    pub portfolio_secs: u64,
}

fn default_calculator_secs() -> u64 {
    15 * 60
}

fn default_ticker_secs() -> u64 {
    30
}

fn default_portfolio_secs() -> u64 {
    30
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            calculator_secs: default_calculator_secs(),
            ticker_secs: default_ticker_secs(),
            portfolio_secs: default_portfolio_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TickerConfig {
    #[serde(default = "default_ticker_assets")]
    pub assets: Vec<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_ticker_assets() -> Vec<String> {
    DEFAULT_ASSETS.iter().map(|a| a.to_string()).collect()
}

impl Default for TickerConfig {
    fn default() -> Self {
        TickerConfig {
            assets: default_ticker_assets(),
            currency: default_currency(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PaymentConfig {
    pub address: Option<String>,
    #[serde(default = "default_min_usd")]
    pub min_usd: f64,
}

fn default_min_usd() -> f64 {
    1000.0
}

impl Default for PaymentConfig {
    fn default() -> Self {
        PaymentConfig {
            address: None,
            min_usd: default_min_usd(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PortfolioConfig {
    #[serde(default = "default_base_quantity")]
    pub base_quantity: f64,
}

fn default_base_quantity() -> f64 {
    1.0
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        PortfolioConfig {
            base_quantity: default_base_quantity(),
        }
    }
}

fn default_asset() -> String {
    "bitcoin".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Feed id of the base asset.
    #[serde(default = "default_asset")]
    pub asset: String,
    /// Currency selected when the calculator starts.
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub ticker: TickerConfig,
    #[serde(default)]
    pub payment: PaymentConfig,
    #[serde(default)]
    pub portfolio: PortfolioConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            asset: default_asset(),
            currency: default_currency(),
            providers: ProvidersConfig::default(),
            refresh: RefreshConfig::default(),
            ticker: TickerConfig::default(),
            payment: PaymentConfig::default(),
            portfolio: PortfolioConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the default config file, or built-in defaults if there is none.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "satcalc", "satcalc")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn coingecko_base_url(&self) -> &str {
        self.providers
            .coingecko
            .as_ref()
            .map_or("https://api.coingecko.com", |p| &p.base_url)
    }

    pub fn blockcypher_base_url(&self) -> &str {
        self.providers
            .blockcypher
            .as_ref()
            .map_or("https://api.blockcypher.com", |p| &p.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
asset: bitcoin
currency: "EUR"
providers:
  coingecko:
    base_url: "http://example.com/coingecko"
  blockcypher:
    base_url: "http://example.com/blockcypher"
refresh:
  calculator_secs: 60
ticker:
  assets: [bitcoin, litecoin]
payment:
  address: "bc1qexample"
  min_usd: 250
portfolio:
  base_quantity: 0.25
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.asset, "bitcoin");
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.coingecko_base_url(), "http://example.com/coingecko");
        assert_eq!(
            config.blockcypher_base_url(),
            "http://example.com/blockcypher"
        );
        assert_eq!(config.refresh.calculator_secs, 60);
        assert_eq!(config.refresh.ticker_secs, 30);
        assert_eq!(config.refresh.portfolio_secs, 30);
        assert_eq!(config.ticker.assets, vec!["bitcoin", "litecoin"]);
        assert_eq!(config.ticker.currency, "USD");
        assert_eq!(config.payment.address.as_deref(), Some("bc1qexample"));
        assert_eq!(config.payment.min_usd, 250.0);
        assert_eq!(config.portfolio.base_quantity, 0.25);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.asset, "bitcoin");
        assert_eq!(config.currency, "USD");
        assert_eq!(config.coingecko_base_url(), "https://api.coingecko.com");
        assert_eq!(config.refresh.calculator_secs, 900);
        assert_eq!(config.ticker.assets.len(), 4);
        assert!(config.payment.address.is_none());
        assert_eq!(config.payment.min_usd, 1000.0);
        assert_eq!(config.portfolio.base_quantity, 1.0);
    }

    #[test]
    fn test_provider_without_url_falls_back() {
        let yaml_str = r#"
providers:
  coingecko:
    base_url: "http://localhost:9000"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert_eq!(config.coingecko_base_url(), "http://localhost:9000");
        assert_eq!(config.blockcypher_base_url(), "https://api.blockcypher.com");
    }
}
