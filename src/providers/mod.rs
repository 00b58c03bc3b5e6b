pub mod blockcypher;
pub mod coingecko;

pub use blockcypher::BlockCypherProvider;
pub use coingecko::CoinGeckoProvider;
