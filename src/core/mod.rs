//! Core business logic abstractions

pub mod config;
pub mod convert;
pub mod converter;
pub mod currency;
pub mod error;
pub mod log;
pub mod payment;
pub mod portfolio;
pub mod price;
pub mod rates;
pub mod scheduler;
pub mod ticker;

// Re-export main types for cleaner imports
pub use converter::{Converter, ConverterEvent, FieldStyle};
pub use error::ConvertError;
pub use payment::{AddressProvider, PaymentStatus};
pub use price::{FeedQuery, PriceFeed};
pub use rates::{ExchangeRate, PriceTable};
