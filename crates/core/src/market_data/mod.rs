//! Provider seams for externally retrieved market data.
//!
//! The engine never fetches anything itself; prices, FX rates, split events,
//! and currency classifications arrive through these traits, and
//! [`MarketDataService`] fans the per-symbol calls out concurrently and maps
//! provider failures into the typed outcomes the pipeline consumes.

mod market_data_errors;
mod market_data_service;
mod market_data_traits;

pub use market_data_errors::MarketDataError;
pub use market_data_service::MarketDataService;
pub use market_data_traits::{
    CurrencyClassifierTrait, FxRateProviderTrait, PriceProviderTrait, SplitProviderTrait,
};
