//! FX rate table, currency classification, and conversion through the
//! reporting currency.

mod currency_converter;
mod fx_errors;
mod fx_model;

pub use currency_converter::CurrencyConverter;
pub use fx_errors::FxError;
pub use fx_model::{ClassifiedCurrency, FxRateTable};
