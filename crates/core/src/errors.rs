//! Core error types for the valuation engine.
//!
//! Module-specific error enums (`FxError`, `MarketDataError`) are converted
//! into this root type via `#[from]`; callers match on the root `Error`.

use chrono::NaiveDate;
use thiserror::Error;

use crate::fx::FxError;
use crate::market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the valuation engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Fx error: {0}")]
    Fx(#[from] FxError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Calculation failed: {0}")]
    Calculation(#[from] CalculatorError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Errors raised while normalizing or validating engine input.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

/// Errors raised by the holdings and valuation calculators.
#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("Calculation error: {0}")]
    Calculation(String),

    #[error("No price observation for held position '{symbol}' on {date}")]
    MissingPrice { symbol: String, date: NaiveDate },

    #[error("No currency classification for held position '{0}'")]
    UnclassifiedSymbol(String),
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}
