use thiserror::Error;

#[derive(Error, Debug)]
pub enum FxError {
    #[error("Exchange rate not found: {0}")]
    RateNotFound(String),

    #[error("Currency '{0}' is not supported")]
    UnsupportedCurrency(String),

    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),

    #[error("Currency classification unavailable for '{0}'")]
    ClassificationUnavailable(String),
}
