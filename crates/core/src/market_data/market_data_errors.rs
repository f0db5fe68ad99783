use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Provider request failed: {0}")]
    ProviderError(String),

    #[error("No data available for symbol: {0}")]
    NoData(String),
}
