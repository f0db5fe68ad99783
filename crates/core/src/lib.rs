//! Folioval Core - portfolio valuation and return-computation engine.
//!
//! This crate turns a raw transaction ledger into a daily multi-currency
//! portfolio value series and per-security money-weighted returns (XIRR).
//! It is provider-agnostic: prices, FX rates, split events, and currency
//! classifications arrive through the traits in [`market_data`], and every
//! pipeline stage hands its result to the next as an explicit value.

pub mod constants;
pub mod errors;
pub mod fx;
pub mod holdings;
pub mod ledger;
pub mod market_data;
pub mod portfolio;
pub mod returns;
pub mod settings;
pub mod splits;
pub mod timeseries;
pub mod valuation;

// Re-export the engine surface and common types
pub use portfolio::{PortfolioReport, ValuationEngine};
pub use settings::EngineSettings;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
