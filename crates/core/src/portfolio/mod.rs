//! End-to-end valuation pipeline orchestration.

mod engine;

pub use engine::{PortfolioReport, ValuationEngine};
