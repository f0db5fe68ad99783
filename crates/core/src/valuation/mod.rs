//! Daily multi-currency portfolio valuation.

mod valuation_calculator;
mod valuation_model;

pub use valuation_calculator::{calculate_portfolio_values, convert_transactions};
pub use valuation_model::{ConvertedTransaction, DailyPortfolioValue};
