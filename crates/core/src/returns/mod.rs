//! Per-security money-weighted returns (XIRR).

mod returns_model;
mod xirr_calculator;


pub use returns_model::{CashFlow, XirrFailure, XirrOutcome};
pub use xirr_calculator::{calculate_returns, symbol_cash_flows, xirr};
