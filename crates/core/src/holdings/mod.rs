//! Daily cumulative holdings derived from the split-adjusted ledger.

mod holdings_calculator;


pub use holdings_calculator::{calculate_daily_holdings, latest_holdings_snapshot};
