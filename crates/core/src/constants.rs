/// Decimal precision for valuation calculations
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Day count used to annualize money-weighted returns
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Reporting currency used as the pivot for cross-currency aggregation
pub const DEFAULT_BASE_CURRENCY: &str = "USD";

/// Secondary currencies the portfolio value series is also expressed in
pub const DEFAULT_DISPLAY_CURRENCIES: [&str; 2] = ["INR", "SGD"];
