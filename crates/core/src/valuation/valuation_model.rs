use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Total portfolio value for one day, in the reporting currency and in each
/// configured display currency.
///
/// All amounts are rounded to the engine's calculation precision; the same
/// underlying base value feeds every display conversion, so the display
/// figures are restatements of one number, never independent aggregations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyPortfolioValue {
    pub valuation_date: NaiveDate,
    pub base_currency: String,
    pub base_value: Decimal,
    /// Display currency code -> portfolio value in that currency.
    pub display_values: HashMap<String, Decimal>,
}

/// A ledger transaction with its proceeds restated in the reporting currency
/// and each display currency, using the FX rate in effect on the trade date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedTransaction {
    pub symbol: String,
    pub trade_date: NaiveDate,
    pub currency: String,
    /// Proceeds in the transaction's native currency.
    pub proceeds: Decimal,
    pub base_proceeds: Decimal,
    pub display_proceeds: HashMap<String, Decimal>,
}
