use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use crate::ledger::Transaction;
use crate::timeseries::DailySeries;

/// Builds the end-of-day position series per symbol from the split-adjusted
/// ledger.
///
/// Signed quantities are netted per (trade day, symbol) BEFORE the cumulative
/// pass, so several same-day transactions cannot produce intraday level
/// crossings in the output. The running sum is then carried forward across
/// every calendar day from the symbol's first transaction through `as_of`.
/// Dates before a symbol's first transaction are zero holdings by contract,
/// not missing data.
pub fn calculate_daily_holdings(
    ledger: &[Transaction],
    as_of: NaiveDate,
) -> HashMap<String, DailySeries> {
    // (symbol -> day -> net quantity delta)
    let mut daily_deltas: HashMap<&str, BTreeMap<NaiveDate, Decimal>> = HashMap::new();
    for tx in ledger {
        let day = tx.trade_date();
        if day > as_of {
            debug!(
                "Ignoring {} transaction dated {} after the valuation date {}",
                tx.symbol, day, as_of
            );
            continue;
        }
        *daily_deltas
            .entry(tx.symbol.as_str())
            .or_default()
            .entry(day)
            .or_insert(Decimal::ZERO) += tx.quantity;
    }

    let mut holdings = HashMap::with_capacity(daily_deltas.len());
    for (symbol, deltas) in daily_deltas {
        let first_day = *deltas.keys().next().expect("deltas are non-empty");
        let mut series = DailySeries::new();
        let mut position = Decimal::ZERO;
        let mut day = first_day;
        while day <= as_of {
            if let Some(delta) = deltas.get(&day) {
                position += *delta;
            }
            series.insert(day, position);
            day = match day.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }
        holdings.insert(symbol.to_string(), series);
    }
    holdings
}

/// Latest-day position per symbol - the holdings snapshot exposed to the
/// report layer.
pub fn latest_holdings_snapshot(
    holdings: &HashMap<String, DailySeries>,
) -> HashMap<String, Decimal> {
    holdings
        .iter()
        .filter_map(|(symbol, series)| series.last().map(|(_, qty)| (symbol.clone(), qty)))
        .collect()
}
