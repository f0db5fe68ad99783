use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::fx::{FxError, FxRateTable};
use crate::timeseries::DailySeries;

use super::daily_series;

/// Holdings, prices, and FX rates reconciled onto one shared date index.
///
/// The index is the holdings' calendar; price and FX observations are
/// forward-filled onto it. Dates where any held symbol has no prior price
/// observation, or any required currency has no prior rate, are dropped
/// entirely - a surviving row is always fully resolved.
#[derive(Debug, Clone)]
pub struct AlignedSeries {
    pub index: Vec<NaiveDate>,
    /// Per symbol, end-of-day quantity for every index date (zero before the
    /// symbol's first transaction).
    pub holdings: HashMap<String, Vec<Decimal>>,
    /// Per symbol, forward-filled native-currency close. `None` only where
    /// the symbol is not held.
    pub prices: HashMap<String, Vec<Option<Decimal>>>,
    /// Per non-base currency, forward-filled units of that currency per one
    /// unit of the base currency.
    pub fx_rates: HashMap<String, Vec<Decimal>>,
}

impl AlignedSeries {
    pub fn quantity(&self, symbol: &str, idx: usize) -> Decimal {
        self.holdings
            .get(symbol)
            .and_then(|v| v.get(idx).copied())
            .unwrap_or(Decimal::ZERO)
    }

    pub fn price(&self, symbol: &str, idx: usize) -> Option<Decimal> {
        self.prices
            .get(symbol)
            .and_then(|v| v.get(idx).copied())
            .flatten()
    }

    /// Rate for `currency` on the index date at `idx`, quoted as units of
    /// `currency` per one unit of `base_currency`.
    pub fn rate(&self, currency: &str, base_currency: &str, idx: usize) -> Result<Decimal, FxError> {
        if currency == base_currency {
            return Ok(Decimal::ONE);
        }
        self.fx_rates
            .get(currency)
            .and_then(|v| v.get(idx).copied())
            .ok_or_else(|| FxError::UnsupportedCurrency(currency.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Reindexes prices and FX rates onto the holdings' date index with
/// forward-fill, then drops every date that cannot be fully resolved.
pub fn align_series(
    holdings: &HashMap<String, DailySeries>,
    prices: &HashMap<String, DailySeries>,
    fx_table: &FxRateTable,
    required_currencies: &HashSet<String>,
    base_currency: &str,
) -> AlignedSeries {
    // The holdings series are dense per symbol; their union is the candidate index.
    let candidate_index: Vec<NaiveDate> = holdings
        .values()
        .flat_map(|series| series.iter().map(|(date, _)| date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let quantities: HashMap<&str, Vec<Decimal>> = holdings
        .iter()
        .map(|(symbol, series)| {
            let filled = series
                .reindex_ffill(&candidate_index)
                .into_iter()
                .map(|v| v.unwrap_or(Decimal::ZERO))
                .collect();
            (symbol.as_str(), filled)
        })
        .collect();

    let raw_prices: HashMap<&str, Vec<Option<Decimal>>> = holdings
        .keys()
        .map(|symbol| {
            let filled = prices
                .get(symbol)
                .map(|series| series.reindex_ffill(&candidate_index))
                .unwrap_or_else(|| vec![None; candidate_index.len()]);
            (symbol.as_str(), filled)
        })
        .collect();

    let raw_rates: HashMap<&str, Vec<Option<Decimal>>> = required_currencies
        .iter()
        .filter(|currency| currency.as_str() != base_currency)
        .map(|currency| {
            let filled = fx_table
                .series(currency)
                .map(|series| series.reindex_ffill(&candidate_index))
                .unwrap_or_else(|| vec![None; candidate_index.len()]);
            (currency.as_str(), filled)
        })
        .collect();

    // Strict no-partial-rows policy: a date survives only when every held
    // symbol has a price and every required currency has a rate.
    let keep: Vec<bool> = candidate_index
        .iter()
        .enumerate()
        .map(|(idx, _)| {
            let rates_resolved = raw_rates.values().all(|v| v[idx].is_some());
            let prices_resolved = quantities.iter().all(|(symbol, qty)| {
                qty[idx].is_zero() || raw_prices[symbol][idx].is_some()
            });
            rates_resolved && prices_resolved
        })
        .collect();

    let dropped = keep.iter().filter(|k| !**k).count();
    if dropped > 0 {
        debug!(
            "Alignment dropped {} of {} dates lacking a prior price or FX observation",
            dropped,
            candidate_index.len()
        );
    }

    let index: Vec<NaiveDate> = daily_series::filter_by_mask(&candidate_index, &keep);

    AlignedSeries {
        holdings: quantities
            .into_iter()
            .map(|(symbol, v)| (symbol.to_string(), daily_series::filter_by_mask(&v, &keep)))
            .collect(),
        prices: raw_prices
            .into_iter()
            .map(|(symbol, v)| (symbol.to_string(), daily_series::filter_by_mask(&v, &keep)))
            .collect(),
        fx_rates: raw_rates
            .into_iter()
            .map(|(currency, v)| {
                let resolved = daily_series::filter_by_mask(&v, &keep)
                    .into_iter()
                    .map(|o| o.expect("kept rows are fully resolved"))
                    .collect();
                (currency.to_string(), resolved)
            })
            .collect(),
        index,
    }
}
