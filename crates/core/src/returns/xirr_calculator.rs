use chrono::NaiveDate;
use log::debug;
use rayon::prelude::*;
use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::constants::{DAYS_PER_YEAR, DECIMAL_PRECISION};
use crate::fx::{CurrencyConverter, FxError};
use crate::ledger::Transaction;
use crate::returns::{CashFlow, XirrFailure, XirrOutcome};
use crate::timeseries::DailySeries;

const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1e-9;
// Rates outside this band are economically meaningless for annualized
// security returns and destabilize the Newton step.
const MIN_RATE: f64 = -0.99;
const MAX_RATE: f64 = 10.0;

/// NPV and its derivative with respect to the rate, over (amount, years)
/// pairs measured from the first cash flow.
fn npv_and_derivative(flows: &[(f64, f64)], rate: f64) -> (f64, f64) {
    let mut npv = 0.0;
    let mut dnpv = 0.0;
    for &(amount, years) in flows {
        let factor = (1.0 + rate).powf(years);
        npv += amount / factor;
        dnpv -= years * amount / (factor * (1.0 + rate));
    }
    (npv, dnpv)
}

/// Newton-Raphson from a 10% guess, falling back to bisection over a scanned
/// bracket when the iteration stalls or diverges.
fn solve_rate(flows: &[(f64, f64)]) -> Result<f64, XirrFailure> {
    let mut rate = 0.1;
    for _ in 0..MAX_ITERATIONS {
        let (npv, dnpv) = npv_and_derivative(flows, rate);
        if dnpv.abs() < f64::EPSILON {
            break;
        }
        let next = (rate - npv / dnpv).clamp(MIN_RATE, MAX_RATE);
        if (next - rate).abs() < TOLERANCE {
            let (residual, _) = npv_and_derivative(flows, next);
            if residual.abs() < 1e-4 {
                return Ok(next);
            }
            break;
        }
        rate = next;
    }
    bisect_rate(flows)
}

fn bisect_rate(flows: &[(f64, f64)]) -> Result<f64, XirrFailure> {
    // NPV is monotone between poles for well-formed schedules; a coarse scan
    // finds a sign change and bisection refines it.
    let mut low = MIN_RATE;
    let mut low_npv = npv_and_derivative(flows, low).0;
    let mut bracket = None;
    let steps = 220;
    for step in 1..=steps {
        let high = MIN_RATE + (MAX_RATE - MIN_RATE) * step as f64 / steps as f64;
        let high_npv = npv_and_derivative(flows, high).0;
        if low_npv * high_npv <= 0.0 && low_npv.is_finite() && high_npv.is_finite() {
            bracket = Some((low, high, low_npv));
            break;
        }
        low = high;
        low_npv = high_npv;
    }
    let (mut low, mut high, mut low_npv) = bracket.ok_or(XirrFailure::NonConvergent)?;

    for _ in 0..200 {
        let mid = (low + high) / 2.0;
        let mid_npv = npv_and_derivative(flows, mid).0;
        if mid_npv.abs() < TOLERANCE || (high - low) / 2.0 < TOLERANCE {
            return Ok(mid);
        }
        if low_npv * mid_npv < 0.0 {
            high = mid;
        } else {
            low = mid;
            low_npv = mid_npv;
        }
    }
    Err(XirrFailure::NonConvergent)
}

/// Annualized money-weighted rate of return over an irregular cash-flow
/// schedule.
///
/// Preconditions are reported as typed failures: at least two flows, and at
/// least one flow of each sign. Day counts are actual/365 from the first
/// flow.
pub fn xirr(flows: &[CashFlow]) -> XirrOutcome {
    if flows.len() < 2 {
        return XirrOutcome::Failed(XirrFailure::InsufficientData);
    }
    let has_positive = flows.iter().any(|f| f.amount > Decimal::ZERO);
    let has_negative = flows.iter().any(|f| f.amount < Decimal::ZERO);
    if !has_positive || !has_negative {
        return XirrOutcome::Failed(XirrFailure::NoSignChange);
    }

    let first_date = flows
        .iter()
        .map(|f| f.date)
        .min()
        .expect("flows are non-empty");
    let mut schedule = Vec::with_capacity(flows.len());
    for flow in flows {
        // An unconvertible amount fails the solve; a fabricated zero flow
        // would skew the rate silently.
        let Some(amount) = flow.amount.to_f64().filter(|a| a.is_finite()) else {
            return XirrOutcome::Failed(XirrFailure::NonConvergent);
        };
        let years = (flow.date - first_date).num_days() as f64 / DAYS_PER_YEAR;
        schedule.push((amount, years));
    }

    match solve_rate(&schedule) {
        Ok(rate) => match Decimal::from_f64(rate) {
            Some(decimal) => XirrOutcome::Rate(decimal.round_dp(DECIMAL_PRECISION)),
            None => XirrOutcome::Failed(XirrFailure::NonConvergent),
        },
        Err(failure) => XirrOutcome::Failed(failure),
    }
}

fn fx_failure(err: FxError, currency: &str) -> XirrFailure {
    match err {
        FxError::UnsupportedCurrency(_) => XirrFailure::UnsupportedCurrency(currency.to_string()),
        _ => XirrFailure::MissingFxRate(currency.to_string()),
    }
}

/// Builds one symbol's cash-flow schedule in the reporting currency.
///
/// Each transaction contributes the negation of its proceeds, converted at
/// its trade-date FX rate. An open position adds a terminal inflow at
/// `as_of`: the net quantity valued at the freshest close on or before that
/// date, pivoted through the reporting currency. A fully closed position
/// contributes no terminal flow and needs no price at all.
pub fn symbol_cash_flows(
    symbol: &str,
    ledger: &[Transaction],
    native_currency: &str,
    prices: &HashMap<String, DailySeries>,
    converter: &CurrencyConverter,
    as_of: NaiveDate,
) -> Result<Vec<CashFlow>, XirrFailure> {
    let mut flows = Vec::new();
    let mut net_quantity = Decimal::ZERO;
    for tx in ledger.iter().filter(|tx| tx.symbol == symbol) {
        let date = tx.trade_date();
        let amount = converter
            .to_base(-tx.proceeds, &tx.currency, date)
            .map_err(|e| fx_failure(e, &tx.currency))?;
        flows.push(CashFlow { date, amount });
        net_quantity += tx.quantity;
    }

    if !net_quantity.is_zero() {
        let (price_date, price) = prices
            .get(symbol)
            .and_then(|series| series.latest_on_or_before(as_of))
            .ok_or_else(|| XirrFailure::MissingPrice(symbol.to_string()))?;
        let terminal = converter
            .to_base(net_quantity * price, native_currency, as_of)
            .map_err(|e| fx_failure(e, native_currency))?;
        debug!(
            "{}: terminal flow {} on {} from close dated {}",
            symbol, terminal, as_of, price_date
        );
        flows.push(CashFlow {
            date: as_of,
            amount: terminal,
        });
    }

    Ok(flows)
}

/// Money-weighted return per symbol, computed independently and in parallel.
///
/// One symbol's failure is recorded as its own outcome and never disturbs
/// the others.
pub fn calculate_returns(
    ledger: &[Transaction],
    prices: &HashMap<String, DailySeries>,
    converter: &CurrencyConverter,
    currency_by_symbol: &HashMap<String, String>,
    as_of: NaiveDate,
) -> HashMap<String, XirrOutcome> {
    currency_by_symbol
        .par_iter()
        .map(|(symbol, currency)| {
            let outcome =
                match symbol_cash_flows(symbol, ledger, currency, prices, converter, as_of) {
                    Ok(flows) => xirr(&flows),
                    Err(failure) => XirrOutcome::Failed(failure),
                };
            (symbol.clone(), outcome)
        })
        .collect()
}
