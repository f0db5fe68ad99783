use log::warn;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::constants::DECIMAL_PRECISION;
use crate::errors::{CalculatorError, Result};
use crate::fx::CurrencyConverter;
use crate::ledger::Transaction;
use crate::settings::EngineSettings;
use crate::timeseries::AlignedSeries;
use crate::valuation::{ConvertedTransaction, DailyPortfolioValue};

/// Computes the daily portfolio value series from fully aligned inputs.
///
/// Each position's native market value (`quantity * close`) is pivoted into
/// the base currency through that day's FX rate, summed across symbols, and
/// then restated in every display currency from the same base total. The
/// aligner guarantees every surviving date is fully resolved, so a missing
/// price on a held position here is an internal inconsistency and fails the
/// run rather than being skipped. Every held symbol must appear in
/// `currency_by_symbol`; an unclassified position is an error, never an
/// implicit base-currency position.
pub fn calculate_portfolio_values(
    aligned: &AlignedSeries,
    currency_by_symbol: &HashMap<String, String>,
    settings: &EngineSettings,
) -> Result<Vec<DailyPortfolioValue>> {
    let base = settings.base_currency.as_str();
    let mut values = Vec::with_capacity(aligned.index.len());

    for (idx, date) in aligned.index.iter().enumerate() {
        let mut base_value = Decimal::ZERO;
        for symbol in aligned.holdings.keys() {
            let quantity = aligned.quantity(symbol, idx);
            if quantity.is_zero() {
                continue;
            }
            let price = aligned.price(symbol, idx).ok_or_else(|| {
                CalculatorError::MissingPrice {
                    symbol: symbol.clone(),
                    date: *date,
                }
            })?;
            // A held symbol without a classification must fail, not fall
            // back to the base currency and overstate foreign positions.
            let currency = currency_by_symbol
                .get(symbol)
                .ok_or_else(|| CalculatorError::UnclassifiedSymbol(symbol.clone()))?;
            let rate = aligned.rate(currency, base, idx)?;
            base_value += quantity * price / rate;
        }

        let mut display_values = HashMap::with_capacity(settings.display_currencies.len());
        for currency in &settings.display_currencies {
            let rate = aligned.rate(currency, base, idx)?;
            display_values.insert(
                currency.clone(),
                (base_value * rate).round_dp(DECIMAL_PRECISION),
            );
        }

        values.push(DailyPortfolioValue {
            valuation_date: *date,
            base_currency: base.to_string(),
            base_value: base_value.round_dp(DECIMAL_PRECISION),
            display_values,
        });
    }

    Ok(values)
}

/// Restates each transaction's proceeds in the base and display currencies
/// at its trade-date FX rate.
///
/// A transaction whose rate cannot be resolved is skipped with a warning
/// rather than failing the batch; this is report decoration, not a valuation
/// input.
pub fn convert_transactions(
    ledger: &[Transaction],
    converter: &CurrencyConverter,
    display_currencies: &[String],
) -> Vec<ConvertedTransaction> {
    let mut converted = Vec::with_capacity(ledger.len());
    for tx in ledger {
        let date = tx.trade_date();
        let base_proceeds = match converter.to_base(tx.proceeds, &tx.currency, date) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    "Skipping proceeds conversion for {} on {}: {}",
                    tx.symbol, date, e
                );
                continue;
            }
        };

        let mut display_proceeds = HashMap::with_capacity(display_currencies.len());
        let mut resolved = true;
        for currency in display_currencies {
            match converter.from_base(base_proceeds, currency, date) {
                Ok(value) => {
                    display_proceeds.insert(currency.clone(), value.round_dp(DECIMAL_PRECISION));
                }
                Err(e) => {
                    warn!(
                        "Skipping proceeds conversion for {} on {}: {}",
                        tx.symbol, date, e
                    );
                    resolved = false;
                    break;
                }
            }
        }
        if !resolved {
            continue;
        }

        converted.push(ConvertedTransaction {
            symbol: tx.symbol.clone(),
            trade_date: date,
            currency: tx.currency.clone(),
            proceeds: tx.proceeds,
            base_proceeds: base_proceeds.round_dp(DECIMAL_PRECISION),
            display_proceeds,
        });
    }
    converted
}
