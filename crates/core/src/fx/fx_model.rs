use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::fx::FxError;
use crate::timeseries::DailySeries;

/// Daily exchange rates quoted against the reporting currency: for each
/// foreign currency, units of that currency per one unit of the base
/// (e.g. USD_INR = 83 means 83 INR per 1 USD).
#[derive(Debug, Clone, Default)]
pub struct FxRateTable {
    rates: HashMap<String, DailySeries>,
}

impl FxRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a rate observation. Non-positive rates are rejected; a later
    /// insert for the same (currency, date) wins, mirroring the keep-last
    /// deduplication of every daily series.
    pub fn insert_rate(
        &mut self,
        currency: impl Into<String>,
        date: NaiveDate,
        rate: Decimal,
    ) -> Result<(), FxError> {
        let currency = currency.into();
        if rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate(format!(
                "rate for {} on {} must be positive, got {}",
                currency, date, rate
            )));
        }
        self.rates.entry(currency).or_default().insert(date, rate);
        Ok(())
    }

    pub fn series(&self, currency: &str) -> Option<&DailySeries> {
        self.rates.get(currency)
    }

    /// Freshest rate on or before `date` (forward-fill semantics).
    pub fn rate_on_or_before(&self, currency: &str, date: NaiveDate) -> Option<Decimal> {
        self.rates
            .get(currency)?
            .latest_on_or_before(date)
            .map(|(_, rate)| rate)
    }

    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// How a symbol's native trading currency was resolved for this run.
///
/// `Defaulted` records that the classifier could not answer and a fallback
/// code was substituted - surfaced as a typed outcome instead of a silent
/// default so the caller decides whether that risk is acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "resolution", content = "code")]
pub enum ClassifiedCurrency {
    Classified(String),
    Defaulted(String),
}

impl ClassifiedCurrency {
    pub fn code(&self) -> &str {
        match self {
            ClassifiedCurrency::Classified(code) | ClassifiedCurrency::Defaulted(code) => code,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, ClassifiedCurrency::Defaulted(_))
    }
}
