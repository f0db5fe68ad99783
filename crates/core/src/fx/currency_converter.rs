use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::fx::{FxError, FxRateTable};

/// Converts native-currency amounts through the reporting currency.
///
/// Rates are quoted as units of foreign currency per one unit of the base,
/// so native -> base divides by the rate and base -> foreign multiplies.
/// Lookups forward-fill from the freshest rate on or before the requested
/// date; an unknown currency is a hard error, never a silent pass-through.
pub struct CurrencyConverter {
    table: FxRateTable,
    base_currency: String,
}

impl CurrencyConverter {
    pub fn new(table: FxRateTable, base_currency: impl Into<String>) -> Self {
        Self {
            table,
            base_currency: base_currency.into(),
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    fn rate_for(&self, currency: &str, date: NaiveDate) -> Result<Decimal, FxError> {
        if self.table.series(currency).is_none() {
            return Err(FxError::UnsupportedCurrency(currency.to_string()));
        }
        self.table
            .rate_on_or_before(currency, date)
            .ok_or_else(|| {
                FxError::RateNotFound(format!("{}->{} on or before {}", self.base_currency, currency, date))
            })
    }

    /// Converts a native-currency amount into the base currency.
    pub fn to_base(
        &self,
        amount: Decimal,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal, FxError> {
        if currency == self.base_currency {
            return Ok(amount);
        }
        let rate = self.rate_for(currency, date)?;
        Ok(amount / rate)
    }

    /// Converts a base-currency amount into a display currency.
    pub fn from_base(
        &self,
        amount: Decimal,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal, FxError> {
        if currency == self.base_currency {
            return Ok(amount);
        }
        let rate = self.rate_for(currency, date)?;
        Ok(amount * rate)
    }
}
