use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

use crate::errors::Result;
use crate::fx::FxRateTable;
use crate::splits::ProviderSplit;
use crate::timeseries::DailySeries;

/// Daily close prices in each symbol's native currency.
///
/// Symbols the provider cannot serve are simply absent from the returned
/// map; the caller reports them instead of substituting anything.
#[async_trait]
pub trait PriceProviderTrait: Send + Sync {
    async fn daily_closes(
        &self,
        symbols: &HashSet<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashMap<String, DailySeries>>;
}

/// Daily exchange rates quoted against the reporting currency.
#[async_trait]
pub trait FxRateProviderTrait: Send + Sync {
    async fn daily_usd_rates(
        &self,
        currencies: &HashSet<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FxRateTable>;
}

/// Raw split events for one symbol, possibly empty. Timestamps stay UTC;
/// normalization to the exchange calendar happens on this side of the seam.
#[async_trait]
pub trait SplitProviderTrait: Send + Sync {
    async fn splits(&self, symbol: &str) -> Result<Vec<ProviderSplit>>;
}

/// Native trading currency for one symbol.
#[async_trait]
pub trait CurrencyClassifierTrait: Send + Sync {
    async fn currency(&self, symbol: &str) -> Result<String>;
}
