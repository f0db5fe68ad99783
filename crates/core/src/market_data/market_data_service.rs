use chrono::NaiveDate;
use chrono_tz::Tz;
use futures::future::join_all;
use log::warn;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::errors::Result;
use crate::fx::{ClassifiedCurrency, FxRateTable};
use crate::market_data::{
    CurrencyClassifierTrait, FxRateProviderTrait, PriceProviderTrait, SplitProviderTrait,
};
use crate::splits::{SplitEvent, SplitLookup};
use crate::timeseries::DailySeries;

/// Front door to the external providers.
///
/// Per-symbol calls are independent and fanned out concurrently; each result
/// is merged into an immutable map afterwards. Split-provider failures
/// become [`SplitLookup::Unavailable`] (the fail-open default, logged) and
/// classifier failures become [`ClassifiedCurrency::Defaulted`], so the
/// pipeline always sees a typed outcome rather than a silent substitution.
pub struct MarketDataService {
    price_provider: Arc<dyn PriceProviderTrait>,
    fx_provider: Arc<dyn FxRateProviderTrait>,
    split_provider: Arc<dyn SplitProviderTrait>,
    currency_classifier: Arc<dyn CurrencyClassifierTrait>,
}

impl MarketDataService {
    pub fn new(
        price_provider: Arc<dyn PriceProviderTrait>,
        fx_provider: Arc<dyn FxRateProviderTrait>,
        split_provider: Arc<dyn SplitProviderTrait>,
        currency_classifier: Arc<dyn CurrencyClassifierTrait>,
    ) -> Self {
        Self {
            price_provider,
            fx_provider,
            split_provider,
            currency_classifier,
        }
    }

    /// Fetches split events per symbol, normalizes their effective dates to
    /// the exchange's local calendar, restricts them to the ledger's date
    /// window, and sorts by effective date.
    ///
    /// A feed delivering an invalid ratio makes that symbol's whole history
    /// `Unavailable` rather than adjusting against a partial set of splits.
    pub async fn fetch_splits(
        &self,
        symbols: &[String],
        window_start: NaiveDate,
        window_end: NaiveDate,
        exchange_zone: Tz,
    ) -> HashMap<String, SplitLookup> {
        let lookups = join_all(symbols.iter().map(|symbol| {
            let provider = Arc::clone(&self.split_provider);
            async move {
                let raw = match provider.splits(symbol).await {
                    Ok(raw) => raw,
                    Err(e) => {
                        warn!("Split lookup failed for {}: {}", symbol, e);
                        return (symbol.clone(), SplitLookup::Unavailable);
                    }
                };
                let mut events = Vec::with_capacity(raw.len());
                for split in raw {
                    match SplitEvent::from_provider_timestamp(
                        split.symbol,
                        split.timestamp,
                        split.ratio,
                        exchange_zone,
                    ) {
                        Ok(event) => events.push(event),
                        Err(e) => {
                            warn!("Rejecting split history for {}: {}", symbol, e);
                            return (symbol.clone(), SplitLookup::Unavailable);
                        }
                    }
                }
                events.retain(|e| {
                    e.effective_date >= window_start && e.effective_date <= window_end
                });
                events.sort_by_key(|e| e.effective_date);
                (symbol.clone(), SplitLookup::Confirmed(events))
            }
        }))
        .await;
        lookups.into_iter().collect()
    }

    /// Resolves each symbol's native trading currency, substituting
    /// `fallback` as a typed `Defaulted` outcome when the classifier fails.
    pub async fn classify_currencies(
        &self,
        symbols: &[String],
        fallback: &str,
    ) -> HashMap<String, ClassifiedCurrency> {
        let classifications = join_all(symbols.iter().map(|symbol| {
            let classifier = Arc::clone(&self.currency_classifier);
            async move {
                match classifier.currency(symbol).await {
                    Ok(code) => (symbol.clone(), ClassifiedCurrency::Classified(code)),
                    Err(e) => {
                        warn!(
                            "Currency classification failed for {}: {}; recording {} as a default",
                            symbol, e, fallback
                        );
                        (
                            symbol.clone(),
                            ClassifiedCurrency::Defaulted(fallback.to_string()),
                        )
                    }
                }
            }
        }))
        .await;
        classifications.into_iter().collect()
    }

    pub async fn fetch_prices(
        &self,
        symbols: &HashSet<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashMap<String, DailySeries>> {
        self.price_provider.daily_closes(symbols, start, end).await
    }

    pub async fn fetch_fx_rates(
        &self,
        currencies: &HashSet<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FxRateTable> {
        self.fx_provider.daily_usd_rates(currencies, start, end).await
    }
}
