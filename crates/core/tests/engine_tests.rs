use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use folioval_core::errors::{Error, Result};
use folioval_core::fx::FxRateTable;
use folioval_core::ledger::RawTransaction;
use folioval_core::market_data::{
    CurrencyClassifierTrait, FxRateProviderTrait, MarketDataError, MarketDataService,
    PriceProviderTrait, SplitProviderTrait,
};
use folioval_core::returns::{XirrFailure, XirrOutcome};
use folioval_core::splits::ProviderSplit;
use folioval_core::timeseries::DailySeries;
use folioval_core::{EngineSettings, ValuationEngine};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn provider_split(symbol: &str, timestamp: DateTime<Utc>, ratio: Decimal) -> ProviderSplit {
    ProviderSplit {
        symbol: symbol.to_string(),
        timestamp,
        ratio,
    }
}

fn buy(symbol: &str, date: NaiveDate, quantity: Decimal, price: Decimal) -> RawTransaction {
    RawTransaction {
        symbol: symbol.to_string(),
        date_time: None,
        date: Some(date),
        quantity,
        trade_price: price,
        proceeds: None,
        currency: None,
    }
}

struct MockPriceProvider {
    closes: HashMap<String, Vec<(NaiveDate, Decimal)>>,
}

#[async_trait]
impl PriceProviderTrait for MockPriceProvider {
    async fn daily_closes(
        &self,
        symbols: &HashSet<String>,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<HashMap<String, DailySeries>> {
        Ok(self
            .closes
            .iter()
            .filter(|(symbol, _)| symbols.contains(*symbol))
            .map(|(symbol, observations)| {
                (
                    symbol.clone(),
                    DailySeries::from_observations(observations.clone()),
                )
            })
            .collect())
    }
}

struct MockFxProvider {
    rates: Vec<(String, NaiveDate, Decimal)>,
}

#[async_trait]
impl FxRateProviderTrait for MockFxProvider {
    async fn daily_usd_rates(
        &self,
        currencies: &HashSet<String>,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<FxRateTable> {
        let mut table = FxRateTable::new();
        for (currency, date, rate) in &self.rates {
            if currencies.contains(currency) {
                table.insert_rate(currency.clone(), *date, *rate)?;
            }
        }
        Ok(table)
    }
}

struct MockSplitProvider {
    splits: HashMap<String, Vec<ProviderSplit>>,
    failing: HashSet<String>,
}

#[async_trait]
impl SplitProviderTrait for MockSplitProvider {
    async fn splits(&self, symbol: &str) -> Result<Vec<ProviderSplit>> {
        if self.failing.contains(symbol) {
            return Err(Error::MarketData(MarketDataError::ProviderError(format!(
                "split feed down for {}",
                symbol
            ))));
        }
        Ok(self.splits.get(symbol).cloned().unwrap_or_default())
    }
}

struct MockClassifier {
    currencies: HashMap<String, String>,
}

#[async_trait]
impl CurrencyClassifierTrait for MockClassifier {
    async fn currency(&self, symbol: &str) -> Result<String> {
        self.currencies.get(symbol).cloned().ok_or_else(|| {
            Error::MarketData(MarketDataError::NoData(format!(
                "no listing metadata for {}",
                symbol
            )))
        })
    }
}

struct Fixture {
    closes: HashMap<String, Vec<(NaiveDate, Decimal)>>,
    rates: Vec<(String, NaiveDate, Decimal)>,
    splits: HashMap<String, Vec<ProviderSplit>>,
    failing_splits: HashSet<String>,
    currencies: HashMap<String, String>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            closes: HashMap::new(),
            rates: vec![
                ("INR".to_string(), d(2023, 1, 16), dec!(83)),
                ("SGD".to_string(), d(2023, 1, 16), dec!(1.35)),
            ],
            splits: HashMap::new(),
            failing_splits: HashSet::new(),
            currencies: HashMap::new(),
        }
    }
}

impl Fixture {
    fn engine(self, settings: EngineSettings) -> ValuationEngine {
        let service = MarketDataService::new(
            Arc::new(MockPriceProvider {
                closes: self.closes,
            }),
            Arc::new(MockFxProvider { rates: self.rates }),
            Arc::new(MockSplitProvider {
                splits: self.splits,
                failing: self.failing_splits,
            }),
            Arc::new(MockClassifier {
                currencies: self.currencies,
            }),
        );
        ValuationEngine::new(Arc::new(service), settings)
    }
}

#[tokio::test]
async fn split_adjusted_single_position_end_to_end() {
    let mut fixture = Fixture::default();
    // Prices on a post-split basis, as a split-adjusted feed delivers them.
    fixture.closes.insert(
        "AAPL".to_string(),
        vec![(d(2023, 1, 16), dec!(50)), (d(2024, 1, 16), dec!(60))],
    );
    // 16:00 New York on 2024-01-12.
    fixture.splits.insert(
        "AAPL".to_string(),
        vec![provider_split(
            "AAPL",
            Utc.with_ymd_and_hms(2024, 1, 12, 21, 0, 0).unwrap(),
            dec!(2),
        )],
    );
    fixture
        .currencies
        .insert("AAPL".to_string(), "USD".to_string());

    let engine = fixture.engine(EngineSettings::default());
    let report = engine
        .run_as_of(
            vec![buy("AAPL", d(2023, 1, 16), dec!(10), dec!(100))],
            d(2024, 1, 16),
        )
        .await
        .unwrap();

    // 10 shares bought before the 2-for-1 split are 20 shares today.
    assert_eq!(report.latest_holdings["AAPL"], dec!(20));

    let first = report.valuations.first().unwrap();
    let last = report.valuations.last().unwrap();
    assert_eq!(first.valuation_date, d(2023, 1, 16));
    assert_eq!(first.base_value, dec!(1000));
    assert_eq!(last.valuation_date, d(2024, 1, 16));
    assert_eq!(last.base_value, dec!(1200));
    assert_eq!(last.display_values["INR"], dec!(99600));
    assert_eq!(last.display_values["SGD"], dec!(1620.00));

    // Cost basis is unchanged by the adjustment (20 x 50 = 10 x 100), so the
    // return is the plain 20% gain annualized over roughly one year.
    let rate = report.returns["AAPL"].rate().unwrap();
    assert!(
        rate > dec!(0.15) && rate < dec!(0.25),
        "rate was {}",
        rate
    );

    assert!(report.unconfirmed_split_symbols.is_empty());
    assert!(report.unpriced_symbols.is_empty());
}

#[tokio::test]
async fn foreign_positions_pivot_through_the_base_currency() {
    let mut fixture = Fixture::default();
    fixture.closes.insert(
        "D05.SI".to_string(),
        vec![(d(2023, 1, 16), dec!(25)), (d(2024, 1, 16), dec!(27))],
    );
    fixture
        .currencies
        .insert("D05.SI".to_string(), "SGD".to_string());

    let engine = fixture.engine(EngineSettings::default());
    let report = engine
        .run_as_of(
            vec![buy("D05.SI", d(2023, 1, 16), dec!(100), dec!(25))],
            d(2024, 1, 16),
        )
        .await
        .unwrap();

    let last = report.valuations.last().unwrap();
    // 100 x 27 SGD at 1.35 SGD per USD.
    assert_eq!(last.base_value, dec!(2000));
    assert_eq!(last.display_values["SGD"], dec!(2700.00));
    assert_eq!(last.display_values["INR"], dec!(166000));

    // The trade itself is restated at its trade-date rate.
    let converted = report
        .converted_transactions
        .iter()
        .find(|tx| tx.symbol == "D05.SI")
        .unwrap();
    assert_eq!(converted.currency, "SGD");
    assert_eq!(converted.proceeds, dec!(2500));
    assert_eq!(converted.base_proceeds.round_dp(2), dec!(1851.85));
}

#[tokio::test]
async fn unavailable_split_history_is_fail_open_and_reported() {
    let mut fixture = Fixture::default();
    fixture.closes.insert(
        "AAPL".to_string(),
        vec![(d(2023, 1, 16), dec!(100)), (d(2024, 1, 16), dec!(110))],
    );
    fixture.failing_splits.insert("AAPL".to_string());
    fixture
        .currencies
        .insert("AAPL".to_string(), "USD".to_string());

    let engine = fixture.engine(EngineSettings::default());
    let report = engine
        .run_as_of(
            vec![buy("AAPL", d(2023, 1, 16), dec!(10), dec!(100))],
            d(2024, 1, 16),
        )
        .await
        .unwrap();

    assert_eq!(report.unconfirmed_split_symbols, vec!["AAPL".to_string()]);
    // Valued as-is, without adjustment.
    assert_eq!(report.latest_holdings["AAPL"], dec!(10));
    assert_eq!(report.valuations.last().unwrap().base_value, dec!(1100));
}

#[tokio::test]
async fn configured_exchange_zone_decides_the_split_mask() {
    // 02:00 UTC on 2023-01-17 is still 2023-01-16 in New York but already
    // 2023-01-17 in Tokyo. A trade on 2023-01-16 is adjusted only when the
    // configured zone puts the split on the later calendar day.
    let split_ts = Utc.with_ymd_and_hms(2023, 1, 17, 2, 0, 0).unwrap();

    let mut reports = Vec::new();
    for zone in [chrono_tz::America::New_York, chrono_tz::Asia::Tokyo] {
        let mut fixture = Fixture::default();
        fixture.closes.insert(
            "AAPL".to_string(),
            vec![(d(2023, 1, 16), dec!(50)), (d(2024, 1, 16), dec!(60))],
        );
        fixture.splits.insert(
            "AAPL".to_string(),
            vec![provider_split("AAPL", split_ts, dec!(2))],
        );
        fixture
            .currencies
            .insert("AAPL".to_string(), "USD".to_string());

        let engine =
            fixture.engine(EngineSettings::default().with_exchange_time_zone(zone));
        let report = engine
            .run_as_of(
                vec![buy("AAPL", d(2023, 1, 16), dec!(10), dec!(100))],
                d(2024, 1, 16),
            )
            .await
            .unwrap();
        reports.push(report);
    }

    // New York: split effective 2023-01-16, trade not strictly before it.
    assert_eq!(reports[0].latest_holdings["AAPL"], dec!(10));
    // Tokyo: split effective 2023-01-17, trade adjusted.
    assert_eq!(reports[1].latest_holdings["AAPL"], dec!(20));
}

#[tokio::test]
async fn invalid_split_ratio_marks_the_history_unconfirmed() {
    let mut fixture = Fixture::default();
    fixture.closes.insert(
        "AAPL".to_string(),
        vec![(d(2023, 1, 16), dec!(100)), (d(2024, 1, 16), dec!(110))],
    );
    fixture.splits.insert(
        "AAPL".to_string(),
        vec![provider_split(
            "AAPL",
            Utc.with_ymd_and_hms(2023, 6, 1, 21, 0, 0).unwrap(),
            Decimal::ZERO,
        )],
    );
    fixture
        .currencies
        .insert("AAPL".to_string(), "USD".to_string());

    let engine = fixture.engine(EngineSettings::default());
    let report = engine
        .run_as_of(
            vec![buy("AAPL", d(2023, 1, 16), dec!(10), dec!(100))],
            d(2024, 1, 16),
        )
        .await
        .unwrap();

    assert_eq!(report.unconfirmed_split_symbols, vec!["AAPL".to_string()]);
    assert_eq!(report.latest_holdings["AAPL"], dec!(10));
}

#[tokio::test]
async fn transactions_after_the_valuation_date_touch_nothing() {
    let mut fixture = Fixture::default();
    fixture.closes.insert(
        "AAPL".to_string(),
        vec![(d(2023, 1, 16), dec!(100)), (d(2024, 1, 16), dec!(110))],
    );
    fixture
        .currencies
        .insert("AAPL".to_string(), "USD".to_string());

    let engine = fixture.engine(EngineSettings::default());
    let report = engine
        .run_as_of(
            vec![
                buy("AAPL", d(2023, 1, 16), dec!(10), dec!(100)),
                // Dated after the valuation date: no holdings, no cash flow.
                buy("AAPL", d(2024, 2, 1), dec!(100), dec!(110)),
            ],
            d(2024, 1, 16),
        )
        .await
        .unwrap();

    assert_eq!(report.latest_holdings["AAPL"], dec!(10));
    assert_eq!(report.valuations.last().unwrap().base_value, dec!(1100));
    assert_eq!(report.converted_transactions.len(), 1);
    // Flows: -1000, then a 1100 terminal inflow one year later.
    let rate = report.returns["AAPL"].rate().unwrap();
    assert!(rate > dec!(0.05) && rate < dec!(0.15), "rate was {}", rate);
}

#[tokio::test]
async fn ledger_entirely_after_the_valuation_date_is_rejected() {
    let mut fixture = Fixture::default();
    fixture
        .currencies
        .insert("AAPL".to_string(), "USD".to_string());

    let engine = fixture.engine(EngineSettings::default());
    let err = engine
        .run_as_of(
            vec![buy("AAPL", d(2024, 2, 1), dec!(10), dec!(100))],
            d(2024, 1, 16),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn defaulted_currency_classification_excludes_the_symbol_by_default() {
    let mut fixture = Fixture::default();
    fixture.closes.insert(
        "MYSTERY".to_string(),
        vec![(d(2023, 1, 16), dec!(10))],
    );
    // Classifier has no entry for MYSTERY, so the lookup fails.

    let engine = fixture.engine(EngineSettings::default());
    let report = engine
        .run_as_of(
            vec![buy("MYSTERY", d(2023, 1, 16), dec!(1), dec!(10))],
            d(2024, 1, 16),
        )
        .await
        .unwrap();

    assert!(report.currency_classifications["MYSTERY"].is_defaulted());
    assert!(report.valuations.is_empty());
    assert_eq!(
        report.returns["MYSTERY"],
        XirrOutcome::Failed(XirrFailure::UnclassifiedCurrency("MYSTERY".to_string()))
    );
}

#[tokio::test]
async fn defaulted_currency_classification_can_be_accepted_by_policy() {
    let mut fixture = Fixture::default();
    fixture.closes.insert(
        "MYSTERY".to_string(),
        vec![(d(2023, 1, 16), dec!(10)), (d(2024, 1, 16), dec!(11))],
    );

    let settings = EngineSettings::default().with_accept_defaulted_currency(true);
    let engine = fixture.engine(settings);
    let report = engine
        .run_as_of(
            vec![buy("MYSTERY", d(2023, 1, 16), dec!(1), dec!(10))],
            d(2024, 1, 16),
        )
        .await
        .unwrap();

    // Valued in the base currency under the accepted default.
    assert_eq!(report.valuations.last().unwrap().base_value, dec!(11));
    assert!(report.returns["MYSTERY"].rate().is_some());
}

#[tokio::test]
async fn unpriced_open_position_is_excluded_but_does_not_abort_the_run() {
    let mut fixture = Fixture::default();
    fixture.closes.insert(
        "AAPL".to_string(),
        vec![(d(2023, 1, 16), dec!(100)), (d(2024, 1, 16), dec!(110))],
    );
    fixture
        .currencies
        .insert("AAPL".to_string(), "USD".to_string());
    fixture
        .currencies
        .insert("GHOST".to_string(), "USD".to_string());
    // No GHOST prices at all.

    let engine = fixture.engine(EngineSettings::default());
    let report = engine
        .run_as_of(
            vec![
                buy("AAPL", d(2023, 1, 16), dec!(10), dec!(100)),
                buy("GHOST", d(2023, 1, 16), dec!(5), dec!(20)),
            ],
            d(2024, 1, 16),
        )
        .await
        .unwrap();

    assert_eq!(report.unpriced_symbols, vec!["GHOST".to_string()]);
    // The valuation covers AAPL alone; GHOST's open position cannot price
    // its terminal flow, recorded as a typed failure.
    assert_eq!(report.valuations.last().unwrap().base_value, dec!(1100));
    assert_eq!(
        report.returns["GHOST"],
        XirrOutcome::Failed(XirrFailure::MissingPrice("GHOST".to_string()))
    );
    assert!(report.returns["AAPL"].rate().is_some());
    // The snapshot still reflects the full ledger.
    assert_eq!(report.latest_holdings["GHOST"], dec!(5));
}

#[tokio::test]
async fn closed_position_return_survives_without_prices() {
    let mut fixture = Fixture::default();
    fixture
        .currencies
        .insert("FLIP".to_string(), "USD".to_string());
    // No prices; the position opens and closes inside the ledger.

    let engine = fixture.engine(EngineSettings::default());
    let report = engine
        .run_as_of(
            vec![
                buy("FLIP", d(2023, 1, 16), dec!(10), dec!(100)),
                buy("FLIP", d(2024, 1, 16), dec!(-10), dec!(120)),
            ],
            d(2024, 1, 16),
        )
        .await
        .unwrap();

    assert_eq!(report.unpriced_symbols, vec!["FLIP".to_string()]);
    let rate = report.returns["FLIP"].rate().unwrap();
    assert!(rate > dec!(0.15) && rate < dec!(0.25), "rate was {}", rate);
}

#[tokio::test]
async fn report_serializes_with_camel_case_keys() {
    let mut fixture = Fixture::default();
    fixture.closes.insert(
        "AAPL".to_string(),
        vec![(d(2023, 1, 16), dec!(100))],
    );
    fixture
        .currencies
        .insert("AAPL".to_string(), "USD".to_string());

    let engine = fixture.engine(EngineSettings::default());
    let report = engine
        .run_as_of(
            vec![buy("AAPL", d(2023, 1, 16), dec!(10), dec!(100))],
            d(2024, 1, 16),
        )
        .await
        .unwrap();

    let value = serde_json::to_value(&report).unwrap();
    assert!(value.get("latestHoldings").is_some());
    assert!(value.get("baseCurrency").is_some());
    let first_day = &value["valuations"][0];
    assert!(first_day.get("valuationDate").is_some());
    assert!(first_day.get("displayValues").is_some());
}

#[tokio::test]
async fn empty_ledger_is_rejected() {
    let engine = Fixture::default().engine(EngineSettings::default());
    let err = engine.run_as_of(vec![], d(2024, 1, 16)).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}
