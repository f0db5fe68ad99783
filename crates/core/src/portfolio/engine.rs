use chrono::{NaiveDate, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::errors::{Result, ValidationError};
use crate::fx::{ClassifiedCurrency, CurrencyConverter};
use crate::holdings::{calculate_daily_holdings, latest_holdings_snapshot};
use crate::ledger::{normalize_ledger, RawTransaction, Transaction};
use crate::market_data::MarketDataService;
use crate::returns::{calculate_returns, XirrFailure, XirrOutcome};
use crate::settings::EngineSettings;
use crate::splits::adjust_for_splits;
use crate::timeseries::{align_series, DailySeries};
use crate::valuation::{
    calculate_portfolio_values, convert_transactions, ConvertedTransaction, DailyPortfolioValue,
};

/// Everything one valuation run produces.
///
/// Degraded inputs never disappear: symbols valued without confirmed split
/// history, symbols with no price data, and defaulted currency
/// classifications are all carried alongside the numbers they affected.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioReport {
    pub as_of: NaiveDate,
    pub base_currency: String,
    /// Daily portfolio value series, oldest first.
    pub valuations: Vec<DailyPortfolioValue>,
    /// Net position per symbol on the most recent holdings date.
    pub latest_holdings: HashMap<String, Decimal>,
    /// Money-weighted return per symbol, success or typed failure.
    pub returns: HashMap<String, XirrOutcome>,
    /// Ledger transactions restated in the base and display currencies.
    pub converted_transactions: Vec<ConvertedTransaction>,
    /// How each symbol's native currency was resolved this run.
    pub currency_classifications: HashMap<String, ClassifiedCurrency>,
    /// Symbols valued without confirmed split history (fail-open).
    pub unconfirmed_split_symbols: Vec<String>,
    /// Symbols excluded from valuation for lack of any price data.
    pub unpriced_symbols: Vec<String>,
}

/// Orchestrates the valuation pipeline: normalize the ledger, adjust for
/// splits, build holdings, align market data, value the portfolio, and
/// compute per-symbol returns.
///
/// Stages hand each other explicit values; nothing is cached between runs,
/// so every run re-resolves splits and currency classifications.
pub struct ValuationEngine {
    market_data: Arc<MarketDataService>,
    settings: EngineSettings,
}

impl ValuationEngine {
    pub fn new(market_data: Arc<MarketDataService>, settings: EngineSettings) -> Self {
        Self {
            market_data,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Runs the pipeline valued as of today (UTC calendar).
    pub async fn run(&self, rows: Vec<RawTransaction>) -> Result<PortfolioReport> {
        self.run_as_of(rows, Utc::now().date_naive()).await
    }

    /// Runs the pipeline valued as of an explicit date. Transactions dated
    /// after `as_of` are ignored by the holdings stage.
    pub async fn run_as_of(
        &self,
        rows: Vec<RawTransaction>,
        as_of: NaiveDate,
    ) -> Result<PortfolioReport> {
        if rows.is_empty() {
            return Err(
                ValidationError::InvalidInput("ledger contains no transactions".to_string())
                    .into(),
            );
        }
        let base = self.settings.base_currency.clone();
        let normalized = normalize_ledger(rows, &base)?;
        // One cut-off for every stage: a trade after the valuation date must
        // influence neither holdings nor cash-flow schedules.
        let total = normalized.len();
        let ledger: Vec<Transaction> = normalized
            .into_iter()
            .filter(|tx| tx.trade_date() <= as_of)
            .collect();
        if ledger.is_empty() {
            return Err(ValidationError::InvalidInput(format!(
                "no transactions dated on or before {}",
                as_of
            ))
            .into());
        }
        if ledger.len() < total {
            debug!(
                "Ignoring {} transactions dated after the valuation date {}",
                total - ledger.len(),
                as_of
            );
        }
        let first_trade = ledger
            .first()
            .map(Transaction::trade_date)
            .expect("ledger is non-empty");

        let mut symbols: Vec<String> = ledger
            .iter()
            .map(|tx| tx.symbol.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        symbols.sort();
        debug!(
            "Valuing {} symbols over {}..{} in {}",
            symbols.len(),
            first_trade,
            as_of,
            base
        );

        let split_lookups = self
            .market_data
            .fetch_splits(
                &symbols,
                first_trade,
                as_of,
                self.settings.exchange_time_zone,
            )
            .await;
        let adjusted = adjust_for_splits(&ledger, &split_lookups);

        let classifications = self
            .market_data
            .classify_currencies(&symbols, &base)
            .await;
        // Symbols whose classification defaulted are excluded entirely when
        // the policy rejects defaults; their return outcome records why.
        let mut returns: HashMap<String, XirrOutcome> = HashMap::new();
        let mut currency_by_symbol: HashMap<String, String> = HashMap::new();
        for (symbol, classification) in &classifications {
            if classification.is_defaulted() && !self.settings.accept_defaulted_currency {
                warn!(
                    "Excluding {} from valuation: currency classification defaulted to {}",
                    symbol,
                    classification.code()
                );
                returns.insert(
                    symbol.clone(),
                    XirrOutcome::Failed(XirrFailure::UnclassifiedCurrency(symbol.clone())),
                );
            } else {
                currency_by_symbol.insert(symbol.clone(), classification.code().to_string());
            }
        }

        // The classification is authoritative for a symbol's native
        // currency; restamp transactions so trade-date conversions and the
        // terminal flow agree on the same currency.
        let mut transactions = adjusted.transactions;
        for tx in &mut transactions {
            if let Some(code) = currency_by_symbol.get(&tx.symbol) {
                tx.currency = code.clone();
            }
        }

        let holdings = calculate_daily_holdings(&transactions, as_of);
        let latest_holdings = latest_holdings_snapshot(&holdings);

        let classified_symbols: HashSet<String> = currency_by_symbol.keys().cloned().collect();
        let prices = self
            .market_data
            .fetch_prices(&classified_symbols, first_trade, as_of)
            .await?;
        let mut unpriced_symbols: Vec<String> = classified_symbols
            .iter()
            .filter(|symbol| {
                prices
                    .get(symbol.as_str())
                    .map_or(true, DailySeries::is_empty)
            })
            .cloned()
            .collect();
        unpriced_symbols.sort();
        for symbol in &unpriced_symbols {
            warn!("No price data for {}; excluding it from valuation", symbol);
        }

        let mut required_currencies: HashSet<String> = self
            .settings
            .display_currencies
            .iter()
            .cloned()
            .collect();
        required_currencies.extend(currency_by_symbol.values().cloned());
        required_currencies.remove(&base);
        let fx_table = self
            .market_data
            .fetch_fx_rates(&required_currencies, first_trade, as_of)
            .await?;

        let valuation_holdings: HashMap<String, DailySeries> = holdings
            .iter()
            .filter(|(symbol, _)| {
                currency_by_symbol.contains_key(*symbol)
                    && !unpriced_symbols.contains(*symbol)
            })
            .map(|(symbol, series)| (symbol.clone(), series.clone()))
            .collect();
        let aligned = align_series(
            &valuation_holdings,
            &prices,
            &fx_table,
            &required_currencies,
            &base,
        );
        let valuations = calculate_portfolio_values(&aligned, &currency_by_symbol, &self.settings)?;

        let converter = CurrencyConverter::new(fx_table, base.clone());
        let converted_transactions = convert_transactions(
            &transactions,
            &converter,
            &self.settings.display_currencies,
        );
        // Closed positions need no terminal price, so unpriced symbols still
        // go through the return computation and fail only when a terminal
        // price is actually required.
        returns.extend(calculate_returns(
            &transactions,
            &prices,
            &converter,
            &currency_by_symbol,
            as_of,
        ));

        Ok(PortfolioReport {
            as_of,
            base_currency: base,
            valuations,
            latest_holdings,
            returns,
            converted_transactions,
            currency_classifications: classifications,
            unconfirmed_split_symbols: adjusted.unconfirmed_symbols,
            unpriced_symbols,
        })
    }
}
