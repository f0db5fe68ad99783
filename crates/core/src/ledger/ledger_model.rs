use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// Canonical ledger transaction, produced once at ingestion and treated as
/// read-only by every downstream stage.
///
/// `quantity` is signed: positive for buys, negative for sells. `proceeds`
/// is always `quantity * trade_price`; it is recomputed whenever quantity or
/// price change and never trusted as an independently stored value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub quantity: Decimal,
    pub trade_price: Decimal,
    pub proceeds: Decimal,
    pub currency: String,
}

impl Transaction {
    pub fn new(
        symbol: impl Into<String>,
        timestamp: DateTime<Utc>,
        quantity: Decimal,
        trade_price: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            quantity,
            trade_price,
            proceeds: quantity * trade_price,
            currency: currency.into(),
        }
    }

    /// Calendar day of the trade, intraday time discarded.
    pub fn trade_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Re-derives proceeds from the current quantity and price.
    pub fn recompute_proceeds(&mut self) {
        self.proceeds = self.quantity * self.trade_price;
    }
}

/// A ledger row as delivered by an external ingestion layer, before
/// normalization. Either a combined `date_time` or a bare `date` must be
/// present; stored proceeds are accepted but discarded in favor of the
/// recomputed value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub symbol: String,
    #[serde(default)]
    pub date_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub quantity: Decimal,
    pub trade_price: Decimal,
    #[serde(default)]
    pub proceeds: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl RawTransaction {
    /// Resolves the raw row into the canonical transaction shape.
    ///
    /// `fallback_currency` stands in when the row carries no currency; the
    /// symbol's real classification is still re-resolved per run by the
    /// currency classifier.
    pub fn normalize(self, fallback_currency: &str) -> Result<Transaction> {
        let naive = self
            .date_time
            .or_else(|| self.date.map(|d| d.and_hms_opt(0, 0, 0).unwrap()))
            .ok_or_else(|| ValidationError::MissingField("date or dateTime".to_string()))?;

        let currency = self
            .currency
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| fallback_currency.to_string());

        Ok(Transaction::new(
            self.symbol,
            Utc.from_utc_datetime(&naive),
            self.quantity,
            self.trade_price,
            currency,
        ))
    }
}

/// Normalizes a batch of raw rows into canonical transactions, sorted by
/// timestamp. A row missing both date fields fails the whole batch - that is
/// a ledger schema defect, not a per-row data-quality issue.
pub fn normalize_ledger(
    rows: Vec<RawTransaction>,
    fallback_currency: &str,
) -> Result<Vec<Transaction>> {
    let mut transactions = rows
        .into_iter()
        .map(|row| row.normalize(fallback_currency))
        .collect::<Result<Vec<_>>>()?;
    transactions.sort_by_key(|tx| tx.timestamp);
    Ok(transactions)
}

/// Merges several already-normalized ledgers into one chronological ledger.
pub fn merge_sorted(ledgers: Vec<Vec<Transaction>>) -> Vec<Transaction> {
    let mut merged: Vec<Transaction> = ledgers.into_iter().flatten().collect();
    merged.sort_by_key(|tx| tx.timestamp);
    merged
}
