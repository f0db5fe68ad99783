use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// A stock split for one symbol: `ratio` new shares replace one old share
/// (2 for a 2-for-1 split, 0.1 for a 1-for-10 reverse split).
///
/// The effective date is expressed in the exchange's local calendar. Provider
/// timestamps must go through [`SplitEvent::from_provider_timestamp`] so the
/// day boundary matches the one transaction dates are compared against;
/// skipping that normalization shifts the adjustment mask by a day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SplitEvent {
    pub symbol: String,
    pub effective_date: NaiveDate,
    pub ratio: Decimal,
}

impl SplitEvent {
    pub fn new(
        symbol: impl Into<String>,
        effective_date: NaiveDate,
        ratio: Decimal,
    ) -> Result<Self> {
        if ratio <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "split ratio must be positive, got {}",
                ratio
            ))
            .into());
        }
        Ok(Self {
            symbol: symbol.into(),
            effective_date,
            ratio,
        })
    }

    /// Builds a split from a provider's UTC timestamp, normalizing the
    /// effective date to the exchange's local calendar.
    pub fn from_provider_timestamp(
        symbol: impl Into<String>,
        timestamp: DateTime<Utc>,
        ratio: Decimal,
        exchange_zone: Tz,
    ) -> Result<Self> {
        Self::new(symbol, timestamp.with_timezone(&exchange_zone).date_naive(), ratio)
    }
}

/// A split as delivered by a provider: the effective time is still a UTC
/// timestamp, not yet normalized to any exchange calendar. Ratio validity is
/// the normalizer's concern, so this shape carries whatever the feed said.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSplit {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub ratio: Decimal,
}

/// Outcome of a split lookup for one symbol.
///
/// `Unavailable` means the provider could not answer; the adjuster treats it
/// as "no splits known" (fail-open) but the outcome stays distinguishable
/// from a confirmed empty history so callers can decide their own risk
/// tolerance.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitLookup {
    Confirmed(Vec<SplitEvent>),
    Unavailable,
}

impl SplitLookup {
    pub fn events(&self) -> &[SplitEvent] {
        match self {
            SplitLookup::Confirmed(events) => events,
            SplitLookup::Unavailable => &[],
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, SplitLookup::Unavailable)
    }
}
