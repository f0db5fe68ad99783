use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// One dated cash flow in the reporting currency. Outflows from the investor
/// (purchases) are negative, inflows (sales, terminal position value) are
/// positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Why a symbol's money-weighted return could not be computed.
///
/// Failures are values, not errors: one symbol failing never aborts the
/// others, and the caller sees exactly which precondition broke.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase", tag = "reason", content = "detail")]
pub enum XirrFailure {
    #[error("fewer than two cash flows")]
    InsufficientData,

    #[error("cash flows are all of one sign, no root exists")]
    NoSignChange,

    #[error("solver did not converge")]
    NonConvergent,

    #[error("no price observation for '{0}'")]
    MissingPrice(String),

    #[error("no FX rate for currency '{0}'")]
    MissingFxRate(String),

    #[error("unsupported currency '{0}'")]
    UnsupportedCurrency(String),

    #[error("native currency of '{0}' could not be classified")]
    UnclassifiedCurrency(String),
}

/// Per-symbol outcome of the money-weighted return computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome", content = "value")]
pub enum XirrOutcome {
    /// Annualized money-weighted rate of return (0.10 means 10% p.a.).
    Rate(Decimal),
    Failed(XirrFailure),
}

impl XirrOutcome {
    pub fn rate(&self) -> Option<Decimal> {
        match self {
            XirrOutcome::Rate(rate) => Some(*rate),
            XirrOutcome::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, XirrOutcome::Failed(_))
    }
}
