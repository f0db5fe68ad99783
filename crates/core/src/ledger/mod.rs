//! Transaction ledger domain models and ingestion normalization.

mod ledger_model;

pub use ledger_model::{merge_sorted, normalize_ledger, RawTransaction, Transaction};
