//! Stock-split events and retroactive ledger adjustment.

mod split_adjuster;
mod split_model;

pub use split_adjuster::{adjust_for_splits, AdjustedLedger};
pub use split_model::{ProviderSplit, SplitEvent, SplitLookup};
