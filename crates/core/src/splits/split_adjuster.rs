use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::HashMap;

use crate::ledger::Transaction;
use crate::splits::SplitLookup;

/// The split-adjusted ledger plus the symbols whose split history could not
/// be confirmed (valued as-is, under-adjustment risk).
#[derive(Debug, Clone)]
pub struct AdjustedLedger {
    pub transactions: Vec<Transaction>,
    pub unconfirmed_symbols: Vec<String>,
}

/// Rewrites historical transactions into post-split-equivalent units.
///
/// For every split, each transaction of that symbol dated strictly before the
/// split's effective date gets its quantity multiplied and its trade price
/// divided by the split ratio. Splits apply independently, each masked
/// against the transaction's ORIGINAL date, so a transaction predating two
/// splits of ratio 2 and 3 ends up adjusted by 6 regardless of application
/// order. Proceeds are recomputed once at the end and stored values
/// discarded.
///
/// Symbols whose lookup is `Unavailable` pass through unchanged (fail-open)
/// and are reported in `unconfirmed_symbols`.
pub fn adjust_for_splits(
    ledger: &[Transaction],
    lookups: &HashMap<String, SplitLookup>,
) -> AdjustedLedger {
    let mut transactions = ledger.to_vec();
    // Masks compare against the dates as recorded, never against dates that
    // an earlier split in the loop already touched.
    let original_dates: Vec<NaiveDate> = ledger.iter().map(|tx| tx.trade_date()).collect();

    let mut unconfirmed_symbols: Vec<String> = lookups
        .iter()
        .filter(|(_, lookup)| lookup.is_unavailable())
        .map(|(symbol, _)| symbol.clone())
        .collect();
    unconfirmed_symbols.sort();
    for symbol in &unconfirmed_symbols {
        warn!(
            "Split history unavailable for {}; valuing without adjustment (not confirmed split-free)",
            symbol
        );
    }

    for (symbol, lookup) in lookups {
        for event in lookup.events() {
            let mut adjusted_count = 0usize;
            for (idx, tx) in transactions.iter_mut().enumerate() {
                if tx.symbol == *symbol && original_dates[idx] < event.effective_date {
                    tx.quantity *= event.ratio;
                    tx.trade_price /= event.ratio;
                    adjusted_count += 1;
                }
            }
            debug!(
                "Applied {}-for-1 split of {} effective {} to {} transactions",
                event.ratio, symbol, event.effective_date, adjusted_count
            );
        }
    }

    for tx in &mut transactions {
        tx.recompute_proceeds();
    }

    AdjustedLedger {
        transactions,
        unconfirmed_symbols,
    }
}
