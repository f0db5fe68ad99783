//! Daily time-series primitives and the cross-series aligner.

mod aligner;
mod daily_series;

pub use aligner::{align_series, AlignedSeries};
pub use daily_series::DailySeries;
