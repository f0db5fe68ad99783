use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// A date-indexed series of daily observations.
///
/// Inserting twice for the same date keeps the later value, so duplicate
/// dates in provider output cannot corrupt a reindex join. Gap-filling is a
/// read-time concern: `reindex_ffill` projects the series onto an arbitrary
/// date index, inheriting the most recent earlier observation for dates
/// without a fresh one. Dates before the first observation stay undefined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySeries {
    observations: BTreeMap<NaiveDate, Decimal>,
}

impl DailySeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a series from raw observations, keeping the last value for
    /// any duplicated date.
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, Decimal)>,
    {
        let mut series = Self::new();
        for (date, value) in observations {
            series.insert(date, value);
        }
        series
    }

    /// Inserts an observation, overwriting any prior value for the date.
    pub fn insert(&mut self, date: NaiveDate, value: Decimal) {
        self.observations.insert(date, value);
    }

    pub fn get(&self, date: NaiveDate) -> Option<Decimal> {
        self.observations.get(&date).copied()
    }

    /// Returns the freshest observation on or before `date`.
    pub fn latest_on_or_before(&self, date: NaiveDate) -> Option<(NaiveDate, Decimal)> {
        self.observations
            .range(..=date)
            .next_back()
            .map(|(d, v)| (*d, *v))
    }

    pub fn first(&self) -> Option<(NaiveDate, Decimal)> {
        self.observations.iter().next().map(|(d, v)| (*d, *v))
    }

    pub fn last(&self) -> Option<(NaiveDate, Decimal)> {
        self.observations.iter().next_back().map(|(d, v)| (*d, *v))
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Decimal)> + '_ {
        self.observations.iter().map(|(d, v)| (*d, *v))
    }

    /// Projects the series onto `index`, forward-filling missing dates.
    /// Entries stay `None` for index dates with no prior observation.
    pub fn reindex_ffill(&self, index: &[NaiveDate]) -> Vec<Option<Decimal>> {
        index
            .iter()
            .map(|date| self.latest_on_or_before(*date).map(|(_, v)| v))
            .collect()
    }
}

/// Keeps the elements of `values` whose mask entry is true.
pub(crate) fn filter_by_mask<T: Clone>(values: &[T], keep: &[bool]) -> Vec<T> {
    values
        .iter()
        .zip(keep)
        .filter(|(_, keep)| **keep)
        .map(|(value, _)| value.clone())
        .collect()
}
