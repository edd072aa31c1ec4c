//! Calendar bucketing for monthly series.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A calendar month. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year:  i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        debug_assert!((1..=12).contains(&month), "month out of range: {month}");
        Self { year, month }
    }

    pub fn of(ts: &NaiveDateTime) -> Self {
        Self::new(ts.year(), ts.month())
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Expand a sparse month → value map into a contiguous series from its first
/// to its last month, filling holes with `V::default()`.
pub fn fill_months<V: Default + Clone>(sparse: &BTreeMap<YearMonth, V>) -> Vec<(YearMonth, V)> {
    let (first, last) = match (sparse.keys().next(), sparse.keys().next_back()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => return Vec::new(),
    };

    let mut out = Vec::new();
    let mut cursor = first;
    while cursor <= last {
        out.push((cursor, sparse.get(&cursor).cloned().unwrap_or_default()));
        cursor = cursor.next();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn december_rolls_into_next_year() {
        assert_eq!(YearMonth::new(2010, 12).next(), YearMonth::new(2011, 1));
    }

    #[test]
    fn fill_months_inserts_zero_buckets() {
        let mut sparse = BTreeMap::new();
        sparse.insert(YearMonth::new(2010, 11), 3usize);
        sparse.insert(YearMonth::new(2011, 2), 5usize);

        let filled = fill_months(&sparse);
        let values: Vec<usize> = filled.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![3, 0, 0, 5]);
        assert_eq!(filled[1].0.to_string(), "2010-12");
    }

    #[test]
    fn fill_months_empty_is_empty() {
        let sparse: BTreeMap<YearMonth, f64> = BTreeMap::new();
        assert!(fill_months(&sparse).is_empty());
    }
}
