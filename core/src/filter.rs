//! Row filters behind the dashboard's country, date and product selectors.

use crate::{
    error::{DashError, DashResult},
    loader::InvoiceLine,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Selector label meaning "no restriction".
pub const ALL: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountrySelection {
    #[default]
    All,
    Only(String),
}

impl CountrySelection {
    pub fn parse(label: &str) -> Self {
        if label == ALL { Self::All } else { Self::Only(label.to_string()) }
    }

    pub fn matches(&self, line: &InvoiceLine) -> bool {
        match self {
            Self::All           => true,
            Self::Only(country) => line.country.as_deref() == Some(country.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSelection {
    #[default]
    All,
    Only(String),
}

impl ProductSelection {
    pub fn parse(label: &str) -> Self {
        if label == ALL { Self::All } else { Self::Only(label.to_string()) }
    }

    pub fn matches(&self, line: &InvoiceLine) -> bool {
        match self {
            Self::All               => true,
            Self::Only(description) => &line.description == description,
        }
    }
}

/// Inclusive range between the midnight instants of `start` and `end`.
///
/// Lines stamped after 00:00 on `end` fall outside the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end:   NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> DashResult<Self> {
        if start > end {
            return Err(DashError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The min..max invoice date of the table, or None if no line has a date.
    pub fn covering(lines: &[InvoiceLine]) -> Option<Self> {
        let mut dates = lines.iter().filter_map(|l| l.invoice_date);
        let first = dates.next()?;
        let (min, max) = dates.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts)));
        Some(Self { start: min.date(), end: max.date() })
    }

    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        *ts >= midnight(self.start) && *ts <= midnight(self.end)
    }
}

/// Everything the sidebar selects.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub country: CountrySelection,
    /// None selects the full span of the table.
    pub dates:   Option<DateRange>,
    pub product: ProductSelection,
}

/// Lines matching the country and date selection. Product selection is not
/// applied here; only the sales-by-product series narrows by product.
pub fn filter_lines<'a>(
    lines: &'a [InvoiceLine],
    country: &CountrySelection,
    dates: &DateRange,
) -> Vec<&'a InvoiceLine> {
    lines
        .iter()
        .filter(|line| country.matches(line))
        .filter(|line| line.invoice_date.as_ref().is_some_and(|ts| dates.contains(ts)))
        .collect()
}

/// `"All"` followed by every distinct country, sorted.
pub fn country_options(lines: &[InvoiceLine]) -> Vec<String> {
    with_all(lines.iter().filter_map(|l| l.country.as_deref()))
}

/// `"All"` followed by every distinct description, sorted.
pub fn product_options(lines: &[InvoiceLine]) -> Vec<String> {
    with_all(lines.iter().map(|l| l.description.as_str()))
}

fn with_all<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let distinct: BTreeSet<&str> = values.collect();
    let mut options = Vec::with_capacity(distinct.len() + 1);
    options.push(ALL.to_string());
    options.extend(distinct.into_iter().map(str::to_string));
    options
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).unwrap_or(NaiveDateTime::MIN)
}
