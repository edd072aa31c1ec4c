//! Chart series over the (usually filtered) invoice table.
//!
//! Each function returns the ordered points one dashboard chart plots.
//! Rendering is left to whoever consumes the series.

use crate::{
    filter::ProductSelection,
    lifecycle::MonthlyCount,
    loader::InvoiceLine,
    period::{fill_months, YearMonth},
    types::CustomerId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ── Series types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyValue {
    pub date:  NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyValue {
    pub month: YearMonth,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuantity {
    pub stock_code:  String,
    pub description: String,
    pub quantity:    i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSales {
    pub description: String,
    pub sales:       f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerFrequency {
    pub customer_id: CustomerId,
    pub frequency:   usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySales {
    pub country: String,
    pub sales:   f64,
}

// ── Sales ────────────────────────────────────────────────────────────────────

/// Total sales per calendar day. Days without lines are absent.
pub fn sales_over_time(lines: &[&InvoiceLine]) -> Vec<DailyValue> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for line in lines {
        if let Some(ts) = line.invoice_date {
            *totals.entry(ts.date()).or_default() += line.sales;
        }
    }
    totals.into_iter().map(|(date, value)| DailyValue { date, value }).collect()
}

/// Total sales per month, gap months reported as 0.
pub fn monthly_sales(lines: &[&InvoiceLine]) -> Vec<MonthlyValue> {
    let mut totals: BTreeMap<YearMonth, f64> = BTreeMap::new();
    for line in lines {
        if let Some(ts) = line.invoice_date {
            *totals.entry(YearMonth::of(&ts)).or_default() += line.sales;
        }
    }
    fill_months(&totals)
        .into_iter()
        .map(|(month, value)| MonthlyValue { month, value })
        .collect()
}

/// Mean line sales per calendar day.
pub fn average_order_value(lines: &[&InvoiceLine]) -> Vec<DailyValue> {
    let mut acc: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for line in lines {
        if let Some(ts) = line.invoice_date {
            let slot = acc.entry(ts.date()).or_default();
            slot.0 += line.sales;
            slot.1 += 1;
        }
    }
    acc.into_iter()
        .map(|(date, (sum, n))| DailyValue { date, value: sum / n as f64 })
        .collect()
}

/// Total sales per country over whatever table is passed in.
/// The dashboard passes the unfiltered table here.
pub fn sales_by_country(lines: &[InvoiceLine]) -> Vec<CountrySales> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for line in lines {
        if let Some(country) = line.country.as_deref() {
            *totals.entry(country).or_default() += line.sales;
        }
    }
    totals
        .into_iter()
        .map(|(country, sales)| CountrySales { country: country.to_string(), sales })
        .collect()
}

// ── Products ─────────────────────────────────────────────────────────────────

/// The `n` products with the largest total quantity.
/// Ties keep (stock_code, description) ascending order.
pub fn top_products(lines: &[&InvoiceLine], n: usize) -> Vec<ProductQuantity> {
    let mut totals: BTreeMap<(&str, &str), i64> = BTreeMap::new();
    for line in lines {
        *totals
            .entry((line.stock_code.as_str(), line.description.as_str()))
            .or_default() += line.quantity;
    }

    let mut ranked: Vec<ProductQuantity> = totals
        .into_iter()
        .map(|((stock_code, description), quantity)| ProductQuantity {
            stock_code:  stock_code.to_string(),
            description: description.to_string(),
            quantity,
        })
        .collect();
    ranked.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    ranked.truncate(n);
    ranked
}

/// Total sales per description, optionally narrowed to one product.
pub fn sales_by_product(lines: &[&InvoiceLine], selection: &ProductSelection) -> Vec<ProductSales> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for line in lines.iter().filter(|l| selection.matches(l)) {
        *totals.entry(line.description.as_str()).or_default() += line.sales;
    }
    totals
        .into_iter()
        .map(|(description, sales)| ProductSales { description: description.to_string(), sales })
        .collect()
}

// ── Customers ────────────────────────────────────────────────────────────────

/// Line count per customer, most frequent first. Lines without a customer
/// id are not counted.
pub fn customer_purchase_frequency(lines: &[&InvoiceLine]) -> Vec<CustomerFrequency> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for line in lines {
        if let Some(id) = line.customer_id.as_deref() {
            *counts.entry(id).or_default() += 1;
        }
    }

    let mut out: Vec<CustomerFrequency> = counts
        .into_iter()
        .map(|(id, frequency)| CustomerFrequency { customer_id: id.to_string(), frequency })
        .collect();
    out.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    out
}

/// Equal-width histogram of purchase frequencies over [min, max].
/// The last bin is closed on the right.
pub fn frequency_histogram(frequencies: &[CustomerFrequency], bins: usize) -> Vec<HistogramBin> {
    let (min, max) = match (
        frequencies.iter().map(|f| f.frequency).min(),
        frequencies.iter().map(|f| f.frequency).max(),
    ) {
        (Some(lo), Some(hi)) if bins > 0 => (lo as f64, hi as f64),
        _ => return Vec::new(),
    };

    if max == min {
        return vec![HistogramBin { lower: min, upper: max, count: frequencies.len() }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for f in frequencies {
        let idx = (((f.frequency as f64) - min) / width).floor() as usize;
        out[idx.min(bins - 1)].count += 1;
    }
    out
}

/// Distinct customers per month, gap months reported as 0.
pub fn monthly_customers(lines: &[&InvoiceLine]) -> Vec<MonthlyCount> {
    let mut seen: BTreeMap<YearMonth, BTreeSet<&str>> = BTreeMap::new();
    for line in lines {
        let Some(ts) = line.invoice_date else { continue };
        let ids = seen.entry(YearMonth::of(&ts)).or_default();
        if let Some(id) = line.customer_id.as_deref() {
            ids.insert(id);
        }
    }

    let counts: BTreeMap<YearMonth, usize> =
        seen.into_iter().map(|(m, ids)| (m, ids.len())).collect();
    fill_months(&counts)
        .into_iter()
        .map(|(month, count)| MonthlyCount { month, count })
        .collect()
}
