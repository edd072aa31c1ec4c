//! One full dashboard pass: every series, assembled into a single report.
//!
//! Flow:
//!   full table ──► lifecycle annotation ──► churn series
//!   full table ──► country/date filter  ──► sales, product, customer series
//!   full table ──► sales by country

use crate::{
    charts::{self, CountrySales, CustomerFrequency, DailyValue, HistogramBin,
             MonthlyValue, ProductQuantity, ProductSales},
    config::DashboardConfig,
    error::DashResult,
    event::PurchaseEvent,
    filter::{self, DateRange, Selection},
    lifecycle::{self, CycleBucket, LifecycleOrder, MonthlyCount},
    loader::{purchase_events, InvoiceLine},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub selection:       Selection,
    /// The date range actually applied, None when the table has no dates.
    pub date_range:      Option<DateRange>,
    pub country_options: Vec<String>,
    pub product_options: Vec<String>,
    pub total_lines:     usize,
    pub filtered_lines:  usize,
    /// Lines kept without an InvoiceDate; left out of the lifecycle and dated series.
    pub undated_lines:   usize,

    // Sales
    pub sales_over_time: Vec<DailyValue>,
    pub monthly_sales:   Vec<MonthlyValue>,

    // Products
    pub top_products:     Vec<ProductQuantity>,
    pub sales_by_product: Vec<ProductSales>,

    // Customers
    pub customer_purchase_frequency: Vec<CustomerFrequency>,
    pub frequency_histogram:         Vec<HistogramBin>,
    pub average_order_value:         Vec<DailyValue>,
    pub monthly_customers:           Vec<MonthlyCount>,

    // Lifecycle (always over the full table)
    pub monthly_churned_customers: Vec<MonthlyCount>,
    pub churned_customers:         usize,
    pub lifecycle_overview:        Vec<CycleBucket>,

    // Geography (always over the full table)
    pub sales_by_country: Vec<CountrySales>,
}

impl DashboardReport {
    pub fn build(
        lines: &[InvoiceLine],
        config: &DashboardConfig,
        selection: &Selection,
    ) -> DashResult<Self> {
        let date_range = selection.dates.or_else(|| DateRange::covering(lines));

        let filtered = match &date_range {
            Some(range) => filter::filter_lines(lines, &selection.country, range),
            None        => Vec::new(),
        };

        let (dated, undated): (Vec<PurchaseEvent>, Vec<PurchaseEvent>) =
            purchase_events(lines).into_iter().partition(|e| e.timestamp.is_some());
        if !undated.is_empty() {
            log::warn!(
                "report: {} undated lines left out of the lifecycle pass (first row {})",
                undated.len(), undated[0].row,
            );
        }

        let annotated = lifecycle::annotate(&dated, &config.lifecycle, LifecycleOrder::CustomerTime)?;

        let customer_purchase_frequency = charts::customer_purchase_frequency(&filtered);
        let frequency_histogram =
            charts::frequency_histogram(&customer_purchase_frequency, config.charts.frequency_bins);

        let report = Self {
            selection: selection.clone(),
            date_range,
            country_options: filter::country_options(lines),
            product_options: filter::product_options(lines),
            total_lines: lines.len(),
            filtered_lines: filtered.len(),
            undated_lines: undated.len(),

            sales_over_time: charts::sales_over_time(&filtered),
            monthly_sales:   charts::monthly_sales(&filtered),

            top_products:     charts::top_products(&filtered, config.charts.top_products),
            sales_by_product: charts::sales_by_product(&filtered, &selection.product),

            customer_purchase_frequency,
            frequency_histogram,
            average_order_value: charts::average_order_value(&filtered),
            monthly_customers:   charts::monthly_customers(&filtered),

            monthly_churned_customers: lifecycle::monthly_churned_customers(&annotated),
            churned_customers:         lifecycle::churned_customer_count(&annotated),
            lifecycle_overview:        lifecycle::lifecycle_overview(&annotated),

            sales_by_country: charts::sales_by_country(lines),
        };

        log::info!(
            "report: {} of {} lines selected, {} churned customers",
            report.filtered_lines, report.total_lines, report.churned_customers,
        );
        Ok(report)
    }
}
