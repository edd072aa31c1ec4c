//! dash-runner: headless runner for the retail analytics dashboard.
//!
//! Usage:
//!   dash-runner --data data.csv
//!   dash-runner --data data.csv --country "United Kingdom" --from 2011-01-01 --to 2011-06-30
//!   dash-runner --data data.csv --product "WHITE METAL LANTERN" --json
//!   dash-runner --data data.csv --config dashboard.json --lenient-dates

use anyhow::Result;
use chrono::NaiveDate;
use lifecycle_core::{
    config::DashboardConfig,
    filter::{CountrySelection, DateRange, ProductSelection, Selection},
    loader::load_invoice_file,
    report::DashboardReport,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data = flag_value(&args, "--data").unwrap_or("data.csv");
    let json_mode = args.iter().any(|a| a == "--json");

    let mut config = match flag_value(&args, "--config") {
        Some(path) => DashboardConfig::load(path)?,
        None       => DashboardConfig::default(),
    };
    if args.iter().any(|a| a == "--lenient-dates") {
        config.loader.lenient_dates = true;
    }

    let selection = build_selection(&args)?;
    log::debug!("selection: {selection:?}");

    if !json_mode {
        println!("Retail dashboard — dash-runner");
        println!("  data:      {data}");
        println!("  country:   {}", flag_value(&args, "--country").unwrap_or("All"));
        println!("  product:   {}", flag_value(&args, "--product").unwrap_or("All"));
        println!();
    }

    let lines = load_invoice_file(data, &config.loader)?;
    let report = DashboardReport::build(&lines, &config, &selection)?;

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn build_selection(args: &[String]) -> Result<Selection> {
    let from = parse_date_arg(args, "--from")?;
    let to = parse_date_arg(args, "--to")?;

    let dates = match (from, to) {
        (Some(start), Some(end)) => Some(DateRange::new(start, end)?),
        (None, None)             => None,
        _ => anyhow::bail!("--from and --to must be given together"),
    };

    Ok(Selection {
        country: CountrySelection::parse(flag_value(args, "--country").unwrap_or("All")),
        dates,
        product: ProductSelection::parse(flag_value(args, "--product").unwrap_or("All")),
    })
}

fn print_summary(report: &DashboardReport) {
    println!("=== SELECTION ===");
    match &report.date_range {
        Some(range) => println!("  dates:          {} .. {}", range.start, range.end),
        None        => println!("  dates:          (no dated lines)"),
    }
    println!("  lines:          {} of {}", report.filtered_lines, report.total_lines);
    if report.undated_lines > 0 {
        println!("  undated lines:  {}", report.undated_lines);
    }
    println!("  countries:      {}", report.country_options.len().saturating_sub(1));
    println!("  products:       {}", report.product_options.len().saturating_sub(1));

    println!();
    println!("=== SALES ===");
    let total: f64 = report.sales_over_time.iter().map(|d| d.value).sum();
    println!("  total sales:    {total:.2}");
    println!("  trading days:   {}", report.sales_over_time.len());
    for m in &report.monthly_sales {
        println!("  {} | {:.2}", m.month, m.value);
    }

    println!();
    println!("=== TOP {} PRODUCTS ===", report.top_products.len());
    if report.top_products.is_empty() {
        println!("  (No products in selection)");
    }
    for p in &report.top_products {
        println!("  {:>8} | {} ({})", p.quantity, p.description, p.stock_code);
    }

    println!();
    println!("=== CUSTOMERS ===");
    println!("  customers:      {}", report.customer_purchase_frequency.len());
    for m in &report.monthly_customers {
        println!("  {} | {}", m.month, m.count);
    }

    println!();
    println!("=== LIFE CYCLE ===");
    println!("  churned customers: {}", report.churned_customers);
    for m in &report.monthly_churned_customers {
        println!("  {} | churned {}", m.month, m.count);
    }
    for b in &report.lifecycle_overview {
        println!("  position {:>2} | {} customers", b.cycle_position, b.customers);
    }

    println!();
    println!("=== SALES BY COUNTRY ===");
    for c in &report.sales_by_country {
        println!("  {:<24} {:.2}", c.country, c.sales);
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_date_arg(args: &[String], flag: &str) -> Result<Option<NaiveDate>> {
    flag_value(args, flag)
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map_err(|e| anyhow::anyhow!("{flag} expects YYYY-MM-DD, got '{v}': {e}"))
        })
        .transpose()
}
