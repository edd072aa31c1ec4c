//! CSV loader for the invoice line table.
//!
//! Expected columns (any order, extras ignored):
//!   InvoiceNo, StockCode, Description, Quantity, InvoiceDate,
//!   UnitPrice, CustomerID, Country
//!
//! The source files are ISO-8859-1. Each byte is decoded to the code point of
//! the same value before the CSV parser sees it.

use crate::{
    config::LoaderConfig,
    error::{DashError, DashResult},
    event::PurchaseEvent,
    types::CustomerId,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::io::Read;

const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// One invoice line as loaded, with derived `sales`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub invoice_no:   String,
    pub stock_code:   String,
    pub description:  String,
    pub quantity:     i64,
    /// `None` only when the loader ran with `lenient_dates`.
    pub invoice_date: Option<NaiveDateTime>,
    pub unit_price:   f64,
    pub customer_id:  Option<CustomerId>,
    pub country:      Option<String>,
    pub sales:        f64,
}

struct Columns {
    invoice_no:   usize,
    stock_code:   usize,
    description:  usize,
    quantity:     usize,
    invoice_date: usize,
    unit_price:   usize,
    customer_id:  usize,
    country:      usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> DashResult<Self> {
        let find = |name: &str| -> DashResult<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DashError::MissingColumn { name: name.to_string() })
        };
        Ok(Self {
            invoice_no:   find("InvoiceNo")?,
            stock_code:   find("StockCode")?,
            description:  find("Description")?,
            quantity:     find("Quantity")?,
            invoice_date: find("InvoiceDate")?,
            unit_price:   find("UnitPrice")?,
            customer_id:  find("CustomerID")?,
            country:      find("Country")?,
        })
    }
}

/// Load invoice lines from a reader of ISO-8859-1 CSV bytes.
pub fn load_invoice_lines<R: Read>(mut reader: R, config: &LoaderConfig) -> DashResult<Vec<InvoiceLine>> {
    let delimiter = u8::try_from(config.delimiter)
        .map_err(|_| DashError::InvalidDelimiter { delimiter: config.delimiter })?;

    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;
    let bytes = raw.strip_prefix(UTF8_BOM).unwrap_or(&raw[..]);
    let text = decode_latin1(bytes);

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let columns = Columns::locate(csv_reader.headers()?)?;

    let mut lines = Vec::new();
    let mut bad_dates = 0usize;
    for result in csv_reader.records() {
        let record = result?;
        let line_no = record.position().map(|p| p.line()).unwrap_or(0);
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();

        let quantity = parse_quantity(field(columns.quantity))
            .ok_or_else(|| DashError::InvalidNumber {
                line:   line_no,
                column: "Quantity",
                value:  field(columns.quantity).to_string(),
            })?;
        let unit_price: f64 = field(columns.unit_price)
            .parse()
            .map_err(|_| DashError::InvalidNumber {
                line:   line_no,
                column: "UnitPrice",
                value:  field(columns.unit_price).to_string(),
            })?;

        let raw_date = field(columns.invoice_date);
        let invoice_date = match parse_invoice_date(raw_date) {
            Some(ts) => Some(ts),
            None if config.lenient_dates => {
                bad_dates += 1;
                log::warn!("line {line_no}: unparseable InvoiceDate '{raw_date}', keeping row without date");
                None
            }
            None => {
                return Err(DashError::InvalidDate { line: line_no, value: raw_date.to_string() });
            }
        };

        let description = match record.get(columns.description).unwrap_or("") {
            d if d.trim().is_empty() => config.missing_description.clone(),
            d => d.to_string(),
        };

        lines.push(InvoiceLine {
            invoice_no: field(columns.invoice_no).to_string(),
            stock_code: field(columns.stock_code).to_string(),
            description,
            quantity,
            invoice_date,
            unit_price,
            customer_id: normalise_customer_id(field(columns.customer_id)),
            country: Some(field(columns.country))
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            sales: quantity as f64 * unit_price,
        });
    }

    log::info!("loader: {} invoice lines loaded ({} without a parseable date)", lines.len(), bad_dates);
    Ok(lines)
}

/// Load invoice lines from a CSV file path.
pub fn load_invoice_file(path: &str, config: &LoaderConfig) -> DashResult<Vec<InvoiceLine>> {
    let file = std::fs::File::open(path)?;
    log::debug!("loader: reading {path}");
    load_invoice_lines(std::io::BufReader::new(file), config)
}

/// Project loaded lines into lifecycle input events, row index = table position.
pub fn purchase_events(lines: &[InvoiceLine]) -> Vec<PurchaseEvent> {
    lines
        .iter()
        .enumerate()
        .map(|(row, line)| PurchaseEvent {
            row,
            customer_id: line.customer_id.clone(),
            timestamp:   line.invoice_date,
        })
        .collect()
}

pub fn parse_invoice_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Blank → None. Numeric ids exported as floats (`17850.0`) lose the fraction.
pub fn normalise_customer_id(value: &str) -> Option<CustomerId> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return None;
    }
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", n as i64)),
        _ => Some(value.to_string()),
    }
}

fn parse_quantity(value: &str) -> Option<i64> {
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite() && n.fract() == 0.0)
            .map(|n| n as i64)
    })
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_ids_drop_float_suffix() {
        assert_eq!(normalise_customer_id("17850.0"), Some("17850".to_string()));
        assert_eq!(normalise_customer_id(" 12583 "), Some("12583".to_string()));
        assert_eq!(normalise_customer_id("C-77"), Some("C-77".to_string()));
        assert_eq!(normalise_customer_id(""), None);
        assert_eq!(normalise_customer_id("NaN"), None);
    }

    #[test]
    fn dates_accept_unpadded_us_format() {
        let ts = parse_invoice_date("12/1/2010 8:26").unwrap();
        assert_eq!(ts.to_string(), "2010-12-01 08:26:00");
    }

    #[test]
    fn dates_accept_iso_and_date_only() {
        assert!(parse_invoice_date("2011-01-04 10:00:00").is_some());
        assert_eq!(
            parse_invoice_date("2011-01-04").unwrap().to_string(),
            "2011-01-04 00:00:00"
        );
        assert!(parse_invoice_date("yesterday").is_none());
    }

    #[test]
    fn latin1_bytes_map_to_same_code_points() {
        assert_eq!(decode_latin1(&[0x43, 0x41, 0x46, 0xC9]), "CAFÉ");
    }

    #[test]
    fn float_quantity_accepted_when_integral() {
        assert_eq!(parse_quantity("6"), Some(6));
        assert_eq!(parse_quantity("-2.0"), Some(-2));
        assert_eq!(parse_quantity("2.5"), None);
    }
}
