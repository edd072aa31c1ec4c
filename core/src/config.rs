//! Dashboard configuration.
//!
//! Every knob has a default matching the stock dashboard, so an empty
//! JSON object (or no file at all) yields the stock behaviour.

use crate::types::{Days, UNKNOWN_CUSTOMER};
use serde::{Deserialize, Serialize};

/// What the lifecycle pass does with rows that carry no customer id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingCustomerPolicy {
    /// Drop the row from the annotated output.
    #[default]
    Exclude,
    /// Group every such row under a single `"unknown"` customer.
    Sentinel,
}

impl MissingCustomerPolicy {
    pub fn sentinel_id(&self) -> Option<&'static str> {
        match self {
            MissingCustomerPolicy::Exclude  => None,
            MissingCustomerPolicy::Sentinel => Some(UNKNOWN_CUSTOMER),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LifecycleConfig {
    /// A gap strictly greater than this many days marks the event as churned.
    pub churn_gap_days:     Days,
    /// Positions above this are reported as 1.
    pub max_cycle_position: u32,
    pub missing_customer:   MissingCustomerPolicy,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            churn_gap_days:     10,
            max_cycle_position: 10,
            missing_customer:   MissingCustomerPolicy::Exclude,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    pub delimiter:     char,
    /// Keep rows whose InvoiceDate does not parse instead of failing the load.
    pub lenient_dates: bool,
    /// Text used when Description is blank.
    pub missing_description: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter:           ',',
            lenient_dates:       false,
            missing_description: "Unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartConfig {
    pub top_products:    usize,
    pub frequency_bins:  usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            top_products:   10,
            frequency_bins: 50,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub lifecycle: LifecycleConfig,
    pub loader:    LoaderConfig,
    pub charts:    ChartConfig,
}

impl DashboardConfig {
    /// Load from a JSON file. Missing sections fall back to defaults.
    /// In tests, use DashboardConfig::default().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DashboardConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        log::debug!("Loaded dashboard config from {path}");
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.lifecycle.churn_gap_days < 0 {
            anyhow::bail!("churn_gap_days must be >= 0, got {}", self.lifecycle.churn_gap_days);
        }
        if self.lifecycle.max_cycle_position == 0 {
            anyhow::bail!("max_cycle_position must be >= 1");
        }
        if self.charts.frequency_bins == 0 {
            anyhow::bail!("frequency_bins must be >= 1");
        }
        if !self.loader.delimiter.is_ascii() {
            anyhow::bail!("delimiter must be a single ASCII character");
        }
        Ok(())
    }
}
