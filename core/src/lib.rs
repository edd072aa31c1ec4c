//! Retail transaction analytics: invoice loading, dashboard chart series,
//! and the customer lifecycle/churn annotation pass.

pub mod charts;
pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod lifecycle;
pub mod loader;
pub mod period;
pub mod report;
pub mod types;
