//! Shared primitive types used across the analytics core.

/// An opaque customer identifier, normalised by the loader.
pub type CustomerId = String;

/// Position of a line in the loaded table. Stable for the life of one pass.
pub type RowIndex = usize;

/// Whole days between two invoice timestamps.
pub type Days = i64;

/// Identifier used when rows without a customer are grouped rather than dropped.
pub const UNKNOWN_CUSTOMER: &str = "unknown";
