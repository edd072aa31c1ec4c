//! Purchase events: the input and output rows of the lifecycle pass.

use crate::types::{CustomerId, Days, RowIndex};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One observed transaction line for a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseEvent {
    /// Row of the source table this event came from. Breaks timestamp ties.
    pub row:         RowIndex,
    pub customer_id: Option<CustomerId>,
    /// Always `Some` for loader output in strict mode.
    pub timestamp:   Option<NaiveDateTime>,
}

impl PurchaseEvent {
    pub fn new(row: RowIndex, customer_id: Option<&str>, timestamp: NaiveDateTime) -> Self {
        Self {
            row,
            customer_id: customer_id.map(str::to_string),
            timestamp:   Some(timestamp),
        }
    }
}

/// A PurchaseEvent with its lifecycle labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedEvent {
    pub row:                 RowIndex,
    pub customer_id:         CustomerId,
    pub timestamp:           NaiveDateTime,
    pub previous_timestamp:  Option<NaiveDateTime>,
    pub days_since_previous: Option<Days>,
    pub churned:             bool,
    /// Always within [1, max_cycle_position].
    pub cycle_position:      u32,
}
