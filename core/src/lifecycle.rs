//! Customer lifecycle annotation — churn flags and cycle positions.
//!
//! One pass over the whole, unfiltered event table:
//!   1. Partition events by customer id
//!   2. Stable-sort each customer's events by timestamp (row order breaks ties)
//!   3. Walk each customer front to back, labelling every event
//!
//! Position rules:
//!   - the running counter counts every event since the customer's first
//!     purchase and is never reset;
//!   - a churned event *reports* position 1, the counter keeps climbing;
//!   - a position above the maximum reports 1 (a sawtooth, not a plateau).

use crate::{
    config::LifecycleConfig,
    error::{DashError, DashResult},
    event::{AnnotatedEvent, PurchaseEvent},
    period::{fill_months, YearMonth},
    types::{CustomerId, RowIndex},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Order of the annotated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleOrder {
    /// Same relative order as the input.
    #[default]
    Input,
    /// Customer id ascending, then chronological.
    CustomerTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub month: YearMonth,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleBucket {
    pub cycle_position: u32,
    pub customers:      usize,
}

/// Annotate every event. See the module docs for the position rules.
pub fn annotate(
    events: &[PurchaseEvent],
    config: &LifecycleConfig,
    order: LifecycleOrder,
) -> DashResult<Vec<AnnotatedEvent>> {
    // Input position travels with each event so output can be put back in order.
    let mut by_customer: BTreeMap<CustomerId, Vec<(usize, RowIndex, NaiveDateTime)>> =
        BTreeMap::new();
    let mut excluded = 0usize;

    for (pos, event) in events.iter().enumerate() {
        let timestamp = event.timestamp.ok_or_else(|| DashError::InvalidEvent {
            row:    event.row,
            reason: "missing timestamp".to_string(),
        })?;

        let customer = match (&event.customer_id, config.missing_customer.sentinel_id()) {
            (Some(id), _)       => id.clone(),
            (None, Some(label)) => label.to_string(),
            (None, None) => {
                excluded += 1;
                continue;
            }
        };

        by_customer.entry(customer).or_default().push((pos, event.row, timestamp));
    }

    let mut out: Vec<(usize, AnnotatedEvent)> = Vec::with_capacity(events.len() - excluded);
    let mut churn_events = 0usize;

    for (customer, mut history) in by_customer {
        // Vec::sort_by_key is stable: equal timestamps keep input order.
        history.sort_by_key(|(_, _, ts)| *ts);

        let mut previous: Option<NaiveDateTime> = None;
        for (nth, (pos, row, timestamp)) in history.into_iter().enumerate() {
            let running = nth as u64 + 1;
            let days_since_previous = previous.map(|prev| (timestamp - prev).num_days());
            let churned = days_since_previous.is_some_and(|d| d > config.churn_gap_days);

            let raw = if churned { 1 } else { running };
            let cycle_position = if raw > u64::from(config.max_cycle_position) {
                1
            } else {
                raw as u32
            };

            if churned {
                churn_events += 1;
            }

            out.push((pos, AnnotatedEvent {
                row,
                customer_id: customer.clone(),
                timestamp,
                previous_timestamp: previous,
                days_since_previous,
                churned,
                cycle_position,
            }));
            previous = Some(timestamp);
        }
    }

    if order == LifecycleOrder::Input {
        out.sort_by_key(|(pos, _)| *pos);
    }

    log::debug!(
        "lifecycle: annotated {} events ({} excluded without customer id, {} churn events)",
        out.len(), excluded, churn_events,
    );

    Ok(out.into_iter().map(|(_, e)| e).collect())
}

/// Distinct churned customers per month of the churned event, with
/// churn-free months between the first and last churned month reported as 0.
pub fn monthly_churned_customers(annotated: &[AnnotatedEvent]) -> Vec<MonthlyCount> {
    let mut sparse: BTreeMap<YearMonth, BTreeSet<&str>> = BTreeMap::new();
    for event in annotated.iter().filter(|e| e.churned) {
        sparse
            .entry(YearMonth::of(&event.timestamp))
            .or_default()
            .insert(event.customer_id.as_str());
    }

    let counts: BTreeMap<YearMonth, usize> =
        sparse.into_iter().map(|(m, ids)| (m, ids.len())).collect();

    fill_months(&counts)
        .into_iter()
        .map(|(month, count)| MonthlyCount { month, count })
        .collect()
}

/// Distinct customers with at least one churned event.
pub fn churned_customer_count(annotated: &[AnnotatedEvent]) -> usize {
    annotated
        .iter()
        .filter(|e| e.churned)
        .map(|e| e.customer_id.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Distinct customers per reported cycle position, ascending by position.
pub fn lifecycle_overview(annotated: &[AnnotatedEvent]) -> Vec<CycleBucket> {
    let mut buckets: BTreeMap<u32, BTreeSet<&str>> = BTreeMap::new();
    for event in annotated {
        buckets
            .entry(event.cycle_position)
            .or_default()
            .insert(event.customer_id.as_str());
    }

    buckets
        .into_iter()
        .map(|(cycle_position, ids)| CycleBucket { cycle_position, customers: ids.len() })
        .collect()
}
