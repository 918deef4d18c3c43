//! Work-order span helpers.
//!
//! Spans wrap a single engine operation on a work order. Transitions are
//! recorded as events inside the span, and counted.

use opentelemetry::KeyValue;
use tracing::Span;

use super::metrics;
use crate::model::{Status, WorkOrderId};

/// Start a span for one operation on a work order.
///
/// `work_order.id` is left empty for operations that create the order; fill
/// it with `span.record("work_order.id", id.0)` once the id is known.
pub fn start_work_order_span(operation: &str, id: Option<WorkOrderId>) -> Span {
    let span = tracing::info_span!(
        "work_order",
        "work_order.operation" = operation,
        "work_order.id" = tracing::field::Empty,
        "work_order.status" = tracing::field::Empty,
    );
    if let Some(id) = id {
        span.record("work_order.id", id.0);
    }
    span
}

/// Record a status transition on `span` and bump the transitions counter.
pub fn record_state_transition(span: &Span, from: Status, to: Status) {
    span.record("work_order.status", to.as_str());
    span.in_scope(|| {
        tracing::info!(from = %from, to = %to, "state_transition");
    });
    metrics::work_order_transitions().add(
        1,
        &[
            KeyValue::new("from", from.as_str()),
            KeyValue::new("to", to.as_str()),
        ],
    );
}
