//! Metric instrument factories for neighbourpro.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the [`SCOPE`](super::SCOPE) meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for neighbourpro instruments.
fn meter() -> Meter {
    opentelemetry::global::meter(super::SCOPE)
}

/// Counter: work orders created by a booking.
/// Labels: `profession_id`.
pub fn work_orders_booked() -> Counter<u64> {
    meter()
        .u64_counter("neighbourpro.work_order.booked")
        .with_description("Number of work orders booked")
        .build()
}

/// Counter: work order status transitions.
/// Labels: `from`, `to`.
pub fn work_order_transitions() -> Counter<u64> {
    meter()
        .u64_counter("neighbourpro.work_order.transitions")
        .with_description("Number of work order status transitions")
        .build()
}

/// Counter: reviews written.
/// Labels: `kind` ("submit" | "edit").
pub fn reviews_recorded() -> Counter<u64> {
    meter()
        .u64_counter("neighbourpro.review.recorded")
        .with_description("Number of reviews submitted or edited")
        .build()
}

/// Counter: ranking queries served.
/// Labels: `profession_id`.
pub fn ranking_queries() -> Counter<u64> {
    meter()
        .u64_counter("neighbourpro.ranking.queries")
        .with_description("Number of worker ranking queries")
        .build()
}

/// Histogram: operation duration in milliseconds.
/// Labels: `operation`.
pub fn operation_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("neighbourpro.operation.duration_ms")
        .with_description("Operation duration in milliseconds")
        .with_unit("ms")
        .build()
}
