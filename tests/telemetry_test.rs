//! Integration tests for telemetry initialization and span helpers.

use std::time::Duration;

use neighbourpro::config::{Config, SecretString};
use neighbourpro::model::{Status, WorkOrderId};
use neighbourpro::ranking::RankingWeights;
use neighbourpro::telemetry::{TelemetryConfig, init_telemetry, metrics, work};

#[test]
fn telemetry_initializes_without_endpoint() {
    // The global subscriber can only be set once per process; a second
    // initialization returning Err is acceptable here.
    let _guard = init_telemetry(TelemetryConfig::stdout("neighbourpro-test"));
}

#[test]
fn work_order_span_records_transition() {
    let span = work::start_work_order_span("accept", Some(WorkOrderId(7)));
    work::record_state_transition(&span, Status::Pending, Status::Accepted);
}

#[test]
fn booking_span_takes_its_id_later() {
    let span = work::start_work_order_span("book", None);
    span.record("work_order.id", 42_i64);
    work::record_state_transition(&span, Status::Started, Status::Closed);
}

#[test]
fn instruments_build_without_a_provider() {
    metrics::work_orders_booked().add(1, &[]);
    metrics::reviews_recorded().add(1, &[]);
    metrics::ranking_queries().add(1, &[]);
    metrics::operation_duration_ms().record(1.5, &[]);
}

#[test]
fn config_carries_endpoint_and_level() {
    let config = Config {
        database_url: SecretString::from("postgres://localhost/unused".to_string()),
        otel_endpoint: Some("http://localhost:4317".to_string()),
        log_level: "neighbourpro=debug".to_string(),
        weights: RankingWeights::default(),
        weights_file: None,
        sweep_interval: Duration::from_secs(60),
    };
    let telemetry = TelemetryConfig::from_config("neighbourpro-test", &config);
    assert_eq!(telemetry.endpoint.as_deref(), Some("http://localhost:4317"));
    assert_eq!(telemetry.log_level, "neighbourpro=debug");
    assert_eq!(telemetry.service_name, "neighbourpro-test");

    let local = TelemetryConfig::stdout("neighbourpro-test");
    assert!(local.endpoint.is_none());
    assert_eq!(local.log_level, "info");
}
