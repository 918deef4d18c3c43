//! Core engine. The public API for booking and managing work orders.
//!
//! The engine owns the store and the process-wide ranking configuration.
//! Every state transition goes through here: the current order is locked,
//! the pure decision in [`crate::lifecycle`] is applied, and the result is
//! written with a compare-and-set before the transaction commits.
//!
//! Failures are returned to the caller untouched. Only successful work is
//! traced and counted.

mod ranking;
mod reviews;
mod sweep;
mod work_orders;
mod workers;

pub use sweep::ExpirySweeper;

use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDateTime, Utc};
use opentelemetry::KeyValue;
use tracing::Instrument;

use crate::error::{Error, Result};
use crate::geo::{GeoDistance, Haversine};
use crate::lifecycle::Decision;
use crate::model::{WorkOrder, WorkOrderId};
use crate::ranking::RankingWeights;
use crate::recommend::RecommendationModel;
use crate::store::{MemoryStore, Store, StoreTx};
use crate::telemetry::metrics;
use crate::telemetry::work::{record_state_transition, start_work_order_span};

/// The marketplace engine. Owns all state access and enforces all invariants.
pub struct Engine<S: Store> {
    store: S,
    weights: RankingWeights,
    geo: Arc<dyn GeoDistance>,
    recommender: Option<Arc<dyn RecommendationModel>>,
}

impl Engine<MemoryStore> {
    /// Engine over a fresh in-memory store with default weights (for testing).
    pub fn in_memory() -> Self {
        Self {
            store: MemoryStore::new(),
            weights: RankingWeights::default(),
            geo: Arc::new(Haversine),
            recommender: None,
        }
    }
}

impl<S: Store> Engine<S> {
    /// Create an engine over `store`. Fails with `Config` on invalid weights.
    pub fn new(store: S, weights: RankingWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self {
            store,
            weights,
            geo: Arc::new(Haversine),
            recommender: None,
        })
    }

    /// Replace the great-circle distance function.
    pub fn with_geo(mut self, geo: impl GeoDistance + 'static) -> Self {
        self.geo = Arc::new(geo);
        self
    }

    /// Attach a profession recommendation model.
    pub fn with_recommender(mut self, model: impl RecommendationModel + 'static) -> Self {
        self.recommender = Some(Arc::new(model));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn weights(&self) -> &RankingWeights {
        &self.weights
    }

    /// Lock `id`, apply `decide` and write the result back, all in one
    /// transaction.
    ///
    /// A [`Decision::Expire`] is committed like any other write, then
    /// reported to the caller as `InvalidState`.
    async fn transition<F>(
        &self,
        operation: &'static str,
        id: WorkOrderId,
        decide: F,
    ) -> Result<WorkOrder>
    where
        F: FnOnce(&WorkOrder) -> Result<Decision> + Send,
    {
        let started = Instant::now();
        let span = start_work_order_span(operation, Some(id));

        async {
            let mut tx = self.store.begin().await?;
            let current = tx.lock_work_order(id).await?;
            let (next, expired) = match decide(&current)? {
                Decision::Apply(next) => (next, false),
                Decision::Expire(next) => (next, true),
            };
            let stored = tx.update_work_order(&current, &next).await?;
            tx.commit().await?;

            if current.status != stored.status {
                record_state_transition(&span, current.status, stored.status);
            } else if current.payment_status != stored.payment_status {
                tracing::info!(
                    from = %current.payment_status,
                    to = %stored.payment_status,
                    "payment_status_advanced"
                );
            }
            record_duration(operation, started);

            if expired {
                return Err(Error::InvalidState(format!(
                    "work order {id} has expired"
                )));
            }
            Ok(stored)
        }
        .instrument(span.clone())
        .await
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn record_duration(operation: &'static str, started: Instant) {
    metrics::operation_duration_ms().record(
        started.elapsed().as_secs_f64() * 1000.0,
        &[KeyValue::new("operation", operation)],
    );
}
