//! Periodic expiry of past-due pending orders.
//!
//! The sweep only ever moves `pending → expired`, using the same locked
//! compare-and-set as the inline path, so it commutes with client and worker
//! transitions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{error, info};

use super::{Engine, now};
use crate::error::{ErrorKind, Result};
use crate::lifecycle::{self, Decision};
use crate::model::WorkOrderId;
use crate::store::Store;

impl<S: Store> Engine<S> {
    /// Expire every `pending` order whose slot has passed. Returns the ids
    /// that were expired by this call.
    pub async fn expire_overdue(&self) -> Result<Vec<WorkOrderId>> {
        let at = now();
        let overdue = self.store.list_overdue_pending(at).await?;
        let mut expired = Vec::with_capacity(overdue.len());
        for id in overdue {
            let result = self
                .transition("expire", id, move |order| {
                    lifecycle::expire(order, at).map(Decision::Apply)
                })
                .await;
            match result {
                Ok(_) => expired.push(id),
                // Someone else moved the order first.
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::InvalidState | ErrorKind::ConcurrencyConflict
                    ) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(expired)
    }
}

/// Runs [`Engine::expire_overdue`] on an interval until shut down.
pub struct ExpirySweeper<S: Store> {
    engine: Arc<Engine<S>>,
    interval: Duration,
    shutdown: Arc<Notify>,
}

impl<S: Store> Clone for ExpirySweeper<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            interval: self.interval,
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl<S: Store> ExpirySweeper<S> {
    pub fn new(engine: Arc<Engine<S>>, interval: Duration) -> Self {
        Self {
            engine,
            interval,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Signal the sweeper to stop.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Sweep every `interval` until [`shutdown`](Self::shutdown) is called.
    pub async fn run(&self) -> Result<()> {
        info!(interval_secs = self.interval.as_secs(), "expiry sweeper started");

        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    info!("expiry sweeper shutting down");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.interval) => {}
            }

            match self.engine.expire_overdue().await {
                Ok(expired) if !expired.is_empty() => {
                    info!(count = expired.len(), "expired overdue work orders");
                }
                Ok(_) => {}
                Err(e) => error!("expiry sweep failed: {e}"),
            }
        }
    }
}
