//! Review finalizer: one review per closed order, folded into the worker's
//! reputation in the same transaction.

use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::Instrument;

use super::{Engine, record_duration};
use crate::error::{Error, Result};
use crate::model::*;
use crate::reputation::{Reputation, validate_review};
use crate::store::{Store, StoreTx};
use crate::telemetry::metrics;
use crate::telemetry::work::start_work_order_span;

impl<S: Store> Engine<S> {
    /// Review a closed order. Only its client may, and only once.
    pub async fn submit_review(
        &self,
        who: &Identity,
        id: WorkOrderId,
        rating: i32,
        text: Option<&str>,
    ) -> Result<Review> {
        let started = Instant::now();
        let (rating, text) = validate_review(rating, text)?;

        let span = start_work_order_span("submit_review", Some(id));
        async {
            let mut tx = self.store.begin().await?;
            let order = tx.lock_work_order(id).await?;
            if order.booked_by != who.id {
                return Err(Error::Unauthorized(format!(
                    "user {} did not book work order {id}",
                    who.id
                )));
            }
            if order.status != Status::Closed {
                return Err(Error::InvalidState(format!(
                    "work order {id} is {}, reviews open once it is closed",
                    order.status
                )));
            }
            if tx.find_review(id).await?.is_some() {
                return Err(Error::InvalidState(format!(
                    "work order {id} is already reviewed"
                )));
            }

            let review = tx
                .insert_review(&NewReview {
                    work_order_id: id,
                    author_id: who.id,
                    worker_id: order.assigned_to,
                    rating,
                    text,
                })
                .await?;
            let reputation = refold(&mut tx, order.assigned_to).await?;
            tx.commit().await?;

            tracing::info!(
                worker = %order.assigned_to,
                rating = review.rating,
                avg_rating = reputation.avg_rating,
                review_count = reputation.review_count,
                "review submitted"
            );
            metrics::reviews_recorded().add(1, &[KeyValue::new("kind", "submit")]);
            record_duration("submit_review", started);
            Ok(review)
        }
        .instrument(span)
        .await
    }

    /// Replace the rating and text of an existing review. Marks it edited
    /// and re-derives the worker's reputation.
    pub async fn edit_review(
        &self,
        who: &Identity,
        id: WorkOrderId,
        rating: i32,
        text: Option<&str>,
    ) -> Result<Review> {
        let started = Instant::now();
        let (rating, text) = validate_review(rating, text)?;

        let span = start_work_order_span("edit_review", Some(id));
        async {
            let mut tx = self.store.begin().await?;
            tx.lock_work_order(id).await?;
            let existing = tx
                .find_review(id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("review for work order {id}")))?;
            if existing.author_id != who.id {
                return Err(Error::Unauthorized(format!(
                    "user {} did not write the review on work order {id}",
                    who.id
                )));
            }

            let review = tx.update_review(existing.id, rating, text).await?;
            let reputation = refold(&mut tx, review.worker_id).await?;
            tx.commit().await?;

            tracing::info!(
                worker = %review.worker_id,
                rating = review.rating,
                avg_rating = reputation.avg_rating,
                "review edited"
            );
            metrics::reviews_recorded().add(1, &[KeyValue::new("kind", "edit")]);
            record_duration("edit_review", started);
            Ok(review)
        }
        .instrument(span)
        .await
    }

    /// The review left on `id`, if any. Readable by anyone who can read the
    /// order.
    pub async fn get_review(&self, who: &Identity, id: WorkOrderId) -> Result<Review> {
        self.get_work_order(who, id).await?;
        self.store.get_review(id).await
    }
}

/// Recompute the ledger from every stored rating for `worker` and write it.
async fn refold<T: StoreTx>(tx: &mut T, worker: UserId) -> Result<Reputation> {
    tx.lock_worker_profiles(worker).await?;
    let ratings = tx.worker_ratings(worker).await?;
    let reputation = Reputation::from_ratings(&ratings);
    tx.set_reputation(worker, reputation).await?;
    Ok(reputation)
}
