//! Work-order operations: booking, the worker and client transitions, reads.

use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::Instrument;

use super::{Engine, now, record_duration};
use crate::error::{Error, Result};
use crate::lifecycle::{self, Decision};
use crate::model::*;
use crate::store::{Store, StoreTx};
use crate::telemetry::metrics;
use crate::telemetry::work::start_work_order_span;

impl<S: Store> Engine<S> {
    /// Book `booking.worker` for a profession. The new order starts
    /// `pending`, with `estimated_cost = hourly_rate × estimated_time_hours`.
    pub async fn book_work(&self, who: &Identity, booking: NewBooking) -> Result<WorkOrder> {
        let started = Instant::now();
        lifecycle::validate_booking(who.id, &booking, now())?;

        let span = start_work_order_span("book", None);
        async {
            let mut tx = self.store.begin().await?;
            tx.get_role(booking.worker).await?;
            let profession = tx.get_profession(booking.profession).await?;
            let profile = tx
                .find_worker_profile(booking.worker, booking.profession)
                .await?
                .ok_or_else(|| {
                    Error::NotFound(format!(
                        "user {} offers no profile for profession {}",
                        booking.worker, booking.profession
                    ))
                })?;
            if tx.get_address(who.id).await?.is_none() {
                return Err(Error::NotFound(format!(
                    "user {} has no stored address",
                    who.id
                )));
            }
            let estimated_cost =
                lifecycle::estimate_cost(profile.hourly_rate, profession.estimated_time_hours)?;

            let order = tx
                .insert_work_order(&NewWorkOrder {
                    profession_id: booking.profession,
                    booked_by: who.id,
                    assigned_to: booking.worker,
                    tags: booking.tags,
                    description: booking.description,
                    scheduled_date: booking.scheduled_date,
                    scheduled_time: booking.scheduled_time,
                    estimated_cost,
                })
                .await?;
            tx.commit().await?;

            tracing::Span::current().record("work_order.id", order.id.0);
            tracing::Span::current().record("work_order.status", order.status.as_str());
            tracing::info!(
                client = %order.booked_by,
                worker = %order.assigned_to,
                estimated_cost = order.estimated_cost,
                "work order booked"
            );
            metrics::work_orders_booked().add(
                1,
                &[KeyValue::new("profession_id", order.profession_id.0)],
            );
            record_duration("book", started);
            Ok(order)
        }
        .instrument(span)
        .await
    }

    /// pending → accepted. A past-due order is expired instead and the call
    /// fails.
    pub async fn accept_work(&self, who: &Identity, id: WorkOrderId) -> Result<WorkOrder> {
        let actor = who.id;
        let at = now();
        self.transition("accept", id, move |order| {
            lifecycle::accept(order, actor, at)
        })
        .await
    }

    /// pending → rejected. A past-due order is expired instead and the call
    /// fails.
    pub async fn reject_work(&self, who: &Identity, id: WorkOrderId) -> Result<WorkOrder> {
        let actor = who.id;
        let at = now();
        self.transition("reject", id, move |order| {
            lifecycle::reject(order, actor, at)
        })
        .await
    }

    /// pending → cancelled, by the booking client.
    pub async fn cancel_work(&self, who: &Identity, id: WorkOrderId) -> Result<WorkOrder> {
        let actor = who.id;
        self.transition("cancel", id, move |order| {
            lifecycle::cancel(order, actor).map(Decision::Apply)
        })
        .await
    }

    /// accepted → started.
    pub async fn start_work(&self, who: &Identity, id: WorkOrderId) -> Result<WorkOrder> {
        let actor = who.id;
        self.transition("start", id, move |order| {
            lifecycle::start(order, actor).map(Decision::Apply)
        })
        .await
    }

    /// Set the final cost of a started order.
    pub async fn quote_final_cost(
        &self,
        who: &Identity,
        id: WorkOrderId,
        final_cost: f64,
    ) -> Result<WorkOrder> {
        let actor = who.id;
        self.transition("quote", id, move |order| {
            lifecycle::quote(order, actor, final_cost).map(Decision::Apply)
        })
        .await
    }

    /// Client confirms payment sent. Closes the order if the worker already
    /// confirmed receipt.
    pub async fn mark_payment_sent(&self, who: &Identity, id: WorkOrderId) -> Result<WorkOrder> {
        let actor = who.id;
        self.transition("mark_sent", id, move |order| {
            lifecycle::mark_sent(order, actor).map(Decision::Apply)
        })
        .await
    }

    /// Worker confirms payment received. Closes the order if the client
    /// already confirmed sending.
    pub async fn mark_payment_received(
        &self,
        who: &Identity,
        id: WorkOrderId,
    ) -> Result<WorkOrder> {
        let actor = who.id;
        self.transition("mark_received", id, move |order| {
            lifecycle::mark_received(order, actor).map(Decision::Apply)
        })
        .await
    }

    /// Read one order. Visible to its client, its worker and admins.
    pub async fn get_work_order(&self, who: &Identity, id: WorkOrderId) -> Result<WorkOrder> {
        let order = self.store.get_work_order(id).await?;
        if !(order.involves(who.id) || who.is_admin()) {
            return Err(Error::Unauthorized(format!(
                "user {} is not a party to work order {id}",
                who.id
            )));
        }
        Ok(order)
    }

    /// Orders booked by `client`, newest first.
    pub async fn list_booked(&self, who: &Identity, client: UserId) -> Result<Vec<WorkOrder>> {
        ensure_may_list(who, client)?;
        self.store.list_booked(client).await
    }

    /// Orders assigned to `worker`, newest first.
    pub async fn list_assigned(&self, who: &Identity, worker: UserId) -> Result<Vec<WorkOrder>> {
        ensure_may_list(who, worker)?;
        self.store.list_assigned(worker).await
    }
}

fn ensure_may_list(who: &Identity, target: UserId) -> Result<()> {
    if !who.may_act_for(target) {
        return Err(Error::Unauthorized(format!(
            "user {} may not list work orders of user {target}",
            who.id
        )));
    }
    Ok(())
}
