//! Work-order state machine.
//!
//! Pure decision functions over a loaded [`WorkOrder`]: each checks the actor,
//! then the current status, then any time-based precondition, and returns the
//! order as it should be persisted. The engine performs the read, the decision
//! and the compare-and-set write inside one transaction.

use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::model::{NewBooking, PaymentStatus, Status, UserId, WorkOrder};

/// Longest accepted booking description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;
/// Most tags a booking may carry.
pub const MAX_TAGS: usize = 16;
/// Longest accepted tag, in characters.
pub const MAX_TAG_CHARS: usize = 50;

/// Outcome of a transition that may trip the lazy expiry rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Persist the order and report success.
    Apply(WorkOrder),
    /// Persist the order, now `expired`, and fail the request.
    Expire(WorkOrder),
}

// ---------------------------------------------------------------------------
// Booking
// ---------------------------------------------------------------------------

/// Checks that need nothing from storage. Self-booking is rejected before
/// anything else so it fails the same way for every input.
pub fn validate_booking(client: UserId, booking: &NewBooking, now: NaiveDateTime) -> Result<()> {
    if client == booking.worker {
        return Err(Error::Validation(
            "a client cannot book themselves".to_string(),
        ));
    }
    if booking.scheduled_at() < now {
        return Err(Error::Validation(format!(
            "scheduled time {} is in the past",
            booking.scheduled_at()
        )));
    }
    let description_chars = booking
        .description
        .as_deref()
        .map_or(0, |d| d.chars().count());
    if description_chars > MAX_DESCRIPTION_CHARS {
        return Err(Error::Validation(format!(
            "description exceeds {MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    if booking.tags.len() > MAX_TAGS {
        return Err(Error::Validation(format!("at most {MAX_TAGS} tags allowed")));
    }
    if let Some(tag) = booking
        .tags
        .iter()
        .find(|t| t.trim().is_empty() || t.chars().count() > MAX_TAG_CHARS)
    {
        return Err(Error::Validation(format!(
            "tag {tag:?} must be non-empty and at most {MAX_TAG_CHARS} characters"
        )));
    }
    Ok(())
}

/// `hourly_rate × estimated_hours`, computed once at booking.
pub fn estimate_cost(hourly_rate: f64, estimated_hours: f64) -> Result<f64> {
    let cost = hourly_rate * estimated_hours;
    if !cost.is_finite() || cost < 0.0 {
        return Err(Error::Validation(format!(
            "cannot estimate cost from rate {hourly_rate} and {estimated_hours} hours"
        )));
    }
    Ok(cost)
}

// ---------------------------------------------------------------------------
// Worker transitions
// ---------------------------------------------------------------------------

/// pending → accepted, or pending → expired when the slot has passed.
pub fn accept(order: &WorkOrder, actor: UserId, now: NaiveDateTime) -> Result<Decision> {
    answer(order, actor, now, Status::Accepted)
}

/// pending → rejected, or pending → expired when the slot has passed.
pub fn reject(order: &WorkOrder, actor: UserId, now: NaiveDateTime) -> Result<Decision> {
    answer(order, actor, now, Status::Rejected)
}

fn answer(order: &WorkOrder, actor: UserId, now: NaiveDateTime, to: Status) -> Result<Decision> {
    ensure_worker(order, actor)?;
    ensure_status(order, Status::Pending)?;
    if order.is_overdue(now) {
        return Ok(Decision::Expire(advance(order, Status::Expired)?));
    }
    Ok(Decision::Apply(advance(order, to)?))
}

/// accepted → started.
pub fn start(order: &WorkOrder, actor: UserId) -> Result<WorkOrder> {
    ensure_worker(order, actor)?;
    ensure_status(order, Status::Accepted)?;
    advance(order, Status::Started)
}

/// Sets `final_cost` on a started order. The amount is fixed once quoted.
pub fn quote(order: &WorkOrder, actor: UserId, final_cost: f64) -> Result<WorkOrder> {
    if !final_cost.is_finite() || final_cost < 0.0 {
        return Err(Error::Validation(format!(
            "final cost {final_cost} must be a non-negative amount"
        )));
    }
    ensure_worker(order, actor)?;
    ensure_status(order, Status::Started)?;
    if let Some(quoted) = order.final_cost {
        return Err(Error::InvalidState(format!(
            "work order {} already quoted at {quoted}",
            order.id
        )));
    }
    let mut next = order.clone();
    next.final_cost = Some(final_cost);
    Ok(next)
}

/// Worker half of the payment handshake.
pub fn mark_received(order: &WorkOrder, actor: UserId) -> Result<WorkOrder> {
    ensure_worker(order, actor)?;
    handshake(order, PaymentStatus::Received, PaymentStatus::Sent)
}

// ---------------------------------------------------------------------------
// Client transitions
// ---------------------------------------------------------------------------

/// pending → cancelled.
pub fn cancel(order: &WorkOrder, actor: UserId) -> Result<WorkOrder> {
    ensure_client(order, actor)?;
    ensure_status(order, Status::Pending)?;
    advance(order, Status::Cancelled)
}

/// Client half of the payment handshake.
pub fn mark_sent(order: &WorkOrder, actor: UserId) -> Result<WorkOrder> {
    ensure_client(order, actor)?;
    handshake(order, PaymentStatus::Sent, PaymentStatus::Received)
}

/// Records `mine`; closes the order when the other side already recorded
/// `theirs`. A closed order keeps payment status `received`.
fn handshake(order: &WorkOrder, mine: PaymentStatus, theirs: PaymentStatus) -> Result<WorkOrder> {
    ensure_status(order, Status::Started)?;
    if order.final_cost.is_none() {
        return Err(Error::InvalidState(format!(
            "work order {} has no final cost yet",
            order.id
        )));
    }
    if order.payment_status == mine {
        return Err(Error::InvalidState(format!(
            "work order {} is already marked {mine}",
            order.id
        )));
    }

    if order.payment_status == theirs {
        let mut next = advance(order, Status::Closed)?;
        next.payment_status = PaymentStatus::Received;
        Ok(next)
    } else {
        let mut next = order.clone();
        next.payment_status = mine;
        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// Expiry sweep
// ---------------------------------------------------------------------------

/// pending → expired for an overdue order, with no actor. Anything else is
/// left alone and reported as `InvalidState`.
pub fn expire(order: &WorkOrder, now: NaiveDateTime) -> Result<WorkOrder> {
    ensure_status(order, Status::Pending)?;
    if !order.is_overdue(now) {
        return Err(Error::InvalidState(format!(
            "work order {} is not past its scheduled time",
            order.id
        )));
    }
    advance(order, Status::Expired)
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

fn ensure_worker(order: &WorkOrder, actor: UserId) -> Result<()> {
    if order.assigned_to != actor {
        return Err(Error::Unauthorized(format!(
            "user {actor} is not the worker on work order {}",
            order.id
        )));
    }
    Ok(())
}

fn ensure_client(order: &WorkOrder, actor: UserId) -> Result<()> {
    if order.booked_by != actor {
        return Err(Error::Unauthorized(format!(
            "user {actor} did not book work order {}",
            order.id
        )));
    }
    Ok(())
}

fn ensure_status(order: &WorkOrder, expected: Status) -> Result<()> {
    if order.status != expected {
        return Err(Error::InvalidState(format!(
            "work order {} is {}, expected {expected}",
            order.id, order.status
        )));
    }
    Ok(())
}

fn advance(order: &WorkOrder, to: Status) -> Result<WorkOrder> {
    if !order.status.can_transition_to(to) {
        return Err(Error::InvalidState(format!(
            "work order {} cannot move from {} to {to}",
            order.id, order.status
        )));
    }
    let mut next = order.clone();
    next.status = to;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{ProfessionId, WorkOrderId};
    use chrono::{NaiveDate, Utc};

    const CLIENT: UserId = UserId(1);
    const WORKER: UserId = UserId(2);
    const STRANGER: UserId = UserId(3);

    fn slot() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn order(status: Status) -> WorkOrder {
        let now = Utc::now();
        WorkOrder {
            id: WorkOrderId(7),
            profession_id: ProfessionId(1),
            booked_by: CLIENT,
            assigned_to: WORKER,
            tags: vec![],
            description: None,
            scheduled_date: slot().date(),
            scheduled_time: slot().time(),
            status,
            payment_status: PaymentStatus::Pending,
            estimated_cost: 40.0,
            final_cost: None,
            created_at: now,
            modified_at: now,
        }
    }

    fn before_slot() -> NaiveDateTime {
        slot() - chrono::Duration::hours(1)
    }

    fn after_slot() -> NaiveDateTime {
        slot() + chrono::Duration::hours(1)
    }

    #[test]
    fn self_booking_is_a_validation_error_even_when_past_dated() {
        let booking = NewBooking::at(CLIENT, ProfessionId(1), slot());
        let err = validate_booking(CLIENT, &booking, after_slot()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn past_dated_booking_is_rejected() {
        let booking = NewBooking::at(WORKER, ProfessionId(1), slot());
        assert!(validate_booking(CLIENT, &booking, before_slot()).is_ok());
        let err = validate_booking(CLIENT, &booking, after_slot()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn overlong_tags_are_rejected() {
        let booking = NewBooking::at(WORKER, ProfessionId(1), slot()).tag("x".repeat(51));
        assert!(validate_booking(CLIENT, &booking, before_slot()).is_err());
    }

    #[test]
    fn estimate_multiplies_rate_by_hours() {
        assert_eq!(estimate_cost(20.0, 2.0).unwrap(), 40.0);
        assert!(estimate_cost(f64::INFINITY, 2.0).is_err());
    }

    #[test]
    fn accept_requires_assigned_worker() {
        let err = accept(&order(Status::Pending), STRANGER, before_slot()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        let err = accept(&order(Status::Pending), CLIENT, before_slot()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn accept_on_time_applies() {
        match accept(&order(Status::Pending), WORKER, before_slot()).unwrap() {
            Decision::Apply(next) => assert_eq!(next.status, Status::Accepted),
            other => panic!("expected Apply, got {other:?}"),
        }
    }

    #[test]
    fn accept_or_reject_after_slot_expires() {
        for decide in [accept, reject] {
            match decide(&order(Status::Pending), WORKER, after_slot()).unwrap() {
                Decision::Expire(next) => assert_eq!(next.status, Status::Expired),
                other => panic!("expected Expire, got {other:?}"),
            }
        }
    }

    #[test]
    fn re_accepting_fails_instead_of_succeeding() {
        let err = accept(&order(Status::Accepted), WORKER, before_slot()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn overdue_non_pending_order_is_not_expired() {
        let err = accept(&order(Status::Accepted), WORKER, after_slot()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn cancel_is_client_only_and_pending_only() {
        assert_eq!(
            cancel(&order(Status::Pending), WORKER).unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            cancel(&order(Status::Started), CLIENT).unwrap_err().kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            cancel(&order(Status::Pending), CLIENT).unwrap().status,
            Status::Cancelled
        );
    }

    #[test]
    fn quote_only_while_started() {
        assert!(quote(&order(Status::Accepted), WORKER, 45.0).is_err());
        let quoted = quote(&order(Status::Started), WORKER, 45.0).unwrap();
        assert_eq!(quoted.final_cost, Some(45.0));
        assert_eq!(quoted.status, Status::Started);
        assert_eq!(
            quote(&quoted, WORKER, 50.0).unwrap_err().kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            quote(&order(Status::Started), WORKER, -1.0)
                .unwrap_err()
                .kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn payment_needs_final_cost() {
        let err = mark_received(&order(Status::Started), WORKER).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn handshake_closes_in_either_order() {
        let mut started = order(Status::Started);
        started.final_cost = Some(45.0);

        let received = mark_received(&started, WORKER).unwrap();
        assert_eq!(received.status, Status::Started);
        assert_eq!(received.payment_status, PaymentStatus::Received);
        let closed = mark_sent(&received, CLIENT).unwrap();
        assert_eq!(closed.status, Status::Closed);

        let sent = mark_sent(&started, CLIENT).unwrap();
        assert_eq!(sent.status, Status::Started);
        assert_eq!(sent.payment_status, PaymentStatus::Sent);
        let closed = mark_received(&sent, WORKER).unwrap();
        assert_eq!(closed.status, Status::Closed);
        assert_eq!(closed.payment_status, PaymentStatus::Received);
    }

    #[test]
    fn marking_twice_is_rejected() {
        let mut started = order(Status::Started);
        started.final_cost = Some(45.0);
        let sent = mark_sent(&started, CLIENT).unwrap();
        assert_eq!(
            mark_sent(&sent, CLIENT).unwrap_err().kind(),
            ErrorKind::InvalidState
        );
    }

    #[test]
    fn sweep_expires_only_overdue_pending() {
        assert_eq!(
            expire(&order(Status::Pending), after_slot()).unwrap().status,
            Status::Expired
        );
        assert!(expire(&order(Status::Pending), before_slot()).is_err());
        assert!(expire(&order(Status::Accepted), after_slot()).is_err());
    }
}
