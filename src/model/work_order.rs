//! Work orders: one client-to-worker engagement from booking to review.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProfessionId, UserId, WorkOrderId};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Work Order
// ---------------------------------------------------------------------------

/// A booked engagement tracked through its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: WorkOrderId,

    pub profession_id: ProfessionId,

    /// The client who booked the work.
    pub booked_by: UserId,

    /// The worker who performs it. Never equal to `booked_by`.
    pub assigned_to: UserId,

    pub tags: Vec<String>,
    pub description: Option<String>,

    /// Wall-clock schedule, UTC-naive: no offset is stored or applied.
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,

    pub status: Status,
    pub payment_status: PaymentStatus,

    /// Worker hourly rate times the profession's estimated hours, fixed at
    /// booking.
    pub estimated_cost: f64,

    /// Set by the worker once the order has started.
    pub final_cost: Option<f64>,

    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl WorkOrder {
    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.scheduled_date.and_time(self.scheduled_time)
    }

    /// Has the scheduled slot already passed at `now`?
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        self.scheduled_at() < now
    }

    /// Is `user` the client or the worker on this order?
    pub fn involves(&self, user: UserId) -> bool {
        self.booked_by == user || self.assigned_to == user
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Booked, awaiting the worker's answer.
    Pending,
    /// Worker agreed to do the work.
    Accepted,
    /// Worker declined. Terminal.
    Rejected,
    /// Client withdrew before acceptance. Terminal.
    Cancelled,
    /// Scheduled slot passed while still pending. Terminal.
    Expired,
    /// Work underway; final cost and payment happen here.
    Started,
    /// Paid on both sides. Terminal; enables review.
    Closed,
}

impl Status {
    /// Can transition from self to `to`?
    pub fn can_transition_to(self, to: Status) -> bool {
        use Status::*;
        matches!(
            (self, to),
            (Pending, Accepted)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Pending, Expired)
                | (Accepted, Started)
                | (Started, Closed)
        )
    }

    /// Is this a terminal status?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Status::Rejected | Status::Cancelled | Status::Expired | Status::Closed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Accepted => "accepted",
            Status::Rejected => "rejected",
            Status::Cancelled => "cancelled",
            Status::Expired => "expired",
            Status::Started => "started",
            Status::Closed => "closed",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Status::Pending),
            "accepted" => Ok(Status::Accepted),
            "rejected" => Ok(Status::Rejected),
            "cancelled" => Ok(Status::Cancelled),
            "expired" => Ok(Status::Expired),
            "started" => Ok(Status::Started),
            "closed" => Ok(Status::Closed),
            _ => Err(Error::Other(format!("unknown work order status: {s}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Payment Status
// ---------------------------------------------------------------------------

/// One half of the payment handshake. The client marks `Sent`, the worker
/// marks `Received`; the second mark closes the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Sent,
    Received,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Sent => "sent",
            PaymentStatus::Received => "received",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "sent" => Ok(PaymentStatus::Sent),
            "received" => Ok(PaymentStatus::Received),
            _ => Err(Error::Other(format!("unknown payment status: {s}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// A client's booking request. The engine's public API for creating work.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub(crate) worker: UserId,
    pub(crate) profession: ProfessionId,
    pub(crate) scheduled_date: NaiveDate,
    pub(crate) scheduled_time: NaiveTime,
    pub(crate) tags: Vec<String>,
    pub(crate) description: Option<String>,
}

impl NewBooking {
    pub fn new(
        worker: UserId,
        profession: ProfessionId,
        scheduled_date: NaiveDate,
        scheduled_time: NaiveTime,
    ) -> Self {
        Self {
            worker,
            profession,
            scheduled_date,
            scheduled_time,
            tags: Vec::new(),
            description: None,
        }
    }

    /// Convenience for a combined date and time.
    pub fn at(worker: UserId, profession: ProfessionId, scheduled: NaiveDateTime) -> Self {
        Self::new(worker, profession, scheduled.date(), scheduled.time())
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.scheduled_date.and_time(self.scheduled_time)
    }
}

/// A fully validated work order ready for insertion. Always starts
/// `pending` with payment `pending`.
#[derive(Debug, Clone)]
pub struct NewWorkOrder {
    pub profession_id: ProfessionId,
    pub booked_by: UserId,
    pub assigned_to: UserId,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub estimated_cost: f64,
}
