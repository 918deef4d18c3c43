//! Reviews left by clients on closed work orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ReviewId, UserId, WorkOrderId};

/// At most one per work order. Author, worker and order never change after
/// creation; rating and text may be edited, which sets `edited`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub work_order_id: WorkOrderId,
    pub author_id: UserId,
    pub worker_id: UserId,
    pub rating: u8,
    pub text: Option<String>,
    pub edited: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Parameters for inserting a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub work_order_id: WorkOrderId,
    pub author_id: UserId,
    pub worker_id: UserId,
    pub rating: u8,
    pub text: Option<String>,
}
