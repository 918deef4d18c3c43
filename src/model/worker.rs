//! Worker profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProfessionId, UserId, WorkerProfileId};

/// A user's opt-in record for offering a profession.
///
/// `avg_rating` and `review_count` are written only by the reputation
/// ledger when a review is folded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerProfile {
    pub id: WorkerProfileId,
    pub user_id: UserId,
    pub profession_id: ProfessionId,
    pub hourly_rate: f64,
    pub avg_rating: f64,
    pub review_count: u32,
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Parameters for creating a worker profile.
#[derive(Debug, Clone)]
pub struct NewWorkerProfile {
    pub user_id: UserId,
    pub profession_id: ProfessionId,
    pub hourly_rate: f64,
    pub bio: String,
}
