//! Persistence seam for the engine.
//!
//! [`Store`] covers lock-free reads (ranking, listings). Every write goes
//! through a [`StoreTx`]: a single-writer transaction that commits on
//! [`StoreTx::commit`] and rolls back when dropped.

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::error::Result;
use crate::model::*;
use crate::ranking::Candidate;
use crate::reputation::Reputation;

pub use memory::MemoryStore;

/// What a liveness check is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveScope {
    Profession(ProfessionId),
    /// Orders the user booked or is assigned to.
    User(UserId),
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Tx: StoreTx;

    /// Open a write transaction.
    async fn begin(&self) -> Result<Self::Tx>;

    async fn get_work_order(&self, id: WorkOrderId) -> Result<WorkOrder>;

    /// Orders booked by `client`, newest first.
    async fn list_booked(&self, client: UserId) -> Result<Vec<WorkOrder>>;

    /// Orders assigned to `worker`, newest first.
    async fn list_assigned(&self, worker: UserId) -> Result<Vec<WorkOrder>>;

    /// Ids of `pending` orders scheduled before `now`.
    async fn list_overdue_pending(&self, now: NaiveDateTime) -> Result<Vec<WorkOrderId>>;

    /// Number of non-terminal orders within `scope`.
    async fn count_live_work_orders(&self, scope: LiveScope) -> Result<u64>;

    async fn get_profession(&self, id: ProfessionId) -> Result<Profession>;

    async fn list_professions(&self) -> Result<Vec<Profession>>;

    async fn get_worker_profile(
        &self,
        user: UserId,
        profession: ProfessionId,
    ) -> Result<WorkerProfile>;

    /// Every profile for `profession` with its owner's coordinates.
    async fn ranking_candidates(&self, profession: ProfessionId) -> Result<Vec<Candidate>>;

    /// Mean hourly rate over all profiles for `profession`; `None` if there
    /// are none.
    async fn mean_hourly_rate(&self, profession: ProfessionId) -> Result<Option<f64>>;

    /// Number of `closed` orders booked by `client`.
    async fn count_closed_bookings(&self, client: UserId) -> Result<u64>;

    /// Distinct professions `client` has ever booked.
    async fn booked_professions(&self, client: UserId) -> Result<Vec<ProfessionId>>;

    async fn get_review(&self, work_order: WorkOrderId) -> Result<Review>;
}

#[async_trait]
pub trait StoreTx: Send {
    /// Read an order and hold it against concurrent writers until the
    /// transaction ends.
    async fn lock_work_order(&mut self, id: WorkOrderId) -> Result<WorkOrder>;

    async fn insert_work_order(&mut self, new: &NewWorkOrder) -> Result<WorkOrder>;

    /// Compare-and-set: writes `next`'s status, payment status and final cost
    /// only if the stored order still has `expected`'s status and payment
    /// status. Fails with `ConcurrencyConflict` otherwise.
    async fn update_work_order(
        &mut self,
        expected: &WorkOrder,
        next: &WorkOrder,
    ) -> Result<WorkOrder>;

    async fn get_profession(&mut self, id: ProfessionId) -> Result<Profession>;

    /// `NotFound` if the user does not exist.
    async fn get_role(&mut self, user: UserId) -> Result<Role>;

    async fn set_role(&mut self, user: UserId, role: Role) -> Result<()>;

    async fn get_address(&mut self, user: UserId) -> Result<Option<Address>>;

    async fn find_worker_profile(
        &mut self,
        user: UserId,
        profession: ProfessionId,
    ) -> Result<Option<WorkerProfile>>;

    async fn insert_worker_profile(&mut self, new: &NewWorkerProfile) -> Result<WorkerProfile>;

    async fn find_review(&mut self, work_order: WorkOrderId) -> Result<Option<Review>>;

    /// `InvalidState` if the order already has a review.
    async fn insert_review(&mut self, new: &NewReview) -> Result<Review>;

    /// Replace rating and text and mark the review edited.
    async fn update_review(
        &mut self,
        id: ReviewId,
        rating: u8,
        text: Option<String>,
    ) -> Result<Review>;

    /// Hold every profile of `worker` against other ledger writers until the
    /// transaction ends. Taken before reading ratings so that concurrent
    /// reviews of one worker recompute in turn.
    async fn lock_worker_profiles(&mut self, worker: UserId) -> Result<()>;

    /// Every stored rating targeting `worker`.
    async fn worker_ratings(&mut self, worker: UserId) -> Result<Vec<u8>>;

    /// Write the ledger onto every profile `worker` holds.
    async fn set_reputation(&mut self, worker: UserId, reputation: Reputation) -> Result<()>;

    async fn commit(self) -> Result<()>;
}
