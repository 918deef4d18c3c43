//! In-process store.
//!
//! One tokio mutex guards all tables. A transaction holds the lock for its
//! whole lifetime and works on a copy; commit swaps the copy in, drop throws
//! it away. Used by tests and local tooling.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{LiveScope, Store, StoreTx};
use crate::error::{Error, Result};
use crate::model::*;
use crate::ranking::Candidate;
use crate::reputation::Reputation;

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, Role>,
    addresses: BTreeMap<UserId, Address>,
    professions: BTreeMap<ProfessionId, Profession>,
    profiles: BTreeMap<(UserId, ProfessionId), WorkerProfile>,
    work_orders: BTreeMap<WorkOrderId, WorkOrder>,
    reviews: BTreeMap<ReviewId, Review>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn work_order(&self, id: WorkOrderId) -> Result<&WorkOrder> {
        self.work_orders
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("work order {id}")))
    }

    fn profession(&self, id: ProfessionId) -> Result<&Profession> {
        self.professions
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("profession {id}")))
    }

    fn newest_first<'a>(orders: impl Iterator<Item = &'a WorkOrder>) -> Vec<WorkOrder> {
        let mut out: Vec<WorkOrder> = orders.cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        out
    }
}

/// Store backed by process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_reputation_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with `role` and return its id.
    pub async fn add_user(&self, role: Role) -> UserId {
        let mut tables = self.tables.lock().await;
        let id = UserId(tables.next_id());
        tables.users.insert(id, role);
        id
    }

    pub async fn set_address(&self, address: Address) {
        let mut tables = self.tables.lock().await;
        tables.addresses.insert(address.user_id, address);
    }

    pub async fn add_profession(&self, name: &str, estimated_time_hours: f64) -> Profession {
        let mut tables = self.tables.lock().await;
        let profession = Profession {
            id: ProfessionId(tables.next_id()),
            name: name.to_string(),
            description: None,
            estimated_time_hours,
        };
        tables.professions.insert(profession.id, profession.clone());
        profession
    }

    pub async fn get_role(&self, user: UserId) -> Option<Role> {
        self.tables.lock().await.users.get(&user).copied()
    }

    /// Make every later ledger write fail with `DependencyFailure`, to
    /// exercise rollback of the review + ledger pair.
    pub fn fail_reputation_writes(&self, fail: bool) {
        self.fail_reputation_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTx {
            guard,
            working,
            fail_reputation_writes: self.fail_reputation_writes.load(Ordering::SeqCst),
        })
    }

    async fn get_work_order(&self, id: WorkOrderId) -> Result<WorkOrder> {
        self.tables.lock().await.work_order(id).cloned()
    }

    async fn list_booked(&self, client: UserId) -> Result<Vec<WorkOrder>> {
        let tables = self.tables.lock().await;
        Ok(Tables::newest_first(
            tables.work_orders.values().filter(|o| o.booked_by == client),
        ))
    }

    async fn list_assigned(&self, worker: UserId) -> Result<Vec<WorkOrder>> {
        let tables = self.tables.lock().await;
        Ok(Tables::newest_first(
            tables
                .work_orders
                .values()
                .filter(|o| o.assigned_to == worker),
        ))
    }

    async fn list_overdue_pending(&self, now: NaiveDateTime) -> Result<Vec<WorkOrderId>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .work_orders
            .values()
            .filter(|o| o.status == Status::Pending && o.is_overdue(now))
            .map(|o| o.id)
            .collect())
    }

    async fn count_live_work_orders(&self, scope: LiveScope) -> Result<u64> {
        let tables = self.tables.lock().await;
        let count = tables
            .work_orders
            .values()
            .filter(|o| !o.status.is_terminal())
            .filter(|o| match scope {
                LiveScope::Profession(p) => o.profession_id == p,
                LiveScope::User(u) => o.involves(u),
            })
            .count();
        Ok(count as u64)
    }

    async fn get_profession(&self, id: ProfessionId) -> Result<Profession> {
        self.tables.lock().await.profession(id).cloned()
    }

    async fn list_professions(&self) -> Result<Vec<Profession>> {
        Ok(self.tables.lock().await.professions.values().cloned().collect())
    }

    async fn get_worker_profile(
        &self,
        user: UserId,
        profession: ProfessionId,
    ) -> Result<WorkerProfile> {
        self.tables
            .lock()
            .await
            .profiles
            .get(&(user, profession))
            .cloned()
            .ok_or_else(|| {
                Error::NotFound(format!("worker profile for user {user}, profession {profession}"))
            })
    }

    async fn ranking_candidates(&self, profession: ProfessionId) -> Result<Vec<Candidate>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .profiles
            .values()
            .filter(|p| p.profession_id == profession)
            .map(|p| Candidate {
                profile: p.clone(),
                coordinates: tables
                    .addresses
                    .get(&p.user_id)
                    .and_then(|a| a.coordinates),
            })
            .collect())
    }

    async fn mean_hourly_rate(&self, profession: ProfessionId) -> Result<Option<f64>> {
        let tables = self.tables.lock().await;
        let rates: Vec<f64> = tables
            .profiles
            .values()
            .filter(|p| p.profession_id == profession)
            .map(|p| p.hourly_rate)
            .collect();
        if rates.is_empty() {
            return Ok(None);
        }
        Ok(Some(rates.iter().sum::<f64>() / rates.len() as f64))
    }

    async fn count_closed_bookings(&self, client: UserId) -> Result<u64> {
        let tables = self.tables.lock().await;
        let count = tables
            .work_orders
            .values()
            .filter(|o| o.booked_by == client && o.status == Status::Closed)
            .count();
        Ok(count as u64)
    }

    async fn booked_professions(&self, client: UserId) -> Result<Vec<ProfessionId>> {
        let tables = self.tables.lock().await;
        let set: BTreeSet<ProfessionId> = tables
            .work_orders
            .values()
            .filter(|o| o.booked_by == client)
            .map(|o| o.profession_id)
            .collect();
        Ok(set.into_iter().collect())
    }

    async fn get_review(&self, work_order: WorkOrderId) -> Result<Review> {
        self.tables
            .lock()
            .await
            .reviews
            .values()
            .find(|r| r.work_order_id == work_order)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("review for work order {work_order}")))
    }
}

/// Write transaction over a [`MemoryStore`].
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    fail_reputation_writes: bool,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn lock_work_order(&mut self, id: WorkOrderId) -> Result<WorkOrder> {
        self.working.work_order(id).cloned()
    }

    async fn insert_work_order(&mut self, new: &NewWorkOrder) -> Result<WorkOrder> {
        let now = Utc::now();
        let order = WorkOrder {
            id: WorkOrderId(self.working.next_id()),
            profession_id: new.profession_id,
            booked_by: new.booked_by,
            assigned_to: new.assigned_to,
            tags: new.tags.clone(),
            description: new.description.clone(),
            scheduled_date: new.scheduled_date,
            scheduled_time: new.scheduled_time,
            status: Status::Pending,
            payment_status: PaymentStatus::Pending,
            estimated_cost: new.estimated_cost,
            final_cost: None,
            created_at: now,
            modified_at: now,
        };
        self.working.work_orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn update_work_order(
        &mut self,
        expected: &WorkOrder,
        next: &WorkOrder,
    ) -> Result<WorkOrder> {
        let stored = self
            .working
            .work_orders
            .get_mut(&expected.id)
            .ok_or_else(|| Error::NotFound(format!("work order {}", expected.id)))?;
        if stored.status != expected.status || stored.payment_status != expected.payment_status {
            return Err(Error::ConcurrencyConflict(format!(
                "work order {} changed to {}/{} underneath",
                expected.id, stored.status, stored.payment_status
            )));
        }
        stored.status = next.status;
        stored.payment_status = next.payment_status;
        stored.final_cost = next.final_cost;
        stored.modified_at = Utc::now();
        Ok(stored.clone())
    }

    async fn get_profession(&mut self, id: ProfessionId) -> Result<Profession> {
        self.working.profession(id).cloned()
    }

    async fn get_role(&mut self, user: UserId) -> Result<Role> {
        self.working
            .users
            .get(&user)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("user {user}")))
    }

    async fn set_role(&mut self, user: UserId, role: Role) -> Result<()> {
        let slot = self
            .working
            .users
            .get_mut(&user)
            .ok_or_else(|| Error::NotFound(format!("user {user}")))?;
        *slot = role;
        Ok(())
    }

    async fn get_address(&mut self, user: UserId) -> Result<Option<Address>> {
        Ok(self.working.addresses.get(&user).cloned())
    }

    async fn find_worker_profile(
        &mut self,
        user: UserId,
        profession: ProfessionId,
    ) -> Result<Option<WorkerProfile>> {
        Ok(self.working.profiles.get(&(user, profession)).cloned())
    }

    async fn insert_worker_profile(&mut self, new: &NewWorkerProfile) -> Result<WorkerProfile> {
        let key = (new.user_id, new.profession_id);
        if self.working.profiles.contains_key(&key) {
            return Err(Error::InvalidState(format!(
                "user {} already has a profile for profession {}",
                new.user_id, new.profession_id
            )));
        }
        let now = Utc::now();
        let profile = WorkerProfile {
            id: WorkerProfileId(self.working.next_id()),
            user_id: new.user_id,
            profession_id: new.profession_id,
            hourly_rate: new.hourly_rate,
            avg_rating: 0.0,
            review_count: 0,
            bio: new.bio.clone(),
            created_at: now,
            modified_at: now,
        };
        self.working.profiles.insert(key, profile.clone());
        Ok(profile)
    }

    async fn find_review(&mut self, work_order: WorkOrderId) -> Result<Option<Review>> {
        Ok(self
            .working
            .reviews
            .values()
            .find(|r| r.work_order_id == work_order)
            .cloned())
    }

    async fn insert_review(&mut self, new: &NewReview) -> Result<Review> {
        if self
            .working
            .reviews
            .values()
            .any(|r| r.work_order_id == new.work_order_id)
        {
            return Err(Error::InvalidState(format!(
                "work order {} is already reviewed",
                new.work_order_id
            )));
        }
        let now = Utc::now();
        let review = Review {
            id: ReviewId(self.working.next_id()),
            work_order_id: new.work_order_id,
            author_id: new.author_id,
            worker_id: new.worker_id,
            rating: new.rating,
            text: new.text.clone(),
            edited: false,
            created_at: now,
            modified_at: now,
        };
        self.working.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn update_review(
        &mut self,
        id: ReviewId,
        rating: u8,
        text: Option<String>,
    ) -> Result<Review> {
        let review = self
            .working
            .reviews
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("review {id}")))?;
        review.rating = rating;
        review.text = text;
        review.edited = true;
        review.modified_at = Utc::now();
        Ok(review.clone())
    }

    async fn lock_worker_profiles(&mut self, _worker: UserId) -> Result<()> {
        // The transaction already holds every table.
        Ok(())
    }

    async fn worker_ratings(&mut self, worker: UserId) -> Result<Vec<u8>> {
        Ok(self
            .working
            .reviews
            .values()
            .filter(|r| r.worker_id == worker)
            .map(|r| r.rating)
            .collect())
    }

    async fn set_reputation(&mut self, worker: UserId, reputation: Reputation) -> Result<()> {
        if self.fail_reputation_writes {
            return Err(Error::DependencyFailure(
                "reputation write rejected".to_string(),
            ));
        }
        let now = Utc::now();
        for profile in self
            .working
            .profiles
            .values_mut()
            .filter(|p| p.user_id == worker)
        {
            profile.avg_rating = reputation.avg_rating;
            profile.review_count = reputation.review_count;
            profile.modified_at = now;
        }
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let MemoryTx {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }
}
