use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use super::rows::{
    ADDRESS_COLUMNS, AddressRow, PROFESSION_COLUMNS, ProfessionRow, REVIEW_COLUMNS, ReviewRow,
    WORK_ORDER_COLUMNS, WORKER_PROFILE_COLUMNS, WorkOrderRow, WorkerProfileRow,
};
use crate::error::{Error, Result};
use crate::model::*;
use crate::reputation::Reputation;
use crate::store::StoreTx;

/// Write transaction on Postgres. Rolls back when dropped uncommitted.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

impl PgTx {
    pub(super) fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn lock_work_order(&mut self, id: WorkOrderId) -> Result<WorkOrder> {
        let sql = format!("SELECT {WORK_ORDER_COLUMNS} FROM work_orders WHERE id = $1 FOR UPDATE");
        let row: Option<WorkOrderRow> = sqlx::query_as(&sql)
            .bind(id.0)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.ok_or_else(|| Error::NotFound(format!("work order {id}")))?
            .try_into_work_order()
    }

    async fn insert_work_order(&mut self, new: &NewWorkOrder) -> Result<WorkOrder> {
        let sql = format!(
            "INSERT INTO work_orders
                (profession_id, booked_by, assigned_to, tags, description,
                 scheduled_date, scheduled_time, status, payment_status, estimated_cost)
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', 'pending', $8)
             RETURNING {WORK_ORDER_COLUMNS}"
        );
        let row: WorkOrderRow = sqlx::query_as(&sql)
            .bind(new.profession_id.0)
            .bind(new.booked_by.0)
            .bind(new.assigned_to.0)
            .bind(&new.tags)
            .bind(&new.description)
            .bind(new.scheduled_date)
            .bind(new.scheduled_time)
            .bind(new.estimated_cost)
            .fetch_one(&mut *self.tx)
            .await?;
        row.try_into_work_order()
    }

    async fn update_work_order(
        &mut self,
        expected: &WorkOrder,
        next: &WorkOrder,
    ) -> Result<WorkOrder> {
        let sql = format!(
            "UPDATE work_orders
             SET status = $1, payment_status = $2, final_cost = $3, modified_at = now()
             WHERE id = $4 AND status = $5 AND payment_status = $6
             RETURNING {WORK_ORDER_COLUMNS}"
        );
        let row: Option<WorkOrderRow> = sqlx::query_as(&sql)
            .bind(next.status.as_str())
            .bind(next.payment_status.as_str())
            .bind(next.final_cost)
            .bind(expected.id.0)
            .bind(expected.status.as_str())
            .bind(expected.payment_status.as_str())
            .fetch_optional(&mut *self.tx)
            .await?;
        match row {
            Some(row) => row.try_into_work_order(),
            None => Err(Error::ConcurrencyConflict(format!(
                "work order {} is no longer {}/{}",
                expected.id, expected.status, expected.payment_status
            ))),
        }
    }

    async fn get_profession(&mut self, id: ProfessionId) -> Result<Profession> {
        let sql = format!("SELECT {PROFESSION_COLUMNS} FROM professions WHERE id = $1");
        let row: Option<ProfessionRow> = sqlx::query_as(&sql)
            .bind(id.0)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(Profession::from)
            .ok_or_else(|| Error::NotFound(format!("profession {id}")))
    }

    async fn get_role(&mut self, user: UserId) -> Result<Role> {
        let row: Option<(String,)> = sqlx::query_as("SELECT role FROM users WHERE id = $1")
            .bind(user.0)
            .fetch_optional(&mut *self.tx)
            .await?;
        let (role,) = row.ok_or_else(|| Error::NotFound(format!("user {user}")))?;
        role.parse()
    }

    async fn set_role(&mut self, user: UserId, role: Role) -> Result<()> {
        let result = sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
            .bind(role.as_str())
            .bind(user.0)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("user {user}")));
        }
        Ok(())
    }

    async fn get_address(&mut self, user: UserId) -> Result<Option<Address>> {
        let sql = format!("SELECT {ADDRESS_COLUMNS} FROM user_addresses WHERE user_id = $1");
        let row: Option<AddressRow> = sqlx::query_as(&sql)
            .bind(user.0)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(Address::from))
    }

    async fn find_worker_profile(
        &mut self,
        user: UserId,
        profession: ProfessionId,
    ) -> Result<Option<WorkerProfile>> {
        let sql = format!(
            "SELECT {WORKER_PROFILE_COLUMNS} FROM worker_profiles
             WHERE user_id = $1 AND profession_id = $2"
        );
        let row: Option<WorkerProfileRow> = sqlx::query_as(&sql)
            .bind(user.0)
            .bind(profession.0)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(WorkerProfileRow::try_into_profile).transpose()
    }

    async fn insert_worker_profile(&mut self, new: &NewWorkerProfile) -> Result<WorkerProfile> {
        let sql = format!(
            "INSERT INTO worker_profiles (user_id, profession_id, hourly_rate, bio)
             VALUES ($1, $2, $3, $4)
             RETURNING {WORKER_PROFILE_COLUMNS}"
        );
        let row: WorkerProfileRow = sqlx::query_as(&sql)
            .bind(new.user_id.0)
            .bind(new.profession_id.0)
            .bind(new.hourly_rate)
            .bind(&new.bio)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Error::InvalidState(format!(
                        "user {} already has a profile for profession {}",
                        new.user_id, new.profession_id
                    ))
                } else {
                    e.into()
                }
            })?;
        row.try_into_profile()
    }

    async fn find_review(&mut self, work_order: WorkOrderId) -> Result<Option<Review>> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE work_order_id = $1");
        let row: Option<ReviewRow> = sqlx::query_as(&sql)
            .bind(work_order.0)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(ReviewRow::try_into_review).transpose()
    }

    async fn insert_review(&mut self, new: &NewReview) -> Result<Review> {
        let sql = format!(
            "INSERT INTO reviews (work_order_id, author_id, worker_id, rating, body)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {REVIEW_COLUMNS}"
        );
        let row: ReviewRow = sqlx::query_as(&sql)
            .bind(new.work_order_id.0)
            .bind(new.author_id.0)
            .bind(new.worker_id.0)
            .bind(i16::from(new.rating))
            .bind(&new.text)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Error::InvalidState(format!(
                        "work order {} is already reviewed",
                        new.work_order_id
                    ))
                } else {
                    e.into()
                }
            })?;
        row.try_into_review()
    }

    async fn update_review(
        &mut self,
        id: ReviewId,
        rating: u8,
        text: Option<String>,
    ) -> Result<Review> {
        let sql = format!(
            "UPDATE reviews SET rating = $1, body = $2, edited = TRUE, modified_at = now()
             WHERE id = $3
             RETURNING {REVIEW_COLUMNS}"
        );
        let row: Option<ReviewRow> = sqlx::query_as(&sql)
            .bind(i16::from(rating))
            .bind(text)
            .bind(id.0)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.ok_or_else(|| Error::NotFound(format!("review {id}")))?
            .try_into_review()
    }

    async fn lock_worker_profiles(&mut self, worker: UserId) -> Result<()> {
        sqlx::query("SELECT id FROM worker_profiles WHERE user_id = $1 ORDER BY id FOR UPDATE")
            .bind(worker.0)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn worker_ratings(&mut self, worker: UserId) -> Result<Vec<u8>> {
        let rows: Vec<(i16,)> = sqlx::query_as("SELECT rating FROM reviews WHERE worker_id = $1")
            .bind(worker.0)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.into_iter()
            .map(|(r,)| {
                u8::try_from(r).map_err(|_| Error::Other(format!("bad stored rating {r}")))
            })
            .collect()
    }

    async fn set_reputation(&mut self, worker: UserId, reputation: Reputation) -> Result<()> {
        let count = i32::try_from(reputation.review_count)
            .map_err(|_| Error::Other(format!("review count overflow for worker {worker}")))?;
        sqlx::query(
            "UPDATE worker_profiles SET avg_rating = $1, review_count = $2, modified_at = now()
             WHERE user_id = $3",
        )
        .bind(reputation.avg_rating)
        .bind(count)
        .bind(worker.0)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
