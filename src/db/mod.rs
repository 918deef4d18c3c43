//! Postgres-backed store: connection pool, migrations, health check.
//!
//! Reads run straight against the pool. Writes go through [`PgTx`], which
//! row-locks work orders with `FOR UPDATE` and guards every status write with
//! a conditional `UPDATE`.

mod rows;
mod tx;

pub use tx::PgTx;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::{Error, Result};
use crate::model::*;
use crate::ranking::Candidate;
use crate::store::{LiveScope, Store};
use rows::{
    CandidateRow, PROFESSION_COLUMNS, ProfessionRow, REVIEW_COLUMNS, ReviewRow,
    WORK_ORDER_COLUMNS, WORKER_PROFILE_COLUMNS, WorkOrderRow, WorkerProfileRow,
};

/// Database handle. Owns the connection pool shared by every operation.
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Connect to Postgres and create a connection pool.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::DependencyFailure(format!("migration failed: {e}")))?;
        Ok(())
    }

    /// Simple health check: run a SELECT 1.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// The underlying pool, for tooling and fixtures.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn list_work_orders_by(&self, column: &str, user: UserId) -> Result<Vec<WorkOrder>> {
        let sql = format!(
            "SELECT {WORK_ORDER_COLUMNS} FROM work_orders WHERE {column} = $1
             ORDER BY created_at DESC, id DESC"
        );
        let rows: Vec<WorkOrderRow> = sqlx::query_as(&sql)
            .bind(user.0)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(WorkOrderRow::try_into_work_order).collect()
    }
}

#[async_trait]
impl Store for Db {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx> {
        Ok(PgTx::new(self.pool.begin().await?))
    }

    async fn get_work_order(&self, id: WorkOrderId) -> Result<WorkOrder> {
        let sql = format!("SELECT {WORK_ORDER_COLUMNS} FROM work_orders WHERE id = $1");
        let row: Option<WorkOrderRow> = sqlx::query_as(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or_else(|| Error::NotFound(format!("work order {id}")))?
            .try_into_work_order()
    }

    async fn list_booked(&self, client: UserId) -> Result<Vec<WorkOrder>> {
        self.list_work_orders_by("booked_by", client).await
    }

    async fn list_assigned(&self, worker: UserId) -> Result<Vec<WorkOrder>> {
        self.list_work_orders_by("assigned_to", worker).await
    }

    async fn list_overdue_pending(&self, now: NaiveDateTime) -> Result<Vec<WorkOrderId>> {
        let ids: Vec<(i64,)> = sqlx::query_as(
            "SELECT id FROM work_orders
             WHERE status = 'pending' AND (scheduled_date + scheduled_time) < $1
             ORDER BY id",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(|(id,)| WorkOrderId(id)).collect())
    }

    async fn count_live_work_orders(&self, scope: LiveScope) -> Result<u64> {
        let (filter, id) = match scope {
            LiveScope::Profession(p) => ("profession_id = $1", p.0),
            LiveScope::User(u) => ("(booked_by = $1 OR assigned_to = $1)", u.0),
        };
        let sql = format!(
            "SELECT COUNT(*) FROM work_orders
             WHERE status NOT IN ('rejected', 'cancelled', 'expired', 'closed') AND {filter}"
        );
        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn get_profession(&self, id: ProfessionId) -> Result<Profession> {
        let sql = format!("SELECT {PROFESSION_COLUMNS} FROM professions WHERE id = $1");
        let row: Option<ProfessionRow> = sqlx::query_as(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Profession::from)
            .ok_or_else(|| Error::NotFound(format!("profession {id}")))
    }

    async fn list_professions(&self) -> Result<Vec<Profession>> {
        let sql = format!("SELECT {PROFESSION_COLUMNS} FROM professions ORDER BY id");
        let rows: Vec<ProfessionRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Profession::from).collect())
    }

    async fn get_worker_profile(
        &self,
        user: UserId,
        profession: ProfessionId,
    ) -> Result<WorkerProfile> {
        let sql = format!(
            "SELECT {WORKER_PROFILE_COLUMNS} FROM worker_profiles
             WHERE user_id = $1 AND profession_id = $2"
        );
        let row: Option<WorkerProfileRow> = sqlx::query_as(&sql)
            .bind(user.0)
            .bind(profession.0)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or_else(|| {
            Error::NotFound(format!(
                "worker profile for user {user}, profession {profession}"
            ))
        })?
        .try_into_profile()
    }

    async fn ranking_candidates(&self, profession: ProfessionId) -> Result<Vec<Candidate>> {
        let rows: Vec<CandidateRow> = sqlx::query_as(
            "SELECT wp.id, wp.user_id, wp.profession_id, wp.hourly_rate, wp.avg_rating,
                    wp.review_count, wp.bio, wp.created_at, wp.modified_at,
                    a.latitude, a.longitude
             FROM worker_profiles wp
             LEFT JOIN user_addresses a ON a.user_id = wp.user_id
             WHERE wp.profession_id = $1",
        )
        .bind(profession.0)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(CandidateRow::try_into_candidate).collect()
    }

    async fn mean_hourly_rate(&self, profession: ProfessionId) -> Result<Option<f64>> {
        let (mean,): (Option<f64>,) =
            sqlx::query_as("SELECT AVG(hourly_rate) FROM worker_profiles WHERE profession_id = $1")
                .bind(profession.0)
                .fetch_one(&self.pool)
                .await?;
        Ok(mean)
    }

    async fn count_closed_bookings(&self, client: UserId) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM work_orders WHERE booked_by = $1 AND status = 'closed'",
        )
        .bind(client.0)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn booked_professions(&self, client: UserId) -> Result<Vec<ProfessionId>> {
        let ids: Vec<(i64,)> = sqlx::query_as(
            "SELECT DISTINCT profession_id FROM work_orders WHERE booked_by = $1
             ORDER BY profession_id",
        )
        .bind(client.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(|(id,)| ProfessionId(id)).collect())
    }

    async fn get_review(&self, work_order: WorkOrderId) -> Result<Review> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE work_order_id = $1");
        let row: Option<ReviewRow> = sqlx::query_as(&sql)
            .bind(work_order.0)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or_else(|| Error::NotFound(format!("review for work order {work_order}")))?
            .try_into_review()
    }
}
