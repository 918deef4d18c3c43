//! Internal row types for sqlx::FromRow and their domain conversions.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::error::{Error, Result};
use crate::model::*;
use crate::ranking::Candidate;

pub(super) const WORK_ORDER_COLUMNS: &str = "id, profession_id, booked_by, assigned_to, tags, \
     description, scheduled_date, scheduled_time, status, payment_status, estimated_cost, \
     final_cost, created_at, modified_at";

pub(super) const WORKER_PROFILE_COLUMNS: &str = "id, user_id, profession_id, hourly_rate, \
     avg_rating, review_count, bio, created_at, modified_at";

pub(super) const REVIEW_COLUMNS: &str =
    "id, work_order_id, author_id, worker_id, rating, body, edited, created_at, modified_at";

pub(super) const PROFESSION_COLUMNS: &str = "id, name, description, estimated_time_hours";

pub(super) const ADDRESS_COLUMNS: &str =
    "user_id, house_name, street, city, state, pincode, latitude, longitude";

#[derive(sqlx::FromRow)]
pub(super) struct WorkOrderRow {
    id: i64,
    profession_id: i64,
    booked_by: i64,
    assigned_to: i64,
    tags: Vec<String>,
    description: Option<String>,
    scheduled_date: NaiveDate,
    scheduled_time: NaiveTime,
    status: String,
    payment_status: String,
    estimated_cost: f64,
    final_cost: Option<f64>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl WorkOrderRow {
    pub(super) fn try_into_work_order(self) -> Result<WorkOrder> {
        Ok(WorkOrder {
            id: WorkOrderId(self.id),
            profession_id: ProfessionId(self.profession_id),
            booked_by: UserId(self.booked_by),
            assigned_to: UserId(self.assigned_to),
            tags: self.tags,
            description: self.description,
            scheduled_date: self.scheduled_date,
            scheduled_time: self.scheduled_time,
            status: self.status.parse()?,
            payment_status: self.payment_status.parse()?,
            estimated_cost: self.estimated_cost,
            final_cost: self.final_cost,
            created_at: self.created_at,
            modified_at: self.modified_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct WorkerProfileRow {
    id: i64,
    user_id: i64,
    profession_id: i64,
    hourly_rate: f64,
    avg_rating: f64,
    review_count: i32,
    bio: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl WorkerProfileRow {
    pub(super) fn try_into_profile(self) -> Result<WorkerProfile> {
        Ok(WorkerProfile {
            id: WorkerProfileId(self.id),
            user_id: UserId(self.user_id),
            profession_id: ProfessionId(self.profession_id),
            hourly_rate: self.hourly_rate,
            avg_rating: self.avg_rating,
            review_count: u32::try_from(self.review_count)
                .map_err(|_| Error::Other(format!("negative review_count on profile {}", self.id)))?,
            bio: self.bio,
            created_at: self.created_at,
            modified_at: self.modified_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct CandidateRow {
    #[sqlx(flatten)]
    profile: WorkerProfileRow,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl CandidateRow {
    pub(super) fn try_into_candidate(self) -> Result<Candidate> {
        Ok(Candidate {
            profile: self.profile.try_into_profile()?,
            coordinates: coordinates(self.latitude, self.longitude),
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct ReviewRow {
    id: i64,
    work_order_id: i64,
    author_id: i64,
    worker_id: i64,
    rating: i16,
    body: Option<String>,
    edited: bool,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl ReviewRow {
    pub(super) fn try_into_review(self) -> Result<Review> {
        Ok(Review {
            id: ReviewId(self.id),
            work_order_id: WorkOrderId(self.work_order_id),
            author_id: UserId(self.author_id),
            worker_id: UserId(self.worker_id),
            rating: u8::try_from(self.rating)
                .map_err(|_| Error::Other(format!("bad rating on review {}", self.id)))?,
            text: self.body,
            edited: self.edited,
            created_at: self.created_at,
            modified_at: self.modified_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct ProfessionRow {
    id: i64,
    name: String,
    description: Option<String>,
    estimated_time_hours: f64,
}

impl From<ProfessionRow> for Profession {
    fn from(row: ProfessionRow) -> Self {
        Self {
            id: ProfessionId(row.id),
            name: row.name,
            description: row.description,
            estimated_time_hours: row.estimated_time_hours,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct AddressRow {
    user_id: i64,
    house_name: Option<String>,
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    pincode: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            user_id: UserId(row.user_id),
            house_name: row.house_name,
            street: row.street,
            city: row.city,
            state: row.state,
            pincode: row.pincode,
            coordinates: coordinates(row.latitude, row.longitude),
        }
    }
}

/// Both halves present and on the globe, or nothing.
fn coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Option<Coordinates> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => Coordinates::new(lat, lon).ok(),
        _ => None,
    }
}
