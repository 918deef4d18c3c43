//! Shared fixtures for the in-memory integration tests.
#![allow(dead_code)]

use chrono::{Duration, NaiveDateTime, NaiveTime, Utc};
use neighbourpro::engine::Engine;
use neighbourpro::model::*;
use neighbourpro::store::{MemoryStore, Store, StoreTx};

/// One client, one worker offering one profession at 20/h, both with
/// coordinates. The profession takes 2 hours.
pub struct Market {
    pub engine: Engine<MemoryStore>,
    pub client: Identity,
    pub worker: Identity,
    pub profession: Profession,
}

pub fn coords(lat: f64, lon: f64) -> Coordinates {
    Coordinates::new(lat, lon).unwrap()
}

/// 10:00 tomorrow, always ahead of now.
pub fn tomorrow() -> NaiveDateTime {
    (Utc::now() + Duration::days(1))
        .date_naive()
        .and_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap())
}

/// 10:00 yesterday, always behind now.
pub fn yesterday() -> NaiveDateTime {
    (Utc::now() - Duration::days(1))
        .date_naive()
        .and_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap())
}

pub async fn market() -> Market {
    market_with(Engine::in_memory()).await
}

pub async fn market_with(engine: Engine<MemoryStore>) -> Market {
    let store = engine.store();
    let profession = store.add_profession("plumber", 2.0).await;
    let client = new_client(store).await;
    let worker = new_worker(&engine, &profession, 20.0, coords(12.98, 77.60)).await;
    Market {
        engine,
        client,
        worker,
        profession,
    }
}

/// A plain user with a stored address.
pub async fn new_client(store: &MemoryStore) -> Identity {
    let id = store.add_user(Role::User).await;
    store.set_address(Address::at(id, coords(12.97, 77.59))).await;
    Identity::new(id, Role::User)
}

/// A user registered as a worker for `profession`, living at `at`.
pub async fn new_worker(
    engine: &Engine<MemoryStore>,
    profession: &Profession,
    hourly_rate: f64,
    at: Coordinates,
) -> Identity {
    let store = engine.store();
    let id = store.add_user(Role::User).await;
    store.set_address(Address::at(id, at)).await;
    let who = Identity::new(id, Role::User);
    engine
        .register_worker(&who, profession.id, hourly_rate, "ten years on the job")
        .await
        .unwrap();
    Identity::new(id, Role::Worker)
}

impl Market {
    pub fn booking(&self) -> NewBooking {
        NewBooking::at(self.worker.id, self.profession.id, tomorrow())
    }

    pub async fn book(&self) -> WorkOrder {
        self.engine
            .book_work(&self.client, self.booking())
            .await
            .unwrap()
    }

    /// Book and drive an order all the way to `closed`.
    pub async fn closed_order(&self) -> WorkOrder {
        let order = self.book().await;
        let e = &self.engine;
        e.accept_work(&self.worker, order.id).await.unwrap();
        e.start_work(&self.worker, order.id).await.unwrap();
        e.quote_final_cost(&self.worker, order.id, 45.0).await.unwrap();
        e.mark_payment_received(&self.worker, order.id).await.unwrap();
        e.mark_payment_sent(&self.client, order.id).await.unwrap()
    }

    /// A pending order whose slot is already behind us, written straight to
    /// the store since booking refuses past slots.
    pub async fn overdue_order(&self) -> WorkOrder {
        let slot = yesterday();
        let mut tx = self.engine.store().begin().await.unwrap();
        let order = tx
            .insert_work_order(&NewWorkOrder {
                profession_id: self.profession.id,
                booked_by: self.client.id,
                assigned_to: self.worker.id,
                tags: Vec::new(),
                description: None,
                scheduled_date: slot.date(),
                scheduled_time: slot.time(),
                estimated_cost: 40.0,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        order
    }

    pub async fn profile(&self) -> WorkerProfile {
        self.engine
            .store()
            .get_worker_profile(self.worker.id, self.profession.id)
            .await
            .unwrap()
    }
}
