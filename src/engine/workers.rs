//! Worker registration and deletion preconditions.

use super::Engine;
use crate::error::{Error, Result};
use crate::model::*;
use crate::store::{LiveScope, Store, StoreTx};

impl<S: Store> Engine<S> {
    /// Opt the caller into offering `profession` at `hourly_rate`.
    ///
    /// Creates the profile and switches the caller's role to `worker` in one
    /// transaction. Admins keep their role.
    pub async fn register_worker(
        &self,
        who: &Identity,
        profession: ProfessionId,
        hourly_rate: f64,
        bio: &str,
    ) -> Result<WorkerProfile> {
        if !hourly_rate.is_finite() || hourly_rate <= 0.0 {
            return Err(Error::Validation(format!(
                "hourly rate {hourly_rate} must be positive"
            )));
        }

        let mut tx = self.store.begin().await?;
        let role = tx.get_role(who.id).await?;
        tx.get_profession(profession).await?;
        if tx.find_worker_profile(who.id, profession).await?.is_some() {
            return Err(Error::InvalidState(format!(
                "user {} already has a profile for profession {profession}",
                who.id
            )));
        }
        let profile = tx
            .insert_worker_profile(&NewWorkerProfile {
                user_id: who.id,
                profession_id: profession,
                hourly_rate,
                bio: bio.trim().to_string(),
            })
            .await?;
        if role == Role::User {
            tx.set_role(who.id, Role::Worker).await?;
        }
        tx.commit().await?;

        tracing::info!(
            user = %who.id,
            profession = %profession,
            hourly_rate,
            "worker registered"
        );
        Ok(profile)
    }

    /// Fails `InvalidState` while any live order references `profession`.
    pub async fn ensure_profession_deletable(&self, profession: ProfessionId) -> Result<()> {
        self.store.get_profession(profession).await?;
        let live = self
            .store
            .count_live_work_orders(LiveScope::Profession(profession))
            .await?;
        if live > 0 {
            return Err(Error::InvalidState(format!(
                "profession {profession} has {live} live work orders"
            )));
        }
        Ok(())
    }

    /// Fails `InvalidState` while `user` is a party to any live order.
    pub async fn ensure_user_deletable(&self, user: UserId) -> Result<()> {
        let live = self
            .store
            .count_live_work_orders(LiveScope::User(user))
            .await?;
        if live > 0 {
            return Err(Error::InvalidState(format!(
                "user {user} is a party to {live} live work orders"
            )));
        }
        Ok(())
    }
}
