//! Read-only queries: worker ranking and profession recommendations.

use std::time::Instant;

use opentelemetry::KeyValue;

use super::{Engine, record_duration};
use crate::error::Result;
use crate::model::{Coordinates, Identity, ProfessionId};
use crate::ranking::{self, RankedWorker};
use crate::recommend::{self, Recommendation};
use crate::store::Store;
use crate::telemetry::metrics;

impl<S: Store> Engine<S> {
    /// Candidate workers for `profession` around `origin`, best first.
    ///
    /// Takes no locks. The peer mean rate is re-read on every call.
    pub async fn rank_workers(
        &self,
        who: &Identity,
        profession: ProfessionId,
        origin: Coordinates,
    ) -> Result<Vec<RankedWorker>> {
        let started = Instant::now();
        self.store.get_profession(profession).await?;

        let Some(mean_peer_rate) = self.store.mean_hourly_rate(profession).await? else {
            return Ok(Vec::new());
        };
        let candidates = self.store.ranking_candidates(profession).await?;
        let considered = candidates.len();
        let ranked = ranking::rank(
            candidates,
            origin,
            mean_peer_rate,
            &self.weights,
            self.geo.as_ref(),
            Some(who.id),
        );

        tracing::debug!(
            profession = %profession,
            considered,
            ranked = ranked.len(),
            mean_peer_rate,
            "workers ranked"
        );
        metrics::ranking_queries().add(1, &[KeyValue::new("profession_id", profession.0)]);
        record_duration("rank_workers", started);
        Ok(ranked)
    }

    /// Professions the caller is likely to book next.
    ///
    /// Without a model, or for a caller with no closed bookings, this is the
    /// whole catalog in id order with no scores.
    pub async fn recommend_professions(
        &self,
        who: &Identity,
        count: usize,
    ) -> Result<Vec<Recommendation>> {
        let catalog = self.store.list_professions().await?;
        let Some(model) = &self.recommender else {
            return Ok(Recommendation::unranked(catalog));
        };
        if self.store.count_closed_bookings(who.id).await? == 0 {
            return Ok(Recommendation::unranked(catalog));
        }
        let booked = self.store.booked_professions(who.id).await?;
        recommend::rank_unbooked(model.as_ref(), who.id, catalog, &booked, count)
    }
}
