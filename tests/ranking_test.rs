//! Integration tests for worker ranking and profession recommendations.

mod common;

use common::*;
use neighbourpro::engine::Engine;
use neighbourpro::error::{ErrorKind, Result};
use neighbourpro::geo::GeoDistance;
use neighbourpro::model::*;
use neighbourpro::recommend::RecommendationModel;

/// Every worker is the same distance away.
struct FixedDistance(f64);

impl GeoDistance for FixedDistance {
    fn distance_km(&self, _a: Coordinates, _b: Coordinates) -> f64 {
        self.0
    }
}

fn requester() -> Coordinates {
    coords(12.97, 77.59)
}

#[tokio::test]
async fn closer_cheaper_better_rated_workers_rank_first() {
    let m = market().await;
    let far = new_worker(&m.engine, &m.profession, 20.0, coords(13.30, 77.90)).await;

    let ranked = m
        .engine
        .rank_workers(&m.client, m.profession.id, requester())
        .await
        .unwrap();

    let ids: Vec<_> = ranked.iter().map(|w| w.worker_id).collect();
    assert_eq!(ids, vec![m.worker.id, far.id]);
    assert!(ranked[0].distance_km < ranked[1].distance_km);
    assert!(ranked.iter().all(|w| w.score.is_finite()));
}

#[tokio::test]
async fn reviews_move_a_worker_up() {
    let m = market().await;
    let rival = new_worker(&m.engine, &m.profession, 20.0, coords(12.98, 77.60)).await;

    let order = m.closed_order().await;
    m.engine
        .submit_review(&m.client, order.id, 5, None)
        .await
        .unwrap();

    let ranked = m
        .engine
        .rank_workers(&m.client, m.profession.id, requester())
        .await
        .unwrap();
    assert_eq!(ranked[0].worker_id, m.worker.id);
    assert_eq!(ranked[0].avg_rating, 5.0);
    assert_eq!(ranked[0].review_count, 1);
    assert_eq!(ranked[1].worker_id, rival.id);
}

#[tokio::test]
async fn zero_distance_and_zero_reviews_score_finitely() {
    let m = market().await;
    let here = m.engine.store().add_profession("locksmith", 1.0).await;
    new_worker(&m.engine, &here, 25.0, requester()).await;

    let ranked = m
        .engine
        .rank_workers(&m.client, here.id, requester())
        .await
        .unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].distance_km, 0.0);
    assert!(ranked[0].score.is_finite());
}

#[tokio::test]
async fn workers_without_coordinates_are_left_out() {
    let m = market().await;
    let store = m.engine.store();
    let id = store.add_user(Role::User).await;
    let nowhere = Identity::new(id, Role::User);
    m.engine
        .register_worker(&nowhere, m.profession.id, 10.0, "")
        .await
        .unwrap();

    let ranked = m
        .engine
        .rank_workers(&m.client, m.profession.id, requester())
        .await
        .unwrap();
    assert!(ranked.iter().all(|w| w.worker_id != id));
    assert_eq!(ranked.len(), 1);
}

#[tokio::test]
async fn requester_is_not_ranked() {
    let m = market().await;
    let ranked = m
        .engine
        .rank_workers(&m.worker, m.profession.id, requester())
        .await
        .unwrap();
    assert!(ranked.is_empty());
}

#[tokio::test]
async fn ties_break_on_rate_then_worker_id() {
    let m = market_with(Engine::in_memory().with_geo(FixedDistance(5.0))).await;
    let twin = new_worker(&m.engine, &m.profession, 20.0, coords(0.0, 0.0)).await;

    let ranked = m
        .engine
        .rank_workers(&m.client, m.profession.id, requester())
        .await
        .unwrap();
    assert_eq!(ranked[0].score, ranked[1].score);
    let ids: Vec<_> = ranked.iter().map(|w| w.worker_id).collect();
    assert_eq!(ids, vec![m.worker.id, twin.id]);
}

#[tokio::test]
async fn unknown_profession_is_not_found_and_empty_one_ranks_nobody() {
    let m = market().await;

    let err = m
        .engine
        .rank_workers(&m.client, ProfessionId(9_999), requester())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let empty = m.engine.store().add_profession("chimney sweep", 1.0).await;
    let ranked = m
        .engine
        .rank_workers(&m.client, empty.id, requester())
        .await
        .unwrap();
    assert!(ranked.is_empty());
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// Scores a profession by its id.
struct ById;

impl RecommendationModel for ById {
    fn predict(&self, _user: UserId, profession: ProfessionId) -> Result<f64> {
        Ok(profession.0 as f64)
    }
}

#[tokio::test]
async fn without_a_model_the_catalog_comes_back_unranked() {
    let m = market().await;
    m.engine.store().add_profession("painter", 4.0).await;

    let recs = m.engine.recommend_professions(&m.client, 1).await.unwrap();
    assert_eq!(recs.len(), 2);
    assert!(recs.iter().all(|r| r.score.is_none()));
}

#[tokio::test]
async fn no_closed_history_skips_the_model() {
    let m = market_with(Engine::in_memory().with_recommender(ById)).await;
    m.engine.store().add_profession("painter", 4.0).await;
    m.book().await;

    let recs = m.engine.recommend_professions(&m.client, 1).await.unwrap();
    assert_eq!(recs.len(), 2);
    assert!(recs.iter().all(|r| r.score.is_none()));
}

#[tokio::test]
async fn model_ranks_unbooked_professions_best_first() {
    let m = market_with(Engine::in_memory().with_recommender(ById)).await;
    let store = m.engine.store();
    let painter = store.add_profession("painter", 4.0).await;
    let roofer = store.add_profession("roofer", 6.0).await;
    let mason = store.add_profession("mason", 8.0).await;
    m.closed_order().await;

    let recs = m.engine.recommend_professions(&m.client, 2).await.unwrap();
    let ids: Vec<_> = recs.iter().map(|r| r.profession.id).collect();
    assert_eq!(ids, vec![mason.id, roofer.id]);
    assert!(recs.iter().all(|r| r.profession.id != m.profession.id));
    assert!(ids.iter().all(|id| *id != painter.id));
}
