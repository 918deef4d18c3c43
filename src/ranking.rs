//! Worker ranking.
//!
//! Scores candidates for a profession from distance to the requester, price
//! relative to the profession's mean hourly rate, and reputation:
//!
//! ```text
//! score = w.rating * avg_rating
//!       + w.review_count / sqrt(review_count)      (0 when review_count == 0)
//!       + w.cost * (mean_peer_rate / hourly_rate)
//!       + w.distance / distance_km^2                (0 when distance_km == 0)
//! ```
//!
//! Ordering is by score descending, then hourly rate ascending, then worker
//! id ascending, so equal inputs always produce the same list.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::GeoDistance;
use crate::model::{Coordinates, ProfessionId, UserId, WorkerProfile};

/// Process-wide weights for the score terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RankingWeights {
    pub distance: f64,
    pub rating: f64,
    pub review_count: f64,
    pub cost: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            distance: 0.5,
            rating: 1.0,
            review_count: 0.2,
            cost: 0.3,
        }
    }
}

impl RankingWeights {
    /// Every weight must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("distance", self.distance),
            ("rating", self.rating),
            ("review_count", self.review_count),
            ("cost", self.cost),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "ranking weight {name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Everything the score needs for one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInput {
    pub distance_km: f64,
    pub avg_rating: f64,
    pub review_count: u32,
    pub hourly_rate: f64,
    pub mean_peer_rate: f64,
}

/// Composite score. Zero distance and zero reviews drop their terms rather
/// than dividing by zero; a non-positive rate drops the cost term.
pub fn score(input: &ScoreInput, weights: &RankingWeights) -> f64 {
    let distance_sq = input.distance_km * input.distance_km;
    let distance_factor = if distance_sq > 0.0 {
        weights.distance / distance_sq
    } else {
        0.0
    };

    let review_factor = if input.review_count > 0 {
        weights.review_count / f64::from(input.review_count).sqrt()
    } else {
        0.0
    };

    let cost_factor = if input.hourly_rate > 0.0 {
        weights.cost * (input.mean_peer_rate / input.hourly_rate)
    } else {
        0.0
    };

    weights.rating * input.avg_rating + review_factor + cost_factor + distance_factor
}

/// A worker profile paired with its owner's stored coordinates, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub profile: WorkerProfile,
    pub coordinates: Option<Coordinates>,
}

/// One entry of a ranking result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedWorker {
    pub worker_id: UserId,
    pub profession_id: ProfessionId,
    pub hourly_rate: f64,
    pub avg_rating: f64,
    pub review_count: u32,
    pub bio: String,
    pub distance_km: f64,
    pub score: f64,
}

/// Score and order `candidates` around `origin`.
///
/// Candidates without coordinates, with a non-positive rate, or whose score
/// is not finite are left out. `exclude` drops the requester's own profile.
pub fn rank(
    candidates: Vec<Candidate>,
    origin: Coordinates,
    mean_peer_rate: f64,
    weights: &RankingWeights,
    geo: &dyn GeoDistance,
    exclude: Option<UserId>,
) -> Vec<RankedWorker> {
    let mut ranked: Vec<RankedWorker> = candidates
        .into_iter()
        .filter(|c| Some(c.profile.user_id) != exclude)
        .filter_map(|c| {
            let coordinates = c.coordinates?;
            let profile = c.profile;
            if !(profile.hourly_rate > 0.0) {
                return None;
            }
            let distance_km = geo.distance_km(origin, coordinates);
            let input = ScoreInput {
                distance_km,
                avg_rating: profile.avg_rating,
                review_count: profile.review_count,
                hourly_rate: profile.hourly_rate,
                mean_peer_rate,
            };
            let score = score(&input, weights);
            score.is_finite().then(|| RankedWorker {
                worker_id: profile.user_id,
                profession_id: profile.profession_id,
                hourly_rate: profile.hourly_rate,
                avg_rating: profile.avg_rating,
                review_count: profile.review_count,
                bio: profile.bio,
                distance_km,
                score,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.hourly_rate.total_cmp(&b.hourly_rate))
            .then_with(|| a.worker_id.cmp(&b.worker_id))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Haversine;
    use crate::model::WorkerProfileId;
    use chrono::Utc;

    fn profile(user: i64, rate: f64, avg: f64, count: u32) -> WorkerProfile {
        let now = Utc::now();
        WorkerProfile {
            id: WorkerProfileId(user),
            user_id: UserId(user),
            profession_id: ProfessionId(1),
            hourly_rate: rate,
            avg_rating: avg,
            review_count: count,
            bio: String::new(),
            created_at: now,
            modified_at: now,
        }
    }

    fn origin() -> Coordinates {
        Coordinates::new(12.97, 77.59).unwrap()
    }

    #[test]
    fn zero_distance_and_zero_reviews_stay_finite() {
        let s = score(
            &ScoreInput {
                distance_km: 0.0,
                avg_rating: 0.0,
                review_count: 0,
                hourly_rate: 20.0,
                mean_peer_rate: 20.0,
            },
            &RankingWeights::default(),
        );
        assert!(s.is_finite());
        assert!((s - 0.3).abs() < 1e-12);
    }

    #[test]
    fn score_combines_all_terms() {
        let weights = RankingWeights {
            distance: 4.0,
            rating: 1.0,
            review_count: 2.0,
            cost: 1.0,
        };
        let s = score(
            &ScoreInput {
                distance_km: 2.0,
                avg_rating: 4.5,
                review_count: 4,
                hourly_rate: 10.0,
                mean_peer_rate: 20.0,
            },
            &weights,
        );
        // 4.5 + 2/2 + 20/10 + 4/4
        assert!((s - 8.5).abs() < 1e-12, "got {s}");
    }

    #[test]
    fn cheaper_worker_scores_higher_all_else_equal() {
        let base = ScoreInput {
            distance_km: 3.0,
            avg_rating: 4.0,
            review_count: 9,
            hourly_rate: 30.0,
            mean_peer_rate: 25.0,
        };
        let cheaper = ScoreInput {
            hourly_rate: 20.0,
            ..base
        };
        let w = RankingWeights::default();
        assert!(score(&cheaper, &w) > score(&base, &w));
    }

    #[test]
    fn missing_coordinates_are_excluded_not_fatal() {
        let candidates = vec![
            Candidate {
                profile: profile(1, 20.0, 4.0, 1),
                coordinates: None,
            },
            Candidate {
                profile: profile(2, 20.0, 4.0, 1),
                coordinates: Some(origin()),
            },
        ];
        let ranked = rank(
            candidates,
            origin(),
            20.0,
            &RankingWeights::default(),
            &Haversine,
            None,
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].worker_id, UserId(2));
    }

    #[test]
    fn ties_break_on_rate_then_id() {
        let here = Some(origin());
        let weights = RankingWeights {
            cost: 0.0,
            ..RankingWeights::default()
        };
        let candidates = vec![
            Candidate {
                profile: profile(3, 25.0, 4.0, 1),
                coordinates: here,
            },
            Candidate {
                profile: profile(2, 20.0, 4.0, 1),
                coordinates: here,
            },
            Candidate {
                profile: profile(1, 25.0, 4.0, 1),
                coordinates: here,
            },
        ];
        let ids: Vec<i64> = rank(candidates, origin(), 23.0, &weights, &Haversine, None)
            .iter()
            .map(|r| r.worker_id.0)
            .collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn requester_is_left_out() {
        let candidates = vec![Candidate {
            profile: profile(5, 20.0, 4.0, 1),
            coordinates: Some(origin()),
        }];
        let ranked = rank(
            candidates,
            origin(),
            20.0,
            &RankingWeights::default(),
            &Haversine,
            Some(UserId(5)),
        );
        assert!(ranked.is_empty());
    }

    #[test]
    fn negative_weights_fail_validation() {
        let w = RankingWeights {
            rating: -1.0,
            ..RankingWeights::default()
        };
        assert!(w.validate().is_err());
        assert!(RankingWeights::default().validate().is_ok());
    }
}
