//! Profession recommendations from an external predictor.

use serde::Serialize;

use crate::error::Result;
use crate::model::{Profession, ProfessionId, UserId};

/// A pre-trained model estimating how likely a user is to book a
/// profession. Higher is more likely.
pub trait RecommendationModel: Send + Sync {
    fn predict(&self, user: UserId, profession: ProfessionId) -> Result<f64>;
}

/// A catalog entry, with the model's score when one was computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub profession: Profession,
    pub score: Option<f64>,
}

impl Recommendation {
    pub(crate) fn unranked(catalog: Vec<Profession>) -> Vec<Self> {
        catalog
            .into_iter()
            .map(|profession| Self {
                profession,
                score: None,
            })
            .collect()
    }
}

/// Score every profession the user has not booked yet and keep the best
/// `count`.
pub(crate) fn rank_unbooked(
    model: &dyn RecommendationModel,
    user: UserId,
    catalog: Vec<Profession>,
    booked: &[ProfessionId],
    count: usize,
) -> Result<Vec<Recommendation>> {
    let mut scored = Vec::new();
    for profession in catalog {
        if booked.contains(&profession.id) {
            continue;
        }
        let score = model.predict(user, profession.id)?;
        scored.push(Recommendation {
            profession,
            score: Some(score),
        });
    }
    scored.sort_by(|a, b| {
        let (sa, sb) = (a.score.unwrap_or(f64::MIN), b.score.unwrap_or(f64::MIN));
        sb.total_cmp(&sa)
            .then_with(|| a.profession.id.cmp(&b.profession.id))
    });
    scored.truncate(count);
    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ById;

    impl RecommendationModel for ById {
        fn predict(&self, _user: UserId, profession: ProfessionId) -> Result<f64> {
            Ok(profession.0 as f64)
        }
    }

    fn catalog() -> Vec<Profession> {
        (1..=4)
            .map(|i| Profession {
                id: ProfessionId(i),
                name: format!("p{i}"),
                description: None,
                estimated_time_hours: 1.0,
            })
            .collect()
    }

    #[test]
    fn skips_booked_and_orders_by_score() {
        let out = rank_unbooked(&ById, UserId(1), catalog(), &[ProfessionId(4)], 2).unwrap();
        let ids: Vec<i64> = out.iter().map(|r| r.profession.id.0).collect();
        assert_eq!(ids, vec![3, 2]);
    }
}
