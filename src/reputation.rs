//! Reputation ledger math and review validation.
//!
//! The ledger is always re-derived from the full stored review set for a
//! worker, so replayed or out-of-order writes cannot skew it.

use crate::error::{Error, Result};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;
/// Longest accepted review text, in characters.
pub const MAX_REVIEW_CHARS: usize = 500;

/// A worker's running `(avg_rating, review_count)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reputation {
    pub avg_rating: f64,
    pub review_count: u32,
}

impl Reputation {
    pub const EMPTY: Reputation = Reputation {
        avg_rating: 0.0,
        review_count: 0,
    };

    /// Arithmetic mean of every stored rating.
    pub fn from_ratings(ratings: &[u8]) -> Self {
        if ratings.is_empty() {
            return Self::EMPTY;
        }
        let sum: u64 = ratings.iter().map(|&r| u64::from(r)).sum();
        let count = ratings.len() as u32;
        Self {
            avg_rating: sum as f64 / f64::from(count),
            review_count: count,
        }
    }
}

/// Check a rating and review text; returns the rating narrowed to `u8` and
/// the text with surrounding whitespace trimmed (empty becomes `None`).
pub fn validate_review(rating: i32, text: Option<&str>) -> Result<(u8, Option<String>)> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(Error::Validation(format!(
            "rating {rating} is outside [{MIN_RATING}, {MAX_RATING}]"
        )));
    }
    let text = text.map(str::trim).filter(|t| !t.is_empty());
    if let Some(t) = text {
        if t.chars().count() > MAX_REVIEW_CHARS {
            return Err(Error::Validation(format!(
                "review text exceeds {MAX_REVIEW_CHARS} characters"
            )));
        }
    }
    Ok((rating as u8, text.map(str::to_string)))
}
