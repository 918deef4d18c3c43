//! Ranking weights file.
//!
//! ```toml
//! [weights]
//! distance = 0.5
//! rating = 1.0
//! review_count = 0.2
//! cost = 0.3
//! ```
//!
//! Keys left out keep their defaults. Unknown keys are an error.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::ranking::RankingWeights;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct WeightsFile {
    #[serde(default)]
    weights: RankingWeights,
}

/// Read and validate a weights file.
pub fn load_weights(path: &Path) -> Result<RankingWeights> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("cannot read weights file {}: {e}", path.display()))
    })?;
    parse_weights(&raw)
        .map_err(|e| Error::Config(format!("weights file {}: {e}", path.display())))
}

fn parse_weights(raw: &str) -> Result<RankingWeights> {
    let file: WeightsFile =
        toml::from_str(raw).map_err(|e| Error::Config(format!("invalid TOML: {e}")))?;
    file.weights.validate()?;
    Ok(file.weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let w = parse_weights("[weights]\ncost = 0.9\n").unwrap();
        assert_eq!(w.cost, 0.9);
        assert_eq!(w.rating, RankingWeights::default().rating);
        assert_eq!(w.distance, RankingWeights::default().distance);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(parse_weights("").unwrap(), RankingWeights::default());
    }

    #[test]
    fn negative_weight_is_rejected() {
        let err = parse_weights("[weights]\ndistance = -1.0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(parse_weights("[weights]\nspeed = 1.0\n").is_err());
    }
}
