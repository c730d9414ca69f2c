//! Weighted random choice and distance scoring shared by the reaction core.
//!
//! [choose_weighted] is used for all three draws of a site update: the
//! interaction, the reaction within it, and the product phase.
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::error::{Error, Result};

/// Draw one candidate with probability proportional to its weight.
///
/// Weights must be finite, non-negative and sum to more than zero. A single
/// uniform draw is inverted through the cumulative distribution.
pub fn choose_weighted<'a, T, R: Rng + ?Sized>(
    rng: &mut R,
    candidates: &'a [T],
    weights: &[f64],
) -> Result<&'a T> {
    if candidates.len() != weights.len() {
        return Err(Error::Scoring(format!(
            "{} candidates but {} weights",
            candidates.len(),
            weights.len()
        )));
    }
    if let Some(bad) = weights.iter().find(|w| !w.is_finite()) {
        return Err(Error::Scoring(format!("non-finite weight {}", bad)));
    }
    let index = WeightedIndex::new(weights).map_err(|e| Error::Scoring(e.to_string()))?;
    Ok(&candidates[index.sample(rng)])
}

/// Normalize weights into selection probabilities.
pub fn probabilities(weights: &[f64]) -> Result<Vec<f64>> {
    let total: f64 = weights.iter().sum();
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) || !(total > 0.0) {
        return Err(Error::Scoring(format!("cannot normalize weights {:?}", weights)));
    }
    Ok(weights.iter().map(|w| w / total).collect())
}

/// Inverse-cube decay of a competitiveness score over lattice distance.
///
/// A distance of 1 leaves the score unchanged. Distances below 1 would
/// amplify the score and are rejected.
pub fn adjust_score_for_distance(score: f64, distance: f64) -> Result<f64> {
    if !(distance.is_finite() && distance >= 1.0) {
        return Err(Error::Scoring(format!(
            "interaction distance must be >= 1, got {}",
            distance
        )));
    }
    Ok(score / distance.powi(3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn frequencies_match_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let candidates = ["a", "b", "c", "d"];
        let weights = [1.0, 2.0, 3.0, 4.0];
        let draws = 40_000;
        let mut counts = [0_u32; 4];
        for _ in 0..draws {
            let picked = choose_weighted(&mut rng, &candidates, &weights).unwrap();
            let idx = candidates.iter().position(|c| c == picked).unwrap();
            counts[idx] += 1;
        }

        // Chi-square goodness of fit, 3 degrees of freedom, p = 0.001
        let total: f64 = weights.iter().sum();
        let chi_square: f64 = counts
            .iter()
            .zip(weights.iter())
            .map(|(&observed, w)| {
                let expected = draws as f64 * w / total;
                (observed as f64 - expected).powi(2) / expected
            })
            .sum();
        assert!(chi_square < 16.27, "chi-square {} too large: {:?}", chi_square, counts);
    }

    #[test]
    fn zero_weight_candidates_never_drawn() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let candidates = [1, 2, 3];
        let weights = [0.0, 5.0, 0.0];
        for _ in 0..1_000 {
            assert_eq!(*choose_weighted(&mut rng, &candidates, &weights).unwrap(), 2);
        }
    }

    #[test]
    fn all_zero_weights_are_degenerate() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = choose_weighted(&mut rng, &[1, 2], &[0.0, 0.0]).unwrap_err();
        assert!(matches!(err, Error::Scoring(_)));
    }

    #[test]
    fn empty_and_mismatched_pools_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let empty: [u8; 0] = [];
        assert!(choose_weighted(&mut rng, &empty, &[]).is_err());
        assert!(choose_weighted(&mut rng, &[1, 2], &[1.0]).is_err());
    }

    #[test]
    fn negative_and_nan_weights_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(choose_weighted(&mut rng, &[1, 2], &[1.0, -1.0]).is_err());
        assert!(choose_weighted(&mut rng, &[1, 2], &[1.0, f64::NAN]).is_err());
        assert!(choose_weighted(&mut rng, &[1, 2], &[1.0, f64::INFINITY]).is_err());
    }

    #[test]
    fn probabilities_sum_to_one() {
        let probs = probabilities(&[1.0, 3.0]).unwrap();
        assert_eq!(probs, vec![0.25, 0.75]);
        assert!(probabilities(&[0.0, 0.0]).is_err());
    }

    #[test]
    fn distance_decay_is_inverse_cube() {
        assert_eq!(adjust_score_for_distance(3.0, 1.0).unwrap(), 3.0);
        assert_eq!(adjust_score_for_distance(8.0, 2.0).unwrap(), 1.0);
        let diagonal = adjust_score_for_distance(1.0, 2.0_f64.sqrt()).unwrap();
        assert!((diagonal - 1.0 / (2.0 * 2.0_f64.sqrt())).abs() < 1e-12);
    }

    #[test]
    fn sub_unit_distance_is_a_scoring_error() {
        assert!(matches!(adjust_score_for_distance(1.0, 0.5), Err(Error::Scoring(_))));
        assert!(adjust_score_for_distance(1.0, 0.0).is_err());
        assert!(adjust_score_for_distance(1.0, f64::NAN).is_err());
    }
}
