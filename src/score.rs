//! R²-style similarity between a network's grid and a target grid.

use crate::grid::Grid;
use std::fmt;

/// Score at or above which a challenge counts as matched
pub const MATCH_THRESHOLD: f64 = 95.0;

/// Variance at or below this is treated as a constant target
const DEGENERATE_EPSILON: f64 = 1e-12;

/// Population variance
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

/// Mean squared difference over the shorter of the two slices
pub fn mse(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        / n as f64
}

/// Score raw sample vectors, in [0, 100]
pub fn score_values(network: &[f64], target: &[f64]) -> f64 {
    let var = variance(target);
    let err = mse(network, target);

    if var <= DEGENERATE_EPSILON {
        return if err <= DEGENERATE_EPSILON { 100.0 } else { 0.0 };
    }

    (100.0 * (1.0 - err / var).max(0.0)).clamp(0.0, 100.0)
}

/// Score a network grid against a target grid, in [0, 100]
pub fn score(network: &Grid, target: &Grid) -> f64 {
    score_values(&network.values, &target.values)
}

/// Whether a score crosses the match threshold
#[inline]
pub fn is_match(score: f64) -> bool {
    score >= MATCH_THRESHOLD
}

/// Qualitative band for progress displays
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScoreBand {
    Far,
    Partial,
    Close,
    Matched,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score >= MATCH_THRESHOLD {
            Self::Matched
        } else if score >= 80.0 {
            Self::Close
        } else if score >= 50.0 {
            Self::Partial
        } else {
            Self::Far
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Far => "Far off",
            Self::Partial => "Taking shape",
            Self::Close => "Close",
            Self::Matched => "Matched",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::sample_grid;

    #[test]
    fn test_variance() {
        assert_eq!(variance(&[]), 0.0);
        assert_eq!(variance(&[3.0, 3.0, 3.0]), 0.0);
        assert_eq!(variance(&[1.0, 3.0]), 1.0);
        assert_eq!(variance(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 4.0);
    }

    #[test]
    fn test_mse_uses_shorter_length() {
        assert_eq!(mse(&[1.0, 2.0, 100.0], &[1.0, 4.0]), 2.0);
        assert_eq!(mse(&[], &[1.0]), 0.0);
    }

    #[test]
    fn test_self_score_is_perfect() {
        let grid = sample_grid(10, |x1, x2| x1 * x2);
        assert_eq!(score(&grid, &grid), 100.0);
    }

    #[test]
    fn test_constant_target() {
        assert_eq!(score_values(&[2.0, 2.0], &[2.0, 2.0]), 100.0);
        assert_eq!(score_values(&[2.0, 2.1], &[2.0, 2.0]), 0.0);
    }

    #[test]
    fn test_score_clamped() {
        // predicting the negated target is far worse than predicting the mean
        let target = [1.0, -1.0, 2.0, -2.0];
        let network = [-1.0, 1.0, -2.0, 2.0];
        assert_eq!(score_values(&network, &target), 0.0);

        let mean_guess = [0.0; 4];
        assert_eq!(score_values(&mean_guess, &target), 0.0);
    }

    #[test]
    fn test_partial_fit() {
        let target = [1.0, -1.0];
        let network = [0.5, -0.5];
        // mse = 0.25, variance = 1
        assert_eq!(score_values(&network, &target), 75.0);
    }

    #[test]
    fn test_bands() {
        assert_eq!(ScoreBand::from_score(100.0), ScoreBand::Matched);
        assert_eq!(ScoreBand::from_score(95.0), ScoreBand::Matched);
        assert_eq!(ScoreBand::from_score(94.9), ScoreBand::Close);
        assert_eq!(ScoreBand::from_score(50.0), ScoreBand::Partial);
        assert_eq!(ScoreBand::from_score(0.0), ScoreBand::Far);
        assert!(is_match(95.0));
        assert!(!is_match(94.99));
    }
}
