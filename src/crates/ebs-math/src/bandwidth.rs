//! Adaptive kernel bandwidth selection.
//!
//! Silverman's rule degrades in the high-dimensional embedding spaces this engine
//! operates over, so bandwidth is instead pinned to the population's own geometry: the
//! median pairwise distance. `exp(-d^2 / 2h^2) ~= e^-1` at that typical distance, which
//! keeps log-densities in a numerically meaningful range regardless of D.

use ndarray::Array2;

use crate::distance::{median_upper_triangular, pairwise_dist_sq};

const DEGENERATE_BANDWIDTH: f64 = 1e-3;
const DEGENERATE_MEDIAN_THRESHOLD: f64 = 1e-10;

/// Estimates the adaptive bandwidth `h` for the given (N, D) population.
///
/// Pass a precomputed squared-distance matrix when the caller already has one (e.g.
/// [`crate::kde::compute_kde_optimized`]) to avoid recomputing it.
pub fn estimate_bandwidth(x: &Array2<f64>, precomputed_dist_sq: Option<&Array2<f64>>) -> f64 {
    let n = x.nrows();
    if n <= 1 {
        return 1.0;
    }

    let owned;
    let dist_sq = match precomputed_dist_sq {
        Some(d) => d,
        None => {
            owned = pairwise_dist_sq(x);
            &owned
        }
    };

    let dist = dist_sq.mapv(f64::sqrt);
    let median_dist = median_upper_triangular(&dist);

    if median_dist < DEGENERATE_MEDIAN_THRESHOLD {
        return DEGENERATE_BANDWIDTH;
    }

    median_dist / std::f64::consts::SQRT_2
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn single_point_returns_one() {
        let x = array![[0.0, 0.0]];
        assert_eq!(estimate_bandwidth(&x, None), 1.0);
    }

    #[test]
    fn degenerate_population_returns_floor() {
        let x = array![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]];
        assert_eq!(estimate_bandwidth(&x, None), DEGENERATE_BANDWIDTH);
    }

    #[test]
    fn scaling_by_alpha_scales_bandwidth_by_alpha() {
        let x = array![[0.0, 0.0], [1.0, 0.0], [0.0, 2.0], [3.0, 1.0]];
        let h = estimate_bandwidth(&x, None);

        let alpha = 4.0;
        let scaled = x.mapv(|v| v * alpha);
        let h_scaled = estimate_bandwidth(&scaled, None);

        assert!((h_scaled - h * alpha).abs() < 1e-9);
    }
}
