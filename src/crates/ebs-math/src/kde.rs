//! Leave-one-in Gaussian kernel density estimation over the active strategy population.

use ndarray::{Array1, Array2};

use crate::bandwidth::estimate_bandwidth;
use crate::distance::pairwise_dist_sq;

const DEFAULT_EPSILON: f64 = 1e-9;
const HIGH_DIM_WARNING_THRESHOLD: usize = 100;

/// Per-point log-density under a Gaussian kernel, `log p_i = -log N + logsumexp_j
/// [-(D/2) log(2*pi) - D log h - dist_sq_ij / (2 h^2)]`, using a numerically stable
/// logsumexp so it does not overflow or underflow for the embedding sizes this engine
/// operates over.
pub fn gaussian_kernel_log_density(
    x: &Array2<f64>,
    bandwidth: f64,
    precomputed_dist_sq: Option<&Array2<f64>>,
) -> Array1<f64> {
    let n = x.nrows();
    let d = x.ncols();

    if d > HIGH_DIM_WARNING_THRESHOLD && n < d {
        tracing::warn!(
            n,
            d,
            "KDE population smaller than embedding dimension; density estimates may be unreliable"
        );
    }

    let owned;
    let dist_sq = match precomputed_dist_sq {
        Some(d) => d,
        None => {
            owned = pairwise_dist_sq(x);
            &owned
        }
    };

    let bandwidth = bandwidth.max(DEFAULT_EPSILON);
    let const_term = -0.5 * d as f64 * (2.0 * std::f64::consts::PI).ln() - d as f64 * bandwidth.ln();
    let denom = 2.0 * bandwidth * bandwidth;

    let mut log_density = Array1::<f64>::zeros(n);
    for i in 0..n {
        let log_kernels: Vec<f64> = (0..n)
            .map(|j| const_term - dist_sq[[i, j]] / denom)
            .collect();
        let max_log = log_kernels
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        let sum_exp: f64 = log_kernels.iter().map(|&v| (v - max_log).exp()).sum();
        log_density[i] = -(n as f64).ln() + max_log + sum_exp.ln();
    }

    log_density
}

/// `exp` of [`gaussian_kernel_log_density`].
pub fn estimate_density(
    x: &Array2<f64>,
    bandwidth: f64,
    precomputed_dist_sq: Option<&Array2<f64>>,
) -> Array1<f64> {
    gaussian_kernel_log_density(x, bandwidth, precomputed_dist_sq).mapv(f64::exp)
}

/// Convenience entry point for the Evolution node: computes the adaptive bandwidth and
/// both density representations from a single shared pairwise-distance computation.
pub fn compute_kde_optimized(x: &Array2<f64>) -> (f64, Array1<f64>, Array1<f64>) {
    let dist_sq = pairwise_dist_sq(x);
    let bandwidth = estimate_bandwidth(x, Some(&dist_sq));
    let log_density = gaussian_kernel_log_density(x, bandwidth, Some(&dist_sq));
    let density = log_density.mapv(f64::exp);
    (bandwidth, log_density, density)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn single_cluster_has_uniform_density() {
        let x = array![[0.0, 0.0], [0.01, 0.0], [0.0, 0.01], [-0.01, -0.01]];
        let (bandwidth, log_density, density) = compute_kde_optimized(&x);
        assert!(bandwidth > 0.0);
        for &d in density.iter() {
            assert!(d > 0.0);
        }
        let mean_log = log_density.sum() / log_density.len() as f64;
        for &l in log_density.iter() {
            assert!((l - mean_log).abs() < 0.2);
        }
    }

    #[test]
    fn outlier_has_lower_density_than_cluster() {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.1],
            [-0.1, 0.0],
            [2.0, 2.0],
            [-2.0, 2.0],
        ];
        let (bandwidth, _log_density, density) = compute_kde_optimized(&x);
        assert!(bandwidth > 0.0);
        let cluster_density = (density[0] + density[1] + density[2]) / 3.0;
        assert!(density[3] < cluster_density);
        assert!(density[4] < cluster_density);
    }

    #[test]
    fn stable_for_high_dimension_and_moderate_population() {
        let d = 4096;
        let n = 8;
        let mut data = Vec::with_capacity(n * d);
        for i in 0..n {
            for j in 0..d {
                data.push(((i * d + j) % 7) as f64 * 0.01);
            }
        }
        let x = Array2::from_shape_vec((n, d), data).unwrap();
        let (_bandwidth, log_density, density) = compute_kde_optimized(&x);
        assert!(log_density.iter().all(|v| v.is_finite()));
        assert!(density.iter().all(|v| v.is_finite() && *v >= 0.0));
    }
}
