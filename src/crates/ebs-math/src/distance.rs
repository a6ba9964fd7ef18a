//! Pairwise squared Euclidean distances over an (N, D) matrix of row-vectors.

use ndarray::Array2;

/// Computes `dist_sq[i][j] = ||x_i - x_j||^2` via the expansion
/// `||x_i||^2 + ||x_j||^2 - 2 x_i^T x_j`, floored at 0 to suppress negative
/// round-off from the subtraction of two nearly-equal large numbers.
///
/// Symmetric and zero on the diagonal by construction.
pub fn pairwise_dist_sq(x: &Array2<f64>) -> Array2<f64> {
    let n = x.nrows();
    let gram = x.dot(&x.t());
    let sq_norms: Vec<f64> = (0..n).map(|i| gram[[i, i]]).collect();

    let mut dist_sq = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            let d = sq_norms[i] + sq_norms[j] - 2.0 * gram[[i, j]];
            dist_sq[[i, j]] = d.max(0.0);
        }
    }
    dist_sq
}

/// The median of the off-diagonal (upper-triangular, `k=1`) entries of a square
/// symmetric matrix, used by [`crate::bandwidth::estimate_bandwidth`] on distances.
pub fn median_upper_triangular(matrix: &Array2<f64>) -> f64 {
    let n = matrix.nrows();
    let mut values: Vec<f64> = Vec::with_capacity(n * (n.saturating_sub(1)) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            values.push(matrix[[i, j]]);
        }
    }
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn symmetric_and_zero_diagonal() {
        let x = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let d = pairwise_dist_sq(&x);
        for i in 0..3 {
            assert!((d[[i, i]]).abs() < 1e-12);
        }
        for i in 0..3 {
            for j in 0..3 {
                assert!((d[[i, j]] - d[[j, i]]).abs() < 1e-12);
            }
        }
        assert!((d[[0, 1]] - 1.0).abs() < 1e-9);
        assert!((d[[1, 2]] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn non_negative_despite_roundoff() {
        let x = array![[1e8, 1e8], [1e8 + 1e-6, 1e8]];
        let d = pairwise_dist_sq(&x);
        assert!(d.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn median_of_odd_count() {
        let m = array![[0.0, 1.0, 3.0], [1.0, 0.0, 2.0], [3.0, 2.0, 0.0]];
        // off-diagonal upper: 1.0, 3.0, 2.0 -> median 2.0
        assert!((median_upper_triangular(&m) - 2.0).abs() < 1e-12);
    }
}
