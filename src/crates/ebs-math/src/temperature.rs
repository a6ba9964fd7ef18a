//! Effective and normalized temperature: the slope-based estimator that couples UCB
//! exploration and Propagation diversity to the shape of the value/density landscape.

use crate::error::MathError;

/// `T_eff = |Var(V) / Cov(V, log p)|`, the inverse slope of the local linear fit
/// `log p ~= k V + c`. Requires at least two points; with fewer, the regime is
/// undefined and `+inf` (maximally exploratory) is returned rather than erroring,
/// since a single-strategy population is a valid (if degenerate) engine state.
pub fn calculate_effective_temperature(
    values: &[f64],
    log_densities: &[f64],
) -> Result<f64, MathError> {
    if values.len() != log_densities.len() {
        return Err(MathError::LengthMismatch {
            values: values.len(),
            log_densities: log_densities.len(),
        });
    }
    if values.len() < 2 {
        return Ok(f64::INFINITY);
    }

    let n = values.len() as f64;
    let mean_v = values.iter().sum::<f64>() / n;
    let mean_p = log_densities.iter().sum::<f64>() / n;

    let mut var_v = 0.0;
    let mut cov_v_logp = 0.0;
    for (v, p) in values.iter().zip(log_densities) {
        let dv = v - mean_v;
        let dp = p - mean_p;
        var_v += dv * dv;
        cov_v_logp += dv * dp;
    }
    let ddof = n - 1.0;
    var_v /= ddof;
    cov_v_logp /= ddof;

    if cov_v_logp.abs() < 1e-12 {
        return Ok(f64::INFINITY);
    }

    Ok((var_v / cov_v_logp).abs())
}

/// `tau = T_eff / T_max`, the single scalar that feeds UCB's exploration bonus and
/// Propagation's temperature coupling.
pub fn calculate_normalized_temperature(t_eff: f64, t_max: f64) -> Result<f64, MathError> {
    if t_max <= 0.0 {
        return Err(MathError::InvalidTMax(t_max));
    }
    Ok(t_eff / t_max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fewer_than_two_points_is_infinite() {
        assert_eq!(calculate_effective_temperature(&[0.5], &[-1.0]).unwrap(), f64::INFINITY);
        assert_eq!(calculate_effective_temperature(&[], &[]).unwrap(), f64::INFINITY);
    }

    #[test]
    fn mismatched_lengths_error() {
        assert!(calculate_effective_temperature(&[0.1, 0.2], &[0.1]).is_err());
    }

    #[test]
    fn flat_regime_is_infinite() {
        let values = vec![0.1, 0.2, 0.3, 0.4];
        let log_p = vec![1.0, 1.0, 1.0, 1.0];
        assert_eq!(
            calculate_effective_temperature(&values, &log_p).unwrap(),
            f64::INFINITY
        );
    }

    #[test]
    fn recovers_inverse_slope_within_one_percent() {
        for &k in &[1.0, 2.0, 5.0, 10.0] {
            let values: Vec<f64> = (0..100).map(|i| 0.1 * i as f64).collect();
            let log_p: Vec<f64> = values.iter().map(|v| k * v + 0.5).collect();
            let t_eff = calculate_effective_temperature(&values, &log_p).unwrap();
            let expected = 1.0 / k;
            assert!(
                (t_eff - expected).abs() / expected < 0.01,
                "k={k}, t_eff={t_eff}, expected={expected}"
            );
        }
    }

    #[test]
    fn non_positive_t_max_errors() {
        assert!(calculate_normalized_temperature(1.0, 0.0).is_err());
        assert!(calculate_normalized_temperature(1.0, -1.0).is_err());
    }

    #[test]
    fn normalized_temperature_divides() {
        assert_eq!(calculate_normalized_temperature(1.0, 2.0).unwrap(), 0.5);
    }
}
