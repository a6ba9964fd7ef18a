//! Upper Confidence Bound scoring: normalised value plus a density-driven exploration
//! bonus, the ranking signal for both soft pruning and the Architect-Scheduler.

use crate::error::MathError;

const DEFAULT_EPSILON: f64 = 1e-5;
const DENSITY_FLOOR: f64 = 1e-9;
const ZERO_DENSITY_BONUS: f64 = 1e6;

/// UCB score for a single strategy. `v_min`/`v_max` are the range over the active
/// population; when that range collapses (`v_max - v_min < epsilon`), the exploitation
/// term is uninformative and fixed at 0.5 rather than divided by ~0.
pub fn calculate_ucb_score(
    value: f64,
    density: f64,
    v_min: f64,
    v_max: f64,
    tau: f64,
    c: f64,
) -> f64 {
    let v_range = v_max - v_min;
    let normalized_value = if v_range < DEFAULT_EPSILON {
        0.5
    } else {
        (value - v_min) / (v_range + DEFAULT_EPSILON)
    };

    let inv_sqrt_p = if density <= 0.0 {
        ZERO_DENSITY_BONUS
    } else {
        1.0 / density.max(DENSITY_FLOOR).sqrt()
    };
    let exploration_bonus = c * tau * inv_sqrt_p;

    normalized_value + exploration_bonus
}

/// Vectorised form over the whole active population.
pub fn batch_calculate_ucb(
    values: &[f64],
    densities: &[f64],
    v_min: f64,
    v_max: f64,
    tau: f64,
    c: f64,
) -> Result<Vec<f64>, MathError> {
    if values.len() != densities.len() {
        return Err(MathError::UcbLengthMismatch {
            values: values.len(),
            densities: densities.len(),
        });
    }
    Ok(values
        .iter()
        .zip(densities)
        .map(|(&v, &p)| calculate_ucb_score(v, p, v_min, v_max, tau, c))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_value_lower_density_scores_higher() {
        let tau = 1.0;
        let c = 1.0;
        let ucb1 = calculate_ucb_score(0.5, 0.01, 0.0, 1.0, tau, c);
        let ucb2 = calculate_ucb_score(0.5, 0.5, 0.0, 1.0, tau, c);
        assert!(ucb1 > ucb2, "ucb1={ucb1} ucb2={ucb2}");
    }

    #[test]
    fn collapsed_range_uses_uninformative_midpoint() {
        let score = calculate_ucb_score(0.7, 1.0, 0.5, 0.5, 0.0, 1.0);
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn zero_density_gets_large_bonus() {
        let score = calculate_ucb_score(0.5, 0.0, 0.0, 1.0, 1.0, 1.0);
        assert!(score > 1000.0);
    }

    #[test]
    fn batch_matches_scalar() {
        let values = vec![0.1, 0.5, 0.9];
        let densities = vec![0.2, 0.4, 0.1];
        let batch = batch_calculate_ucb(&values, &densities, 0.0, 1.0, 0.8, 1.0).unwrap();
        for (i, &v) in values.iter().enumerate() {
            let scalar = calculate_ucb_score(v, densities[i], 0.0, 1.0, 0.8, 1.0);
            assert!((batch[i] - scalar).abs() < 1e-12);
        }
    }

    #[test]
    fn batch_rejects_length_mismatch() {
        assert!(batch_calculate_ucb(&[0.1], &[0.1, 0.2], 0.0, 1.0, 1.0, 1.0).is_err());
    }
}
