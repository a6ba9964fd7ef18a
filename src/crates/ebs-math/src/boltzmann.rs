//! Boltzmann allocation: distributing a fixed child budget across active strategies in
//! proportion to `exp(V_i / T_eff)`, the soft-pruning mechanism that replaces hard
//! elimination (§9 REDESIGN FLAG — Evolution never hard-prunes).

use rand::Rng;

/// Distributes `budget` children across `values` (one per active strategy) using the
/// Boltzmann form. Degenerate `t_eff` is handled without special-cased branches that
/// bypass the form elsewhere: `t_eff = +inf` makes every exponent 0, which already
/// yields the uniform distribution; `t_eff = 0` is undefined in the form itself, so it
/// is the one case given an explicit winner-takes-all fallback.
pub fn allocate(values: &[f64], t_eff: f64, budget: u32, min_allocation: u32) -> Vec<u32> {
    if values.is_empty() {
        return Vec::new();
    }

    let weights = boltzmann_weights(values, t_eff);
    let sum_w: f64 = weights.iter().sum();
    let mut rng = rand::thread_rng();

    let mut quotas: Vec<u32> = weights
        .iter()
        .map(|&w| {
            let pi = w / sum_w;
            let q = budget as f64 * pi;
            round_quota(q, &mut rng)
        })
        .collect();

    if min_allocation > 0 {
        for q in quotas.iter_mut() {
            if *q < min_allocation {
                *q = min_allocation;
            }
        }
    }

    quotas
}

fn boltzmann_weights(values: &[f64], t_eff: f64) -> Vec<f64> {
    let v_max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if t_eff == 0.0 {
        // Winner-takes-all: every weight is 0 except the (first) argmax.
        let argmax = values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap_or(0);
        return values
            .iter()
            .enumerate()
            .map(|(i, _)| if i == argmax { 1.0 } else { 0.0 })
            .collect();
    }

    values.iter().map(|&v| ((v - v_max) / t_eff).exp()).collect()
}

/// Piecewise rounding: `q >= 1` ceils deterministically; `0 < q < 1` rounds up to 1
/// with probability `q`, preserving the rank order in expectation without ever
/// allocating more than the ceiling to a strategy near zero.
fn round_quota(q: f64, rng: &mut impl Rng) -> u32 {
    if q >= 1.0 {
        q.ceil() as u32
    } else if q > 0.0 {
        if rng.gen::<f64>() < q {
            1
        } else {
            0
        }
    } else {
        0
    }
}

/// Clamps the allocation to at most `beam_width` non-zero recipients, keeping the
/// highest-value strategies among those with a non-zero quota (REDESIGN FLAG: `beam_width`
/// is a post-quota cap, not a hard prune — zeroed-out strategies keep their `active`
/// status and simply produce no children this round).
pub fn apply_beam_cap(quotas: &[u32], values: &[f64], beam_width: u32) -> Vec<u32> {
    let beam_width = beam_width as usize;
    let nonzero_count = quotas.iter().filter(|&&q| q > 0).count();
    if nonzero_count <= beam_width {
        return quotas.to_vec();
    }

    let mut order: Vec<usize> = (0..quotas.len()).filter(|&i| quotas[i] > 0).collect();
    order.sort_by(|&a, &b| values[b].partial_cmp(&values[a]).unwrap());
    let keep: std::collections::HashSet<usize> = order.into_iter().take(beam_width).collect();

    quotas
        .iter()
        .enumerate()
        .map(|(i, &q)| if keep.contains(&i) { q } else { 0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_values_differ_by_at_most_one() {
        let values = vec![0.5; 6];
        let quotas = allocate(&values, 1.0, 6, 0);
        let min = *quotas.iter().min().unwrap();
        let max = *quotas.iter().max().unwrap();
        assert!(max - min <= 1, "{:?}", quotas);
    }

    #[test]
    fn low_temperature_concentrates_on_top_strategy() {
        let values = vec![1.0, 0.0];
        let quotas = allocate(&values, 0.0, 4, 0);
        assert!(quotas[0] >= 4);
        assert_eq!(quotas[1], 0);
    }

    #[test]
    fn high_temperature_is_roughly_uniform() {
        let values = vec![1.0, 0.0];
        let quotas = allocate(&values, 1e6, 4, 0);
        let diff = (quotas[0] as i64 - quotas[1] as i64).abs();
        assert!(diff <= 1, "{:?}", quotas);
    }

    #[test]
    fn total_allocated_is_at_least_budget_when_quotas_all_ceil() {
        // Equal values with budget > population size pushes every fractional quota
        // above 1, making the rounding purely deterministic ceiling.
        let values = vec![0.5; 4];
        let quotas = allocate(&values, 1.0, 5, 0);
        let total: u32 = quotas.iter().sum();
        assert!(total >= 5, "{:?}", quotas);
    }

    #[test]
    fn min_allocation_floors_every_strategy() {
        let values = vec![5.0, -5.0];
        let quotas = allocate(&values, 0.1, 6, 1);
        assert!(quotas.iter().all(|&q| q >= 1));
    }

    #[test]
    fn beam_cap_keeps_only_top_values() {
        let quotas = vec![3, 2, 1, 0];
        let values = vec![0.9, 0.8, 0.5, 0.1];
        let capped = apply_beam_cap(&quotas, &values, 2);
        assert_eq!(capped, vec![3, 2, 0, 0]);
    }

    #[test]
    fn beam_cap_is_noop_when_already_within_width() {
        let quotas = vec![3, 0, 0];
        let values = vec![0.9, 0.1, 0.0];
        let capped = apply_beam_cap(&quotas, &values, 3);
        assert_eq!(capped, quotas);
    }
}
