//! The heart of the loop (§4.8): embeds new strategies, estimates the population's
//! density landscape, derives an effective temperature, ranks by UCB, and soft-prunes by
//! distributing next round's child budget via Boltzmann allocation. Evolution never
//! hard-prunes — every active strategy stays active; only `child_quota` changes.

use async_trait::async_trait;
use ebs_core::{RunState, RunStateDelta, StrategyStatus};
use ebs_graph::{GraphError, NodeExecutor};
use ndarray::Array2;

use crate::context::EngineContext;

pub struct Evolution;

#[async_trait]
impl NodeExecutor<EngineContext> for Evolution {
    async fn execute(&self, state: &RunState, ctx: &EngineContext) -> Result<RunStateDelta, GraphError> {
        let mut strategies = state.strategies.clone();

        let mut embedded = 0;
        let mut failed = 0;
        for strategy in strategies.iter_mut() {
            if !strategy.status.is_active() || strategy.embedding.is_some() {
                continue;
            }
            let embedding = ctx.inference.embed(&strategy.embedding_text()).await;
            if embedding.is_empty() {
                strategy.status = StrategyStatus::PrunedError;
                failed += 1;
            } else {
                strategy.set_embedding(embedding);
                embedded += 1;
            }
        }

        let active_indices: Vec<usize> = strategies
            .iter()
            .enumerate()
            .filter(|(_, s)| s.status.is_active() && s.embedding.is_some())
            .map(|(i, _)| i)
            .collect();

        if active_indices.is_empty() {
            return Ok(RunStateDelta {
                strategies: Some(strategies),
                iteration_count: Some(state.iteration_count + 1),
                history: vec![format!(
                    "[Evolution] embedded {embedded} strategies ({failed} failed); no active strategies to rank"
                )],
                ..RunStateDelta::new()
            });
        }

        let dim = strategies[active_indices[0]].embedding.as_ref().unwrap().len();
        let mut flat = Vec::with_capacity(active_indices.len() * dim);
        for &i in &active_indices {
            flat.extend_from_slice(strategies[i].embedding.as_ref().unwrap());
        }
        let x = Array2::from_shape_vec((active_indices.len(), dim), flat)
            .map_err(|e| GraphError::NodeExecution { node: "evolution".to_string(), source: Box::new(e) })?;

        let (_bandwidth, log_density, density) = ebs_math::compute_kde_optimized(&x);

        for (pos, &i) in active_indices.iter().enumerate() {
            strategies[i].density = Some(density[pos]);
            strategies[i].log_density = Some(log_density[pos]);
        }

        // Judge always runs before Evolution in the fixed topology, so score is never
        // actually absent here; 0.0 is treated as unscored regardless, matching the
        // documented default for a strategy the Judge hasn't seen yet.
        let values: Vec<f64> = active_indices
            .iter()
            .map(|&i| if strategies[i].score == 0.0 { 0.5 } else { strategies[i].score })
            .collect();
        let log_p: Vec<f64> = active_indices.iter().map(|&i| strategies[i].log_density.unwrap()).collect();
        let densities: Vec<f64> = active_indices.iter().map(|&i| strategies[i].density.unwrap()).collect();

        let t_eff = ebs_math::calculate_effective_temperature(&values, &log_p)
            .map_err(|e| GraphError::NodeExecution { node: "evolution".to_string(), source: Box::new(e) })?;
        let tau = ebs_math::calculate_normalized_temperature(t_eff, state.config.t_max)
            .map_err(|e| GraphError::NodeExecution { node: "evolution".to_string(), source: Box::new(e) })?;

        let v_min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let v_max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let ucb_scores = ebs_math::batch_calculate_ucb(&values, &densities, v_min, v_max, tau, state.config.c_explore)
            .map_err(|e| GraphError::NodeExecution { node: "evolution".to_string(), source: Box::new(e) })?;

        for (pos, &i) in active_indices.iter().enumerate() {
            strategies[i].ucb_score = Some(ucb_scores[pos]);
        }

        let quotas = ebs_math::allocate_boltzmann(&values, t_eff, state.config.total_child_budget, state.config.min_allocation);
        let quotas = ebs_math::apply_beam_cap(&quotas, &values, state.config.beam_width);
        for (pos, &i) in active_indices.iter().enumerate() {
            strategies[i].child_quota = quotas[pos];
        }

        let spatial_entropy = -(log_p.iter().sum::<f64>() / log_p.len() as f64);

        Ok(RunStateDelta {
            strategies: Some(strategies),
            spatial_entropy: Some(spatial_entropy),
            prev_spatial_entropy: state.spatial_entropy,
            effective_temperature: Some(t_eff),
            normalized_temperature: Some(tau),
            iteration_count: Some(state.iteration_count + 1),
            history: vec![format!(
                "[Evolution] embedded {embedded} ({failed} failed), tau={tau:.3}, spatial_entropy={spatial_entropy:.4}"
            )],
            ..RunStateDelta::new()
        })
    }
}
