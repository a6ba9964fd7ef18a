//! The conditional edge out of Evolution (§4.9): decides whether another generation
//! round is worth the cost, or the loop has settled.

use ebs_core::RunState;

/// `end` on the iteration cap, on having no active strategy left, or once the relative
/// change in spatial entropy drops below `entropy_change_threshold`. The first round
/// (no `prev_spatial_entropy` yet) always continues.
pub fn should_continue(state: &RunState) -> String {
    if state.iteration_count >= state.config.max_iterations {
        return "end".to_string();
    }
    if !state.has_active_strategy() {
        return "end".to_string();
    }

    if let (Some(entropy), Some(prev)) = (state.spatial_entropy, state.prev_spatial_entropy) {
        let denom = entropy.abs().max(prev.abs()).max(1.0);
        let relative_change = (entropy - prev).abs() / denom;
        if relative_change < state.config.entropy_change_threshold {
            return "end".to_string();
        }
    }

    "continue".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebs_core::EngineConfig;

    #[test]
    fn ends_at_iteration_cap() {
        let mut state = RunState::new("problem", EngineConfig::default());
        state.iteration_count = state.config.max_iterations;
        assert_eq!(should_continue(&state), "end");
    }

    #[test]
    fn ends_with_no_active_strategies() {
        let state = RunState::new("problem", EngineConfig::default());
        assert_eq!(should_continue(&state), "end");
    }

    #[test]
    fn first_round_always_continues() {
        let mut state = RunState::new("problem", EngineConfig::default());
        state.strategies.push(ebs_core::Strategy::new("s1", "n", "r", "a", serde_json::json!({}), None, "[Gen]"));
        assert_eq!(should_continue(&state), "continue");
    }

    #[test]
    fn ends_when_entropy_change_below_threshold() {
        let mut state = RunState::new("problem", EngineConfig::default());
        state.strategies.push(ebs_core::Strategy::new("s1", "n", "r", "a", serde_json::json!({}), None, "[Gen]"));
        state.spatial_entropy = Some(1.0);
        state.prev_spatial_entropy = Some(1.0);
        assert_eq!(should_continue(&state), "end");
    }

    #[test]
    fn continues_when_entropy_still_shifting() {
        let mut state = RunState::new("problem", EngineConfig::default());
        state.strategies.push(ebs_core::Strategy::new("s1", "n", "r", "a", serde_json::json!({}), None, "[Gen]"));
        state.spatial_entropy = Some(2.0);
        state.prev_spatial_entropy = Some(1.0);
        assert_eq!(should_continue(&state), "continue");
    }
}
