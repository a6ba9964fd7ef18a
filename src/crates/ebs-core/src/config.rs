//! The engine configuration record (§6) and its defaults → file → env loader.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureCoupling {
    Auto,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThinkingLevel {
    Low,
    Medium,
    High,
}

/// All tunables recognised by the engine, with the defaults from §6's table. Every
/// field is `serde(default = ...)` so a partially-specified TOML document is valid —
/// this mirrors `EngineConfig`'s role as the one config surface every node reads from,
/// rather than resolving settings ad hoc from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_iterations: u32,
    /// Relative-change threshold for convergence (§9's resolution of the
    /// `entropy_threshold` vs `entropy_change_threshold` ambiguity: relative change).
    pub entropy_change_threshold: f64,
    pub total_child_budget: u32,
    pub t_max: f64,
    pub c_explore: f64,
    /// Legacy cap, applied as a post-quota clamp (REDESIGN FLAG, §9) rather than a
    /// hard-pruning beam width.
    pub beam_width: u32,
    pub max_research_iterations: u32,
    pub distill_threshold: u32,
    pub temperature_coupling: TemperatureCoupling,
    pub manual_llm_temperature: f64,
    /// Legacy fallback used by Propagation only when no strategy carries a
    /// `child_quota` (e.g. Evolution has not yet run).
    pub children_per_parent: u32,
    pub thinking_level: ThinkingLevel,
    pub thinking_budget: u32,
    /// Per-run history truncation. Env-only in the original; exposed here as a normal
    /// field so the Supervisor can apply it uniformly regardless of load source.
    pub history_retention: usize,
    /// Optional floor under Boltzmann allocation quotas (§4.2's "optional floor").
    pub min_allocation: u32,
    /// Threshold multiplier on the adaptive bandwidth for knowledge-base recall (§4.13).
    pub epsilon_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_iterations: 10,
            entropy_change_threshold: 0.05,
            total_child_budget: 6,
            t_max: 2.0,
            c_explore: 1.0,
            beam_width: 3,
            max_research_iterations: 3,
            distill_threshold: 4000,
            temperature_coupling: TemperatureCoupling::Auto,
            manual_llm_temperature: 1.0,
            children_per_parent: 2,
            thinking_level: ThinkingLevel::High,
            thinking_budget: 1024,
            history_retention: 50,
            min_allocation: 0,
            epsilon_threshold: 1.0,
        }
    }
}

/// Defaults → optional TOML file → environment variable precedence, in the style of
/// the teacher's own config loaders.
pub mod loader {
    use super::EngineConfig;
    use std::path::Path;

    #[derive(Debug, thiserror::Error)]
    pub enum ConfigError {
        #[error("failed to read config file {path}: {source}")]
        Read {
            path: String,
            #[source]
            source: std::io::Error,
        },
        #[error("failed to parse config file {path}: {source}")]
        Parse {
            path: String,
            #[source]
            source: toml::de::Error,
        },
        #[error("invalid value for environment variable {name}: {value}")]
        InvalidEnvValue { name: String, value: String },
    }

    /// Loads an [`EngineConfig`], starting from defaults, optionally overlaying a TOML
    /// file, then applying any recognised `EBS_*` environment variables.
    pub fn load(toml_path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
        let mut config = EngineConfig::default();

        if let Some(path) = toml_path {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        }

        apply_env_overrides(&mut config)?;
        Ok(config)
    }

    fn apply_env_overrides(config: &mut EngineConfig) -> Result<(), ConfigError> {
        set_from_env("EBS_MAX_ITERATIONS", &mut config.max_iterations)?;
        set_from_env(
            "EBS_ENTROPY_CHANGE_THRESHOLD",
            &mut config.entropy_change_threshold,
        )?;
        set_from_env("EBS_TOTAL_CHILD_BUDGET", &mut config.total_child_budget)?;
        set_from_env("EBS_T_MAX", &mut config.t_max)?;
        set_from_env("EBS_C_EXPLORE", &mut config.c_explore)?;
        set_from_env("EBS_BEAM_WIDTH", &mut config.beam_width)?;
        set_from_env(
            "EBS_MAX_RESEARCH_ITERATIONS",
            &mut config.max_research_iterations,
        )?;
        set_from_env("EBS_DISTILL_THRESHOLD", &mut config.distill_threshold)?;
        set_from_env(
            "EBS_MANUAL_LLM_TEMPERATURE",
            &mut config.manual_llm_temperature,
        )?;
        set_from_env("EBS_CHILDREN_PER_PARENT", &mut config.children_per_parent)?;
        set_from_env("EBS_THINKING_BUDGET", &mut config.thinking_budget)?;
        set_from_env("EBS_HISTORY_RETENTION", &mut config.history_retention)?;
        set_from_env("EBS_MIN_ALLOCATION", &mut config.min_allocation)?;
        set_from_env("EBS_EPSILON_THRESHOLD", &mut config.epsilon_threshold)?;
        Ok(())
    }

    fn set_from_env<T: std::str::FromStr>(name: &str, target: &mut T) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var(name) {
            *target = value
                .parse()
                .map_err(|_| ConfigError::InvalidEnvValue {
                    name: name.to_string(),
                    value,
                })?;
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn defaults_with_no_file_or_env() {
            let config = load(None).unwrap();
            assert_eq!(config, EngineConfig::default());
        }

        #[test]
        fn env_override_wins_over_default() {
            std::env::set_var("EBS_MAX_ITERATIONS", "3");
            let config = load(None).unwrap();
            std::env::remove_var("EBS_MAX_ITERATIONS");
            assert_eq!(config.max_iterations, 3);
        }

        #[test]
        fn invalid_env_value_is_rejected() {
            std::env::set_var("EBS_T_MAX", "not-a-number");
            let result = load(None);
            std::env::remove_var("EBS_T_MAX");
            assert!(result.is_err());
        }
    }
}
