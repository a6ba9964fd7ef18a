//! The Strategy record: the unit of evolutionary selection.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a [`Strategy`].
///
/// `PrunedSynthesized` is terminal: once set, no node may re-activate the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyStatus {
    Active,
    Expanded,
    Pruned,
    PrunedSynthesized,
    PrunedError,
    Completed,
}

impl StrategyStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, StrategyStatus::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StrategyStatus::PrunedSynthesized | StrategyStatus::Completed
        )
    }
}

/// A candidate direction through the problem space, carried through embedding,
/// scoring, and propagation until it is pruned, expanded, or synthesized away.
///
/// `embedding` is assigned at most once (see [`Strategy::set_embedding`]) and is
/// immutable thereafter; callers that need to mutate an embedded strategy's vector
/// should spawn a child instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Strategy {
    pub id: String,
    pub name: String,
    pub rationale: String,
    pub assumption: String,
    /// Opaque payload forwarded untouched between nodes.
    pub milestones: serde_json::Value,
    pub embedding: Option<Vec<f64>>,
    pub density: Option<f64>,
    pub log_density: Option<f64>,
    pub score: f64,
    pub ucb_score: Option<f64>,
    pub child_quota: u32,
    pub status: StrategyStatus,
    pub trajectory: Vec<String>,
    pub parent_id: Option<String>,
    pub pruned_at_report_version: Option<u32>,
}

impl Strategy {
    /// Constructs a freshly generated root or child strategy: empty metrics, `active`
    /// status, and a single trajectory entry.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        rationale: impl Into<String>,
        assumption: impl Into<String>,
        milestones: serde_json::Value,
        parent_id: Option<String>,
        trajectory_entry: impl Into<String>,
    ) -> Self {
        Strategy {
            id: id.into(),
            name: name.into(),
            rationale: rationale.into(),
            assumption: assumption.into(),
            milestones,
            embedding: None,
            density: None,
            log_density: None,
            score: 0.0,
            ucb_score: None,
            child_quota: 0,
            status: StrategyStatus::Active,
            trajectory: vec![trajectory_entry.into()],
            parent_id,
            pruned_at_report_version: None,
        }
    }

    /// Assigns this strategy's embedding. Returns `false` without mutating if an
    /// embedding is already present, preserving the "immutable once assigned" invariant.
    pub fn set_embedding(&mut self, embedding: Vec<f64>) -> bool {
        if self.embedding.is_some() {
            return false;
        }
        self.embedding = Some(embedding);
        true
    }

    pub fn push_trajectory(&mut self, entry: impl Into<String>) {
        self.trajectory.push(entry.into());
    }

    /// The text fed to the embedding service: name + rationale + assumption.
    pub fn embedding_text(&self) -> String {
        format!("{} {} {}", self.name, self.rationale, self.assumption)
    }

    /// Checks the invariants from the data model that are local to a single strategy
    /// (cross-strategy invariants, e.g. id uniqueness, are checked by `RunState`).
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.child_quota > 0 && !self.status.is_active() {
            return Err(format!(
                "strategy {}: child_quota > 0 requires status = active, got {:?}",
                self.id, self.status
            ));
        }
        if self.status == StrategyStatus::Expanded && self.child_quota != 0 {
            return Err(format!(
                "strategy {}: status = expanded requires child_quota = 0",
                self.id
            ));
        }
        if self.status == StrategyStatus::PrunedSynthesized && self.pruned_at_report_version.is_none()
        {
            return Err(format!(
                "strategy {}: status = pruned_synthesized requires pruned_at_report_version",
                self.id
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str) -> Strategy {
        Strategy::new(
            id,
            "name",
            "rationale",
            "assumption",
            serde_json::json!({}),
            None,
            "[Test] created",
        )
    }

    #[test]
    fn embedding_is_assigned_once() {
        let mut s = sample("s1");
        assert!(s.set_embedding(vec![1.0, 2.0]));
        assert!(!s.set_embedding(vec![3.0, 4.0]));
        assert_eq!(s.embedding, Some(vec![1.0, 2.0]));
    }

    #[test]
    fn expanded_requires_zero_quota() {
        let mut s = sample("s1");
        s.status = StrategyStatus::Expanded;
        s.child_quota = 1;
        assert!(s.check_invariants().is_err());
        s.child_quota = 0;
        assert!(s.check_invariants().is_ok());
    }

    #[test]
    fn pruned_synthesized_requires_report_version() {
        let mut s = sample("s1");
        s.status = StrategyStatus::PrunedSynthesized;
        assert!(s.check_invariants().is_err());
        s.pruned_at_report_version = Some(1);
        assert!(s.check_invariants().is_ok());
    }

    #[test]
    fn active_required_for_nonzero_quota() {
        let mut s = sample("s1");
        s.status = StrategyStatus::Pruned;
        s.child_quota = 2;
        assert!(s.check_invariants().is_err());
    }
}
