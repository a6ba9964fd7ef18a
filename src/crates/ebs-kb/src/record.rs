//! The content-addressed record stored per knowledge-base file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    LessonLearned,
    SuccessPattern,
    BranchingHeuristic,
    MetaInsight,
    BranchArchive,
}

impl RecordType {
    /// The subset `write_experience` accepts — `BranchArchive` is reserved for the
    /// hard-prune path (`write_strategy_archive`, §4.13).
    pub fn from_experience_str(s: &str) -> Option<Self> {
        match s {
            "lesson_learned" => Some(RecordType::LessonLearned),
            "success_pattern" => Some(RecordType::SuccessPattern),
            "branching_heuristic" => Some(RecordType::BranchingHeuristic),
            "meta_insight" => Some(RecordType::MetaInsight),
            _ => None,
        }
    }

    pub fn as_filename_segment(&self) -> &'static str {
        match self {
            RecordType::LessonLearned => "lesson_learned",
            RecordType::SuccessPattern => "success_pattern",
            RecordType::BranchingHeuristic => "branching_heuristic",
            RecordType::MetaInsight => "meta_insight",
            RecordType::BranchArchive => "branch_archive",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub metadata: serde_json::Value,
    pub embedding: Option<Vec<f64>>,
}
