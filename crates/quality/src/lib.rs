pub mod engine;
pub mod rules;

use serde::{Deserialize, Serialize};

pub use engine::{score, score_with_threshold, DEFAULT_PASS_THRESHOLD};

/// Issue severity, ordered most severe first so a plain sort puts critical
/// issues at the top of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Structure,
    FactualDensity,
    Attribution,
    Formatting,
    Depth,
    Register,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub category: IssueCategory,
    pub description: String,
    pub suggestion: String,
}

/// Per-dimension scores, each 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScores {
    pub structure: u8,
    pub factual_density: u8,
    pub attribution: u8,
    pub formatting: u8,
    pub depth: u8,
    pub register: u8,
}

/// Output of one scoring call. Never mutated after return; scoring the same
/// text twice yields an identical review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReview {
    pub dimensions: DimensionScores,
    pub overall: f64,
    pub passed: bool,
    pub issues: Vec<Issue>,
}
