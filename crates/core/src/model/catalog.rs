use serde::{Deserialize, Serialize};

use super::ids::{ItemId, TestSetId};
use super::lenient;

/// Coding problem difficulty as labelled by the recruiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

/// Catalog entry for a quiz inside a test set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    #[serde(rename = "_id")]
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub question_count: u32,
    #[serde(
        default,
        deserialize_with = "lenient::minutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<u32>,
}

/// Catalog entry for a coding problem inside a test set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSummary {
    #[serde(rename = "_id")]
    pub id: ItemId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

/// Server item catalog for one test set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSetDetail {
    #[serde(rename = "_id")]
    pub id: TestSetId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Allotted minutes for the whole set.
    #[serde(default, deserialize_with = "lenient::minutes")]
    pub duration: Option<u32>,
    #[serde(default)]
    pub quizzes: Vec<QuizSummary>,
    #[serde(default)]
    pub problems: Vec<ProblemSummary>,
}

impl TestSetDetail {
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.quizzes.len() + self.problems.len()
    }
}
