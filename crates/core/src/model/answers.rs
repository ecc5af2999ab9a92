use serde::{Deserialize, Serialize};

/// Candidate's choice for one quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    pub question_id: String,
    pub selected: Vec<String>,
}

/// Source submitted for one coding problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSubmission {
    pub language: String,
    pub source_code: String,
}
