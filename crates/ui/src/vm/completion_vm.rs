use testset_core::model::TestSetSubmission;

use crate::vm::time_fmt::{format_datetime, format_minutes};

/// Result panel shown once the final submission is accepted.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionVm {
    pub final_score_label: String,
    pub quiz_score_label: String,
    pub coding_label: String,
    pub finished_at: Option<String>,
    pub time_used: Option<String>,
}

impl From<&TestSetSubmission> for CompletionVm {
    fn from(submission: &TestSetSubmission) -> Self {
        Self {
            final_score_label: format_score(submission.final_score),
            quiz_score_label: format_score(submission.total_quiz_score),
            coding_label: format!(
                "{} / {} problems passed",
                submission.total_passed_coding_problems, submission.total_coding_problems
            ),
            finished_at: submission.end_at.map(format_datetime),
            time_used: submission.actual_duration.map(format_minutes),
        }
    }
}

fn format_score(score: f64) -> String {
    if score.fract().abs() < f64::EPSILON {
        format!("{score:.0}")
    } else {
        format!("{score:.1}")
    }
}
