//! Remote calls the taking flow depends on.

mod http;

use async_trait::async_trait;

use testset_core::model::{
    CodeSubmission, ItemId, QuizAnswer, SubmissionId, TestSetDetail, TestSetId, TestSetSubmission,
};

use crate::error::GatewayError;

pub use http::HttpSubmissionGateway;

/// Submission Gateway: the backend that owns attempts and scores.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    /// Create (or resume) the candidate's attempt for a test set.
    async fn start_test_set(&self, test_set_id: &TestSetId) -> Result<TestSetSubmission, GatewayError>;

    /// Item catalog and allotted duration of a test set.
    async fn get_test_set(&self, test_set_id: &TestSetId) -> Result<TestSetDetail, GatewayError>;

    async fn submit_quiz(
        &self,
        submission_id: &SubmissionId,
        quiz_id: &ItemId,
        answers: &[QuizAnswer],
    ) -> Result<TestSetSubmission, GatewayError>;

    async fn submit_code(
        &self,
        submission_id: &SubmissionId,
        problem_id: &ItemId,
        submission: &CodeSubmission,
    ) -> Result<TestSetSubmission, GatewayError>;

    /// Close the attempt. The returned record has `submitted = true`.
    async fn submit_final(&self, submission_id: &SubmissionId) -> Result<TestSetSubmission, GatewayError>;
}
