#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use services::{GatewayError, ItemNavigator, SubmissionGateway, TestSetTakingService};
use storage::{InMemoryStore, SessionStore};
use testset_core::model::{
    CodeSubmission, ItemId, ProblemSummary, QuizAnswer, StoredSubmission, SubmissionId,
    TestSetDetail, TestSetId, TestSetSubmission,
};
use testset_core::time::{fixed_clock, FIXED_TEST_TIMESTAMP};

pub const NOW_MS: i64 = FIXED_TEST_TIMESTAMP * 1000;
pub const MINUTE_MS: i64 = 60_000;
pub const SUBMISSION: &str = "sub-1";
pub const TEST_SET: &str = "ts-1";

/// Gateway double that records calls and can be told to reject the final
/// submission.
#[derive(Default)]
pub struct FakeGateway {
    pub fail_final: AtomicBool,
    pub final_calls: AtomicUsize,
    pub item_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn failing_final() -> Self {
        let gateway = Self::default();
        gateway.fail_final.store(true, Ordering::SeqCst);
        gateway
    }

    pub fn final_calls(&self) -> usize {
        self.final_calls.load(Ordering::SeqCst)
    }
}

pub fn detail() -> TestSetDetail {
    TestSetDetail {
        id: TestSetId::new(TEST_SET),
        title: "Backend screening".into(),
        description: None,
        duration: Some(30),
        quizzes: vec![testset_core::model::QuizSummary {
            id: ItemId::new("q1"),
            title: "Ownership".into(),
            question_count: 4,
            duration: Some(10),
        }],
        problems: vec![ProblemSummary {
            id: ItemId::new("p1"),
            title: "Merge intervals".into(),
            difficulty: None,
        }],
    }
}

fn blank_submission(id: &SubmissionId) -> TestSetSubmission {
    TestSetSubmission::new(id.clone(), TestSetId::new(TEST_SET))
}

#[async_trait]
impl SubmissionGateway for FakeGateway {
    async fn start_test_set(&self, _test_set_id: &TestSetId) -> Result<TestSetSubmission, GatewayError> {
        Ok(blank_submission(&SubmissionId::new(SUBMISSION)))
    }

    async fn get_test_set(&self, _test_set_id: &TestSetId) -> Result<TestSetDetail, GatewayError> {
        Ok(detail())
    }

    async fn submit_quiz(
        &self,
        submission_id: &SubmissionId,
        quiz_id: &ItemId,
        _answers: &[QuizAnswer],
    ) -> Result<TestSetSubmission, GatewayError> {
        self.item_calls.fetch_add(1, Ordering::SeqCst);
        let mut updated = blank_submission(submission_id);
        updated.completed_quiz_ids = vec![quiz_id.clone()];
        updated.total_quiz_score = 4.0;
        Ok(updated)
    }

    async fn submit_code(
        &self,
        submission_id: &SubmissionId,
        problem_id: &ItemId,
        _submission: &CodeSubmission,
    ) -> Result<TestSetSubmission, GatewayError> {
        self.item_calls.fetch_add(1, Ordering::SeqCst);
        let mut updated = blank_submission(submission_id);
        updated.completed_problem_ids = vec![problem_id.clone()];
        Ok(updated)
    }

    async fn submit_final(&self, submission_id: &SubmissionId) -> Result<TestSetSubmission, GatewayError> {
        self.final_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_final.load(Ordering::SeqCst) {
            return Err(GatewayError::HttpStatus {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                message: "network unreachable".into(),
            });
        }
        let mut done = blank_submission(submission_id);
        done.submitted = true;
        done.final_score = 82.5;
        Ok(done)
    }
}

pub fn service(gateway: Arc<FakeGateway>, kv: InMemoryStore) -> Arc<TestSetTakingService> {
    Arc::new(TestSetTakingService::new(
        fixed_clock(),
        gateway,
        SessionStore::new(Arc::new(kv)),
        ItemNavigator::new(Url::parse("app://localhost/").unwrap()),
    ))
}

/// Record of an attempt that started `minutes_ago` minutes before `NOW_MS`.
pub fn started(minutes_ago: i64, duration: u32) -> StoredSubmission {
    StoredSubmission::started(
        blank_submission(&SubmissionId::new(SUBMISSION)),
        NOW_MS - minutes_ago * MINUTE_MS,
        duration,
    )
}

pub fn submission_id() -> SubmissionId {
    SubmissionId::new(SUBMISSION)
}
