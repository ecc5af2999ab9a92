use std::sync::Arc;

use storage::repository::StorageError;
use storage::session_store::SessionStore;
use testset_core::model::{
    CodeSubmission, ItemId, ItemKind, QuizAnswer, StoredSubmission, SubmissionId, TestSetId,
};

use super::service::{SubmitReason, TestSetSession, TickOutcome};
use crate::error::SessionError;
use crate::gateway::SubmissionGateway;
use crate::navigator::ItemNavigator;
use crate::sync::{CrossContextSync, SyncOutcome, SyncTrigger};
use crate::Clock;

/// Orchestrates the taking flow against the gateway and the Session Store.
#[derive(Clone)]
pub struct TestSetTakingService {
    clock: Clock,
    gateway: Arc<dyn SubmissionGateway>,
    sessions: SessionStore,
    navigator: ItemNavigator,
}

impl TestSetTakingService {
    #[must_use]
    pub fn new(
        clock: Clock,
        gateway: Arc<dyn SubmissionGateway>,
        sessions: SessionStore,
        navigator: ItemNavigator,
    ) -> Self {
        Self {
            clock,
            gateway,
            sessions,
            navigator,
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn now_ms(&self) -> i64 {
        self.clock.now_millis()
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[must_use]
    pub fn navigator(&self) -> &ItemNavigator {
        &self.navigator
    }

    #[must_use]
    pub fn sync_source(&self, submission_id: &SubmissionId) -> CrossContextSync {
        CrossContextSync::new(self.sessions.clone(), submission_id.clone())
    }

    /// Starts (or resumes) an attempt on the server and caches it locally.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::MissingDuration` if the test set has no
    /// duration, or gateway and storage failures.
    pub async fn start_test_set(&self, test_set_id: &TestSetId) -> Result<StoredSubmission, SessionError> {
        let submission = self.gateway.start_test_set(test_set_id).await?;
        let detail = self.gateway.get_test_set(test_set_id).await?;
        let duration = detail.duration.ok_or(SessionError::MissingDuration)?;

        let stored = StoredSubmission::started(submission, self.now_ms(), duration);
        let stored = self.sessions.create(stored).await?;
        tracing::info!(
            submission = %stored.id(),
            test_set = %test_set_id,
            duration_minutes = duration,
            "attempt cached"
        );
        Ok(stored)
    }

    /// Loads everything the taking page needs. Missing or unreadable inputs
    /// produce an `Invalid` session rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` only when the store itself fails.
    pub async fn open_session(&self, submission_id: &SubmissionId) -> Result<TestSetSession, SessionError> {
        let stored = match self.sessions.load(submission_id).await {
            Ok(stored) => stored,
            Err(StorageError::Serialization(reason)) => {
                tracing::warn!(submission = %submission_id, %reason, "cached attempt is unreadable");
                None
            }
            Err(err) => return Err(err.into()),
        };

        let detail = match &stored {
            Some(stored) => match self.gateway.get_test_set(&stored.submission().test_set_id).await {
                Ok(detail) => Some(detail),
                Err(err) => {
                    tracing::error!(submission = %submission_id, error = %err, "test set catalog unavailable");
                    None
                }
            },
            None => None,
        };

        Ok(TestSetSession::open(
            submission_id.clone(),
            detail,
            stored,
            self.now_ms(),
        ))
    }

    /// One countdown step: refreshes the timer and writes `actualDuration`
    /// back. A write-back failure is logged and does not stop the countdown.
    pub async fn tick(&self, session: &mut TestSetSession) -> TickOutcome {
        let outcome = session.tick(self.now_ms());
        if let Some(minutes) = outcome.elapsed_minutes {
            self.record_elapsed(session, minutes).await;
        }
        outcome
    }

    async fn record_elapsed(&self, session: &mut TestSetSession, minutes: u32) {
        let unchanged = session
            .stored()
            .is_some_and(|stored| stored.submission().actual_duration == Some(minutes));
        if unchanged {
            return;
        }
        match self.sessions.record_elapsed(session.submission_id(), minutes).await {
            Ok(_) => session.note_elapsed_written(minutes),
            Err(err) => {
                tracing::warn!(submission = %session.submission_id(), error = %err, "elapsed write-back failed");
            }
        }
    }

    /// Reconciles the page with the store.
    pub async fn sync(&self, session: &mut TestSetSession, trigger: SyncTrigger) -> SyncOutcome {
        let snapshot = self
            .sync_source(session.submission_id())
            .fetch(&trigger)
            .await;
        session.apply_sync(snapshot, &trigger, self.now_ms())
    }

    /// Manual submit. Returns `Ok(false)` when the click is not accepted in
    /// the current phase.
    ///
    /// # Errors
    ///
    /// See [`TestSetTakingService::submit_final`].
    pub async fn submit_clicked(&self, session: &mut TestSetSession) -> Result<bool, SessionError> {
        if !session.begin_submit(SubmitReason::Manual, self.now_ms()) {
            return Ok(false);
        }
        self.submit_final(session).await?;
        Ok(true)
    }

    /// Sends the final submission for a session in `Submitting`.
    ///
    /// Success clears the cached attempt. Failure keeps it, returns the page
    /// to its running phase and is not retried.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitting` if the session is not in
    /// flight, or the gateway error after the session has been settled.
    pub async fn submit_final(&self, session: &mut TestSetSession) -> Result<(), SessionError> {
        if session.phase() != testset_core::SessionPhase::Submitting {
            return Err(SessionError::NotSubmitting);
        }
        let submission_id = session.submission_id().clone();

        match self.gateway.submit_final(&submission_id).await {
            Ok(final_submission) => {
                if let Err(err) = self.sessions.clear(&submission_id).await {
                    tracing::warn!(submission = %submission_id, error = %err, "could not clear cached attempt");
                }
                tracing::info!(
                    submission = %submission_id,
                    final_score = final_submission.final_score,
                    "test set submitted"
                );
                session.finish_submit(Ok(final_submission), self.now_ms())
            }
            Err(err) => {
                tracing::error!(submission = %submission_id, error = %err, "final submission failed");
                session.finish_submit(Err(err.to_string()), self.now_ms())?;
                Err(err.into())
            }
        }
    }

    /// Quiz page submit: gateway call, then completion write-back.
    ///
    /// # Errors
    ///
    /// Returns gateway or storage failures. `SessionError::NotStarted` if the
    /// attempt is not cached on this device.
    pub async fn submit_quiz_item(
        &self,
        submission_id: &SubmissionId,
        quiz_id: &ItemId,
        answers: &[QuizAnswer],
    ) -> Result<StoredSubmission, SessionError> {
        let updated = self.gateway.submit_quiz(submission_id, quiz_id, answers).await?;
        self.write_back(submission_id, ItemKind::Quiz, quiz_id, &updated)
            .await
    }

    /// Coding page submit: gateway call, then completion write-back.
    ///
    /// # Errors
    ///
    /// See [`TestSetTakingService::submit_quiz_item`].
    pub async fn submit_code_item(
        &self,
        submission_id: &SubmissionId,
        problem_id: &ItemId,
        submission: &CodeSubmission,
    ) -> Result<StoredSubmission, SessionError> {
        let updated = self
            .gateway
            .submit_code(submission_id, problem_id, submission)
            .await?;
        self.write_back(submission_id, ItemKind::Code, problem_id, &updated)
            .await
    }

    async fn write_back(
        &self,
        submission_id: &SubmissionId,
        kind: ItemKind,
        item_id: &ItemId,
        updated: &testset_core::model::TestSetSubmission,
    ) -> Result<StoredSubmission, SessionError> {
        let item = item_id.clone();
        let stored = self
            .sessions
            .update(submission_id, move |stored| {
                stored.merge_progress(updated);
                stored.mark_completed(kind, item);
            })
            .await
            .map_err(|err| match err {
                StorageError::NotFound => SessionError::NotStarted,
                other => SessionError::Storage(other),
            })?;
        tracing::info!(submission = %submission_id, item = %item_id, kind = kind.label(), "item completed");
        Ok(stored)
    }
}
