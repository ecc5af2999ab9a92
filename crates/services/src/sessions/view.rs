use testset_core::SessionPhase;
use testset_core::model::{ItemId, ItemStatus, SubmissionId, TestSetSubmission};

use super::service::{ItemClick, resolve_click};
use crate::error::SessionError;
use crate::navigator::{ItemNavigator, Progress};

/// Presentation-agnostic state of an open taking page.
///
/// Carries raw values only; the UI formats the countdown and percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub submission_id: SubmissionId,
    pub title: String,
    pub phase: SessionPhase,
    /// Seconds left, `None` while timing is missing.
    pub remaining: Option<u64>,
    pub items: Vec<ItemStatus>,
    pub progress: Progress,
    pub final_result: Option<TestSetSubmission>,
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    /// Placeholder published before the page has loaded.
    #[must_use]
    pub fn loading(submission_id: SubmissionId) -> Self {
        Self {
            submission_id,
            title: String::new(),
            phase: SessionPhase::Loading,
            remaining: None,
            items: Vec::new(),
            progress: Progress::default(),
            final_result: None,
            last_error: None,
        }
    }

    /// Manual submit is offered once everything is done, and again after a
    /// failed automatic submit at expiry.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        match self.phase {
            SessionPhase::AllCompleted => true,
            SessionPhase::Active => self.remaining == Some(0),
            _ => false,
        }
    }

    /// Same resolution as [`super::TestSetSession::click_item`], for
    /// callers that only hold the published snapshot.
    ///
    /// # Errors
    ///
    /// See [`super::TestSetSession::click_item`].
    pub fn click_item(
        &self,
        navigator: &ItemNavigator,
        item_id: &ItemId,
        return_url: &str,
    ) -> Result<ItemClick, SessionError> {
        resolve_click(
            self.phase,
            &self.items,
            &self.submission_id,
            navigator,
            item_id,
            return_url,
        )
    }
}
