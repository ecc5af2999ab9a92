use url::Url;

use testset_core::model::{ItemId, ItemStatus, StoredSubmission, SubmissionId, TestSetDetail, TestSetSubmission};
use testset_core::{PhaseContext, PhaseError, SessionPhase, SessionTrigger};

use super::view::SessionSnapshot;
use crate::error::SessionError;
use crate::navigator::{ItemNavigator, Progress};
use crate::sync::{SkipReason, SyncOutcome, SyncTrigger};
use crate::timer::TimerController;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Who asked for the final submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitReason {
    Manual,
    TimerExpired,
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub remaining: Option<u64>,
    /// Set while the page is running; written back as `actualDuration`.
    pub elapsed_minutes: Option<u32>,
    /// The automatic final submission must be sent now. True at most once.
    pub submit_due: bool,
}

/// What a click on an item card resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemClick {
    Navigate(Url),
    /// Completed items are inert.
    AlreadyCompleted,
    /// The page is not accepting item work (submitting, submitted, invalid).
    Locked,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State of one open taking page.
///
/// Pure and clock-free: every time-dependent call takes `now_ms` from the
/// services layer clock.
#[derive(Debug, Clone)]
pub struct TestSetSession {
    submission_id: SubmissionId,
    detail: Option<TestSetDetail>,
    stored: Option<StoredSubmission>,
    items: Vec<ItemStatus>,
    timer: TimerController,
    phase: SessionPhase,
    final_result: Option<TestSetSubmission>,
    last_error: Option<String>,
}

impl TestSetSession {
    /// Builds the page from the catalog and the stored record.
    ///
    /// Either piece missing leaves the page `Invalid`. A record already
    /// flagged `submitted` opens as `Submitted`.
    #[must_use]
    pub fn open(
        submission_id: SubmissionId,
        detail: Option<TestSetDetail>,
        stored: Option<StoredSubmission>,
        now_ms: i64,
    ) -> Self {
        let mut session = Self {
            submission_id,
            detail: None,
            stored: None,
            items: Vec::new(),
            timer: TimerController::default(),
            phase: SessionPhase::Loading,
            final_result: None,
            last_error: None,
        };

        let (Some(detail), Some(stored)) = (detail, stored) else {
            session.invalidate("test set or cached attempt is missing");
            return session;
        };
        if stored.id() != &session.submission_id {
            session.invalidate("cached attempt belongs to another submission");
            return session;
        }

        session.items = ItemNavigator::project_items(&detail, &stored);
        session.timer = TimerController::new(stored.timing());
        if stored.timing().is_none() {
            tracing::warn!(submission = %session.submission_id, "cached attempt has no usable timing");
        }
        let already_submitted = stored.submission().submitted;
        session.detail = Some(detail);
        session.stored = Some(stored);

        if already_submitted {
            session.final_result = session.stored.as_ref().map(|s| s.submission().clone());
            session.phase = SessionPhase::Submitted;
            return session;
        }

        if let Err(err) = session.transition(SessionTrigger::Loaded, now_ms) {
            tracing::error!(error = %err, "load transition rejected");
        }
        session
    }

    fn invalidate(&mut self, reason: &str) {
        tracing::warn!(submission = %self.submission_id, reason, "taking page is invalid");
        self.phase = SessionPhase::Invalid;
        self.last_error = Some(reason.to_owned());
    }

    fn context(&self, now_ms: i64) -> PhaseContext {
        PhaseContext {
            all_completed: self.progress().all_completed(),
            expired: self.timer.has_fired() || self.timer.is_expired(now_ms),
        }
    }

    fn transition(&mut self, trigger: SessionTrigger, now_ms: i64) -> Result<(), PhaseError> {
        let next = self.phase.on(trigger, self.context(now_ms))?;
        if next != self.phase {
            tracing::debug!(from = ?self.phase, to = ?next, ?trigger, "phase changed");
        }
        self.phase = next;
        Ok(())
    }

    #[must_use]
    pub fn submission_id(&self) -> &SubmissionId {
        &self.submission_id
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn items(&self) -> &[ItemStatus] {
        &self.items
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress::from_items(&self.items)
    }

    #[must_use]
    pub fn detail(&self) -> Option<&TestSetDetail> {
        self.detail.as_ref()
    }

    #[must_use]
    pub fn stored(&self) -> Option<&StoredSubmission> {
        self.stored.as_ref()
    }

    #[must_use]
    pub fn final_result(&self) -> Option<&TestSetSubmission> {
        self.final_result.as_ref()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn remaining(&self, now_ms: i64) -> Option<u64> {
        self.timer.remaining(now_ms)
    }

    /// Advances the countdown. Outside the running phases only the display
    /// value is refreshed.
    pub fn tick(&mut self, now_ms: i64) -> TickOutcome {
        if !self.phase.is_running() {
            return TickOutcome {
                remaining: self.timer.remaining(now_ms),
                elapsed_minutes: None,
                submit_due: false,
            };
        }

        let tick = self.timer.tick(now_ms);
        let submit_due = tick.expired && self.begin_submit(SubmitReason::TimerExpired, now_ms);
        TickOutcome {
            remaining: tick.remaining,
            elapsed_minutes: tick.elapsed_minutes,
            submit_due,
        }
    }

    /// Mirrors a successful `actualDuration` write so the same minute is not
    /// written again.
    pub(crate) fn note_elapsed_written(&mut self, minutes: u32) {
        if let Some(stored) = self.stored.as_mut() {
            stored.set_elapsed_minutes(minutes);
        }
    }

    /// Folds a freshly read record into the page.
    ///
    /// Completing the last item moves the page to `AllCompleted` and never
    /// submits on its own.
    pub fn apply_sync(
        &mut self,
        snapshot: Result<StoredSubmission, SkipReason>,
        trigger: &SyncTrigger,
        now_ms: i64,
    ) -> SyncOutcome {
        if self.phase.is_terminal() {
            return SyncOutcome::Skipped(SkipReason::Terminal);
        }
        let stored = match snapshot {
            Ok(stored) => stored,
            Err(reason) => return SyncOutcome::Skipped(reason),
        };
        if stored.id() != &self.submission_id {
            return SyncOutcome::Skipped(SkipReason::Mismatch);
        }
        let Some(detail) = self.detail.as_ref() else {
            return SyncOutcome::Skipped(SkipReason::Terminal);
        };

        let completed_before = self.progress().completed;
        self.items = ItemNavigator::project_items(detail, &stored);
        self.timer.retime(stored.timing());
        self.stored = Some(stored);
        let completed_after = self.progress().completed;

        if self.phase.is_running() {
            if let Err(err) = self.transition(trigger.phase_trigger(), now_ms) {
                tracing::debug!(error = %err, "sync left phase unchanged");
            }
        }
        tracing::debug!(
            submission = %self.submission_id,
            ?trigger,
            completed_before,
            completed_after,
            "sync applied"
        );

        SyncOutcome::Applied {
            completed_before,
            completed_after,
        }
    }

    /// Resolves a click on an item card.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownItem` for ids outside the catalog, or a
    /// navigation error if the link cannot be built.
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

    /// Moves into `Submitting`. Returns `false` when the phase does not
    /// allow it, which makes a second submit a no-op.
    pub fn begin_submit(&mut self, reason: SubmitReason, now_ms: i64) -> bool {
        let trigger = match reason {
            SubmitReason::Manual => SessionTrigger::SubmitClicked,
            SubmitReason::TimerExpired => SessionTrigger::TimerExpired,
        };
        match self.transition(trigger, now_ms) {
            Ok(()) => {
                tracing::info!(submission = %self.submission_id, ?reason, "final submission started");
                self.last_error = None;
                true
            }
            Err(err) => {
                tracing::debug!(error = %err, "submit ignored");
                false
            }
        }
    }

    /// Settles an in-flight final submission.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitting` if no submission is in flight.
    pub fn finish_submit(
        &mut self,
        result: Result<TestSetSubmission, String>,
        now_ms: i64,
    ) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Submitting {
            return Err(SessionError::NotSubmitting);
        }
        match result {
            Ok(submission) => {
                self.transition(SessionTrigger::SubmitSucceeded, now_ms)?;
                self.final_result = Some(submission);
            }
            Err(message) => {
                self.transition(SessionTrigger::SubmitFailed, now_ms)?;
                self.last_error = Some(message);
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self, now_ms: i64) -> SessionSnapshot {
        SessionSnapshot {
            submission_id: self.submission_id.clone(),
            title: self
                .detail
                .as_ref()
                .map(|detail| detail.title.clone())
                .unwrap_or_default(),
            phase: self.phase,
            remaining: self.timer.remaining(now_ms),
            items: self.items.clone(),
            progress: self.progress(),
            final_result: self.final_result.clone(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Completed items are inert in every phase; open items only lead somewhere
/// while the page is running.
pub(super) fn resolve_click(
    phase: SessionPhase,
    items: &[ItemStatus],
    submission_id: &SubmissionId,
    navigator: &ItemNavigator,
    item_id: &ItemId,
    return_url: &str,
) -> Result<ItemClick, SessionError> {
    let item = items
        .iter()
        .find(|item| &item.id == item_id)
        .ok_or_else(|| SessionError::UnknownItem(item_id.clone()))?;
    if item.completed {
        return Ok(ItemClick::AlreadyCompleted);
    }
    if !phase.is_running() {
        return Ok(ItemClick::Locked);
    }
    Ok(match navigator.target_for(submission_id, item, return_url)? {
        Some(url) => ItemClick::Navigate(url),
        None => ItemClick::AlreadyCompleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use testset_core::model::{ProblemSummary, QuizSummary, TestSetId};

    const START_MS: i64 = 1_700_000_000_000;
    const MINUTE: i64 = 60_000;

    fn detail() -> TestSetDetail {
        TestSetDetail {
            id: TestSetId::new("ts-1"),
            title: "Screening".into(),
            description: None,
            duration: Some(30),
            quizzes: vec![QuizSummary {
                id: ItemId::new("q1"),
                title: "Quiz".into(),
                question_count: 5,
                duration: None,
            }],
            problems: vec![ProblemSummary {
                id: ItemId::new("p1"),
                title: "Problem".into(),
                difficulty: None,
            }],
        }
    }

    fn stored(done: &[(&str, bool)]) -> StoredSubmission {
        let mut record = StoredSubmission::started(
            TestSetSubmission::new(SubmissionId::new("sub-1"), TestSetId::new("ts-1")),
            START_MS,
            30,
        );
        for (id, is_quiz) in done {
            let kind = if *is_quiz {
                testset_core::model::ItemKind::Quiz
            } else {
                testset_core::model::ItemKind::Code
            };
            record.mark_completed(kind, ItemId::new(*id));
        }
        record
    }

    fn open(record: StoredSubmission, now_ms: i64) -> TestSetSession {
        TestSetSession::open(SubmissionId::new("sub-1"), Some(detail()), Some(record), now_ms)
    }

    fn navigator() -> ItemNavigator {
        ItemNavigator::new(Url::parse("app://localhost/").unwrap())
    }

    #[test]
    fn missing_pieces_open_invalid() {
        let no_record = TestSetSession::open(SubmissionId::new("sub-1"), Some(detail()), None, START_MS);
        assert_eq!(no_record.phase(), SessionPhase::Invalid);

        let no_catalog = TestSetSession::open(SubmissionId::new("sub-1"), None, Some(stored(&[])), START_MS);
        assert_eq!(no_catalog.phase(), SessionPhase::Invalid);
        assert!(no_catalog.last_error().is_some());
    }

    #[test]
    fn open_settles_by_completion() {
        assert_eq!(open(stored(&[]), START_MS).phase(), SessionPhase::Active);
        assert_eq!(
            open(stored(&[("q1", true), ("p1", false)]), START_MS).phase(),
            SessionPhase::AllCompleted
        );
    }

    #[test]
    fn submitted_record_opens_submitted() {
        let mut record = stored(&[]);
        let mut server = record.submission().clone();
        server.submitted = true;
        record.merge_progress(&server);

        let session = open(record, START_MS);
        assert_eq!(session.phase(), SessionPhase::Submitted);
        assert!(session.final_result().is_some());
    }

    #[test]
    fn expiry_requests_submit_once() {
        let mut session = open(stored(&[]), START_MS);
        assert!(!session.tick(START_MS + 29 * MINUTE).submit_due);

        let first = session.tick(START_MS + 31 * MINUTE);
        assert!(first.submit_due);
        assert_eq!(first.remaining, Some(0));
        assert_eq!(session.phase(), SessionPhase::Submitting);

        assert!(!session.tick(START_MS + 31 * MINUTE + 1_000).submit_due);
        assert!(!session.begin_submit(SubmitReason::Manual, START_MS + 32 * MINUTE));
    }

    #[test]
    fn running_ticks_report_elapsed_minutes() {
        let mut session = open(stored(&[]), START_MS);
        let tick = session.tick(START_MS + 12 * MINUTE + 5_000);
        assert_eq!(tick.elapsed_minutes, Some(12));
        assert_eq!(tick.remaining, Some(17 * 60 + 55));
    }

    #[test]
    fn sync_completing_last_item_unlocks_submit_without_sending() {
        let mut session = open(stored(&[("q1", true)]), START_MS);
        let outcome = session.apply_sync(
            Ok(stored(&[("q1", true), ("p1", false)])),
            &SyncTrigger::StorageEvent { new_value: None },
            START_MS + MINUTE,
        );

        assert_eq!(
            outcome,
            SyncOutcome::Applied {
                completed_before: 1,
                completed_after: 2
            }
        );
        assert_eq!(session.phase(), SessionPhase::AllCompleted);
        assert!(session.snapshot(START_MS + MINUTE).can_submit());
    }

    #[test]
    fn skipped_sync_keeps_state() {
        let mut session = open(stored(&[("q1", true)]), START_MS);
        let outcome = session.apply_sync(
            Err(SkipReason::Corrupt),
            &SyncTrigger::FocusRegained,
            START_MS,
        );
        assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::Corrupt));
        assert_eq!(session.progress().completed, 1);
    }

    #[test]
    fn clicking_completed_item_is_a_no_op() {
        let session = open(stored(&[("q1", true)]), START_MS);
        for _ in 0..3 {
            let click = session
                .click_item(&navigator(), &ItemId::new("q1"), "/testset/take/sub-1")
                .unwrap();
            assert_eq!(click, ItemClick::AlreadyCompleted);
        }
        assert_eq!(session.phase(), SessionPhase::Active);
    }

    #[test]
    fn clicking_open_item_navigates() {
        let session = open(stored(&[]), START_MS);
        let ItemClick::Navigate(url) = session
            .click_item(&navigator(), &ItemId::new("p1"), "/testset/take/sub-1")
            .unwrap()
        else {
            panic!("expected navigation");
        };
        assert_eq!(url.path(), "/testset/code/p1");

        let err = session
            .click_item(&navigator(), &ItemId::new("zz"), "/")
            .unwrap_err();
        assert!(matches!(err, SessionError::UnknownItem(_)));
    }

    #[test]
    fn failed_submit_returns_to_running_phase_with_error() {
        let mut session = open(stored(&[("q1", true), ("p1", false)]), START_MS);
        assert!(session.begin_submit(SubmitReason::Manual, START_MS));
        session
            .finish_submit(Err("network down".into()), START_MS)
            .unwrap();

        assert_eq!(session.phase(), SessionPhase::AllCompleted);
        assert_eq!(session.last_error(), Some("network down"));
        assert!(matches!(
            session.finish_submit(Err("again".into()), START_MS),
            Err(SessionError::NotSubmitting)
        ));
    }

    #[test]
    fn manual_submit_needs_all_items_or_expiry() {
        let mut session = open(stored(&[]), START_MS);
        assert!(!session.begin_submit(SubmitReason::Manual, START_MS));
        assert!(session.begin_submit(SubmitReason::Manual, START_MS + 31 * MINUTE));
    }
}
