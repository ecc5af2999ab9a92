//! Cross-Context Sync: keeps an open page in step with writes made elsewhere.

use storage::repository::StorageError;
use storage::session_store::{SessionStore, SessionSubscription};
use testset_core::SessionTrigger;
use testset_core::model::{StoredSubmission, SubmissionId};

/// Why a page should reconcile with the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncTrigger {
    VisibilityRegained,
    FocusRegained,
    /// Another context wrote the record; carries the written value.
    StorageEvent { new_value: Option<String> },
    /// Change notices were dropped; fall back to a re-read.
    Lagged,
}

impl SyncTrigger {
    /// Phase machine trigger the sync is reported as.
    #[must_use]
    pub fn phase_trigger(&self) -> SessionTrigger {
        match self {
            SyncTrigger::VisibilityRegained | SyncTrigger::FocusRegained => SessionTrigger::FocusRegained,
            SyncTrigger::StorageEvent { .. } | SyncTrigger::Lagged => SessionTrigger::ItemCompleted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The record is gone (removed, or never written).
    Missing,
    /// The record did not parse.
    Corrupt,
    /// The store could not be read.
    Unavailable,
    /// The page already reached a terminal phase.
    Terminal,
    /// The record belongs to another attempt.
    Mismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied {
        completed_before: usize,
        completed_after: usize,
    },
    Skipped(SkipReason),
}

impl SyncOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, SyncOutcome::Applied { .. })
    }
}

/// Reads fresh snapshots of one attempt's record.
#[derive(Clone)]
pub struct CrossContextSync {
    store: SessionStore,
    submission_id: SubmissionId,
}

impl CrossContextSync {
    #[must_use]
    pub fn new(store: SessionStore, submission_id: SubmissionId) -> Self {
        Self {
            store,
            submission_id,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        self.store.subscribe(&self.submission_id)
    }

    /// Snapshot to reconcile with. Focus and visibility re-read the key,
    /// storage events use the delivered value.
    ///
    /// # Errors
    ///
    /// Returns the `SkipReason` when there is nothing usable to apply; the
    /// caller keeps its current state.
    pub async fn fetch(&self, trigger: &SyncTrigger) -> Result<StoredSubmission, SkipReason> {
        let raw = match trigger {
            SyncTrigger::StorageEvent { new_value } => new_value.clone(),
            SyncTrigger::VisibilityRegained | SyncTrigger::FocusRegained | SyncTrigger::Lagged => {
                match self.store.load_raw(&self.submission_id).await {
                    Ok(raw) => raw,
                    Err(err) => {
                        tracing::warn!(submission = %self.submission_id, error = %err, "sync read failed");
                        return Err(SkipReason::Unavailable);
                    }
                }
            }
        };

        let Some(raw) = raw else {
            tracing::debug!(submission = %self.submission_id, ?trigger, "record gone, keeping state");
            return Err(SkipReason::Missing);
        };

        match SessionStore::decode(&raw) {
            Ok(stored) => Ok(stored),
            Err(StorageError::Serialization(reason)) => {
                tracing::warn!(submission = %self.submission_id, %reason, "ignoring unreadable session record");
                Err(SkipReason::Corrupt)
            }
            Err(err) => {
                tracing::warn!(submission = %self.submission_id, error = %err, "sync decode failed");
                Err(SkipReason::Unavailable)
            }
        }
    }
}
