//! Typed access to the per-attempt record kept in the shared key-value store.

use std::sync::Arc;

use testset_core::model::{ItemId, ItemKind, StoredSubmission, SubmissionId, TestSetSubmission};

use crate::repository::{ContextId, KeyValueStore, StorageError, StorageNotice, StorageSubscription};

/// Every attempt lives under `testset_submission_<submissionId>`.
pub const SESSION_KEY_PREFIX: &str = "testset_submission_";

#[must_use]
pub fn session_key(id: &SubmissionId) -> String {
    format!("{SESSION_KEY_PREFIX}{id}")
}

/// Session Store: one JSON record per active attempt.
///
/// The record is the single source of truth for resuming an interrupted
/// attempt. It is removed only after a successful final submission.
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    #[must_use]
    pub fn context_id(&self) -> ContextId {
        self.kv.context_id()
    }

    /// Parse a raw record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if `raw` is not a valid record.
    pub fn decode(raw: &str) -> Result<StoredSubmission, StorageError> {
        serde_json::from_str(raw).map_err(|err| StorageError::Serialization(err.to_string()))
    }

    fn encode(stored: &StoredSubmission) -> Result<String, StorageError> {
        serde_json::to_string(stored).map_err(|err| StorageError::Serialization(err.to_string()))
    }

    /// Raw record as last written by any context.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    pub async fn load_raw(&self, id: &SubmissionId) -> Result<Option<String>, StorageError> {
        self.kv.get(&session_key(id)).await
    }

    /// Decoded record, or `None` when no attempt is cached for `id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for a corrupted record, or other
    /// storage errors from the backend.
    pub async fn load(&self, id: &SubmissionId) -> Result<Option<StoredSubmission>, StorageError> {
        self.load_raw(id)
            .await?
            .map(|raw| Self::decode(&raw))
            .transpose()
    }

    /// Overwrite the record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be encoded or stored.
    pub async fn save(&self, stored: &StoredSubmission) -> Result<(), StorageError> {
        let raw = Self::encode(stored)?;
        self.kv.set(&session_key(stored.id()), &raw).await
    }

    /// First write for an attempt.
    ///
    /// If a readable record already exists for the same id its timing wins,
    /// so restarting a running attempt never resets the clock.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read or written.
    pub async fn create(&self, mut stored: StoredSubmission) -> Result<StoredSubmission, StorageError> {
        match self.load(stored.id()).await {
            Ok(Some(existing)) => {
                tracing::info!(submission = %stored.id(), "resuming cached attempt");
                stored.keep_timing_of(&existing);
                stored.merge_progress(existing.submission());
            }
            Ok(None) => {}
            Err(StorageError::Serialization(reason)) => {
                tracing::warn!(submission = %stored.id(), %reason, "replacing corrupted session record");
            }
            Err(err) => return Err(err),
        }
        self.save(&stored).await?;
        Ok(stored)
    }

    /// Read-modify-write of an existing record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no record exists, `Serialization`
    /// if it is corrupted, or backend errors.
    pub async fn update<F>(&self, id: &SubmissionId, apply: F) -> Result<StoredSubmission, StorageError>
    where
        F: FnOnce(&mut StoredSubmission) + Send,
    {
        let mut stored = self.load(id).await?.ok_or(StorageError::NotFound)?;
        apply(&mut stored);
        self.save(&stored).await?;
        Ok(stored)
    }

    /// Fold a server record returned by an item submission into the cache.
    ///
    /// # Errors
    ///
    /// See [`SessionStore::update`].
    pub async fn record_progress(
        &self,
        id: &SubmissionId,
        incoming: &TestSetSubmission,
    ) -> Result<StoredSubmission, StorageError> {
        self.update(id, |stored| stored.merge_progress(incoming)).await
    }

    /// Mark a single item done.
    ///
    /// # Errors
    ///
    /// See [`SessionStore::update`].
    pub async fn mark_completed(
        &self,
        id: &SubmissionId,
        kind: ItemKind,
        item: ItemId,
    ) -> Result<StoredSubmission, StorageError> {
        self.update(id, |stored| stored.mark_completed(kind, item)).await
    }

    /// Timer write-back of `actualDuration`.
    ///
    /// # Errors
    ///
    /// See [`SessionStore::update`].
    pub async fn record_elapsed(
        &self,
        id: &SubmissionId,
        minutes: u32,
    ) -> Result<StoredSubmission, StorageError> {
        self.update(id, |stored| stored.set_elapsed_minutes(minutes))
            .await
    }

    /// Drop the record after a successful final submission.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub async fn clear(&self, id: &SubmissionId) -> Result<(), StorageError> {
        self.kv.remove(&session_key(id)).await
    }

    /// Writes to this attempt's record made by other contexts.
    #[must_use]
    pub fn subscribe(&self, id: &SubmissionId) -> SessionSubscription {
        SessionSubscription {
            key: session_key(id),
            inner: self.kv.subscribe(),
        }
    }
}

/// [`StorageSubscription`] narrowed to one record.
pub struct SessionSubscription {
    key: String,
    inner: StorageSubscription,
}

impl SessionSubscription {
    /// Next foreign write to this record (or a lag notice).
    pub async fn recv(&mut self) -> Option<StorageNotice> {
        loop {
            match self.inner.recv().await? {
                StorageNotice::Changed(event) if event.key != self.key => {}
                notice => return Some(notice),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;
    use testset_core::model::TestSetId;
    use testset_core::time::FIXED_TEST_TIMESTAMP;

    const START_MS: i64 = FIXED_TEST_TIMESTAMP * 1000;

    fn stored(id: &str) -> StoredSubmission {
        StoredSubmission::started(
            TestSetSubmission::new(SubmissionId::new(id), TestSetId::new("ts-1")),
            START_MS,
            30,
        )
    }

    fn store() -> (InMemoryStore, SessionStore) {
        let kv = InMemoryStore::new();
        let sessions = SessionStore::new(Arc::new(kv.clone()));
        (kv, sessions)
    }

    #[test]
    fn key_is_prefixed_submission_id() {
        assert_eq!(
            session_key(&SubmissionId::new("abc")),
            "testset_submission_abc"
        );
    }

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let (_, sessions) = store();
        let mut record = stored("s1");
        record.mark_completed(ItemKind::Quiz, ItemId::new("q1"));
        sessions.save(&record).await.unwrap();

        let loaded = sessions.load(record.id()).await.unwrap().unwrap();
        assert_eq!(loaded.start_time_ms(), Some(START_MS));
        assert_eq!(loaded.submission().completed_quiz_ids, vec![ItemId::new("q1")]);
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn missing_record_is_none() {
        let (_, sessions) = store();
        assert!(sessions.load(&SubmissionId::new("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupted_record_is_serialization_error() {
        let (kv, sessions) = store();
        kv.set("testset_submission_bad", "{not json").await.unwrap();
        let err = sessions.load(&SubmissionId::new("bad")).await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn create_keeps_start_time_of_existing_record() {
        let (_, sessions) = store();
        sessions.create(stored("s1")).await.unwrap();

        let restarted = StoredSubmission::started(
            TestSetSubmission::new(SubmissionId::new("s1"), TestSetId::new("ts-1")),
            START_MS + 5 * 60_000,
            30,
        );
        let kept = sessions.create(restarted).await.unwrap();

        assert_eq!(kept.start_time_ms(), Some(START_MS));
        let loaded = sessions.load(&SubmissionId::new("s1")).await.unwrap().unwrap();
        assert_eq!(loaded.start_time_ms(), Some(START_MS));
    }

    #[tokio::test]
    async fn create_replaces_corrupted_record() {
        let (kv, sessions) = store();
        kv.set("testset_submission_s1", "garbage").await.unwrap();
        let created = sessions.create(stored("s1")).await.unwrap();
        assert_eq!(created.start_time_ms(), Some(START_MS));
        assert!(sessions.load(created.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn record_elapsed_only_touches_actual_duration() {
        let (_, sessions) = store();
        let record = sessions.create(stored("s1")).await.unwrap();

        let updated = sessions.record_elapsed(record.id(), 7).await.unwrap();

        assert_eq!(updated.submission().actual_duration, Some(7));
        assert_eq!(updated.start_time_ms(), record.start_time_ms());
        assert_eq!(updated.duration_minutes(), record.duration_minutes());
    }

    #[tokio::test]
    async fn update_of_missing_record_is_not_found() {
        let (_, sessions) = store();
        let err = sessions
            .record_elapsed(&SubmissionId::new("ghost"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn record_progress_merges_completion_lists() {
        let (_, sessions) = store();
        let record = sessions.create(stored("s1")).await.unwrap();
        let mut server = record.submission().clone();
        server.completed_problem_ids = vec![ItemId::new("p1")];

        let merged = sessions.record_progress(record.id(), &server).await.unwrap();
        assert!(merged.is_completed(ItemKind::Code, &ItemId::new("p1")));
    }

    #[tokio::test]
    async fn clear_removes_record() {
        let (_, sessions) = store();
        let record = sessions.create(stored("s1")).await.unwrap();
        sessions.clear(record.id()).await.unwrap();
        assert!(sessions.load(record.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn subscription_is_scoped_to_one_record() {
        let kv_a = InMemoryStore::new();
        let kv_b = kv_a.attach_context();
        let tab_a = SessionStore::new(Arc::new(kv_a));
        let tab_b = SessionStore::new(Arc::new(kv_b));
        let mut sub = tab_b.subscribe(&SubmissionId::new("s1"));

        tab_a.save(&stored("other")).await.unwrap();
        tab_a.save(&stored("s1")).await.unwrap();

        let Some(StorageNotice::Changed(event)) = sub.recv().await else {
            panic!("expected change notice");
        };
        assert_eq!(event.key, "testset_submission_s1");
    }
}
