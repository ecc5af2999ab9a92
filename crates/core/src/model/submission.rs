use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CandidateId, ItemId, SubmissionId, TestSetId};
use super::item::ItemKind;
use super::lenient;
use crate::countdown::SessionTiming;

//
// ─── SERVER RECORD ────────────────────────────────────────────────────────────
//

/// Server-authoritative record of a candidate's attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSetSubmission {
    #[serde(rename = "_id")]
    pub id: SubmissionId,
    pub test_set_id: TestSetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<CandidateId>,
    #[serde(default, deserialize_with = "lenient::id_list")]
    pub completed_quiz_ids: Vec<ItemId>,
    #[serde(default, deserialize_with = "lenient::id_list")]
    pub completed_problem_ids: Vec<ItemId>,
    #[serde(default)]
    pub total_quiz_score: f64,
    #[serde(default)]
    pub total_passed_coding_problems: u32,
    #[serde(default)]
    pub total_coding_problems: u32,
    #[serde(default)]
    pub final_score: f64,
    #[serde(default)]
    pub submitted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient::minutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub actual_duration: Option<u32>,
}

impl TestSetSubmission {
    /// A fresh, empty attempt.
    #[must_use]
    pub fn new(id: SubmissionId, test_set_id: TestSetId) -> Self {
        Self {
            id,
            test_set_id,
            candidate_id: None,
            completed_quiz_ids: Vec::new(),
            completed_problem_ids: Vec::new(),
            total_quiz_score: 0.0,
            total_passed_coding_problems: 0,
            total_coding_problems: 0,
            final_score: 0.0,
            submitted: false,
            started_at: None,
            end_at: None,
            actual_duration: None,
        }
    }

    #[must_use]
    pub fn completed_ids(&self, kind: ItemKind) -> &[ItemId] {
        match kind {
            ItemKind::Quiz => &self.completed_quiz_ids,
            ItemKind::Code => &self.completed_problem_ids,
        }
    }

    #[must_use]
    pub fn is_completed(&self, kind: ItemKind, id: &ItemId) -> bool {
        self.completed_ids(kind).contains(id)
    }
}

//
// ─── CLIENT CACHE ─────────────────────────────────────────────────────────────
//

/// Client-local copy of an attempt plus the timing needed to resume it.
///
/// `start_time` is written once when the attempt starts and never changes
/// afterwards; only completion lists, scores and `actual_duration` move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSubmission {
    #[serde(flatten)]
    submission: TestSetSubmission,
    #[serde(
        default,
        deserialize_with = "lenient::epoch_millis",
        skip_serializing_if = "Option::is_none"
    )]
    start_time: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient::minutes",
        skip_serializing_if = "Option::is_none"
    )]
    duration: Option<u32>,
}

impl StoredSubmission {
    /// Record for an attempt that started at `start_time_ms` with
    /// `duration_minutes` allotted.
    #[must_use]
    pub fn started(submission: TestSetSubmission, start_time_ms: i64, duration_minutes: u32) -> Self {
        Self {
            submission,
            start_time: Some(start_time_ms),
            duration: Some(duration_minutes),
        }
    }

    #[must_use]
    pub fn submission(&self) -> &TestSetSubmission {
        &self.submission
    }

    #[must_use]
    pub fn id(&self) -> &SubmissionId {
        &self.submission.id
    }

    #[must_use]
    pub fn start_time_ms(&self) -> Option<i64> {
        self.start_time
    }

    #[must_use]
    pub fn duration_minutes(&self) -> Option<u32> {
        self.duration
    }

    /// Timing for the countdown, or `None` while either value is missing.
    #[must_use]
    pub fn timing(&self) -> Option<SessionTiming> {
        Some(SessionTiming::new(self.start_time?, self.duration?))
    }

    #[must_use]
    pub fn is_completed(&self, kind: ItemKind, id: &ItemId) -> bool {
        self.submission.is_completed(kind, id)
    }

    /// Keeps the timing of an earlier record for the same attempt.
    ///
    /// Used when a start call returns an attempt that is already cached, so a
    /// resume never resets the clock.
    pub fn keep_timing_of(&mut self, earlier: &StoredSubmission) {
        if earlier.start_time.is_some() {
            self.start_time = earlier.start_time;
        }
        if earlier.duration.is_some() {
            self.duration = earlier.duration;
        }
    }

    /// Folds an updated server record into this cache entry.
    ///
    /// Completion lists become the union of both (existing order first),
    /// scores and flags follow `incoming`, and timing is left untouched.
    pub fn merge_progress(&mut self, incoming: &TestSetSubmission) {
        let current = &mut self.submission;
        current.completed_quiz_ids =
            union_ids(&current.completed_quiz_ids, &incoming.completed_quiz_ids);
        current.completed_problem_ids =
            union_ids(&current.completed_problem_ids, &incoming.completed_problem_ids);
        current.total_quiz_score = incoming.total_quiz_score;
        current.total_passed_coding_problems = incoming.total_passed_coding_problems;
        current.total_coding_problems = incoming.total_coding_problems;
        current.final_score = incoming.final_score;
        current.submitted = current.submitted || incoming.submitted;
        if incoming.end_at.is_some() {
            current.end_at = incoming.end_at;
        }
        if incoming.actual_duration.is_some() {
            current.actual_duration = incoming.actual_duration;
        }
    }

    /// Marks one item as done without a server record (used by item pages
    /// whose submit response omits the lists).
    pub fn mark_completed(&mut self, kind: ItemKind, id: ItemId) {
        let list = match kind {
            ItemKind::Quiz => &mut self.submission.completed_quiz_ids,
            ItemKind::Code => &mut self.submission.completed_problem_ids,
        };
        if !list.contains(&id) {
            list.push(id);
        }
    }

    pub fn set_elapsed_minutes(&mut self, minutes: u32) {
        self.submission.actual_duration = Some(minutes);
    }
}

fn union_ids(existing: &[ItemId], incoming: &[ItemId]) -> Vec<ItemId> {
    let mut merged: Vec<ItemId> = Vec::with_capacity(existing.len() + incoming.len());
    for id in existing.iter().chain(incoming) {
        if !merged.contains(id) {
            merged.push(id.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FIXED_TEST_TIMESTAMP;

    const START_MS: i64 = FIXED_TEST_TIMESTAMP * 1000;

    fn submission() -> TestSetSubmission {
        let mut sub = TestSetSubmission::new(SubmissionId::new("sub-1"), TestSetId::new("ts-1"));
        sub.completed_quiz_ids = vec![ItemId::new("q1")];
        sub
    }

    #[test]
    fn stored_submission_roundtrips_through_json() {
        let stored = StoredSubmission::started(submission(), START_MS, 45);
        let json = serde_json::to_string(&stored).unwrap();
        let back: StoredSubmission = serde_json::from_str(&json).unwrap();

        assert_eq!(back, stored);
        assert_eq!(back.start_time_ms(), Some(START_MS));
        assert_eq!(back.submission().completed_quiz_ids, vec![ItemId::new("q1")]);
    }

    #[test]
    fn stored_submission_uses_wire_field_names() {
        let stored = StoredSubmission::started(submission(), START_MS, 45);
        let value = serde_json::to_value(&stored).unwrap();

        assert_eq!(value["_id"], "sub-1");
        assert_eq!(value["testSetId"], "ts-1");
        assert_eq!(value["completedQuizIds"][0], "q1");
        assert_eq!(value["startTime"], START_MS);
        assert_eq!(value["duration"], 45);
        assert_eq!(value["submitted"], false);
    }

    #[test]
    fn malformed_timing_decodes_as_missing() {
        let raw = r#"{
            "_id": "sub-1",
            "testSetId": "ts-1",
            "completedQuizIds": [],
            "completedProblemIds": [],
            "startTime": "not a number",
            "duration": null
        }"#;
        let stored: StoredSubmission = serde_json::from_str(raw).unwrap();
        assert_eq!(stored.start_time_ms(), None);
        assert_eq!(stored.timing(), None);
    }

    #[test]
    fn float_and_string_numbers_are_accepted() {
        let raw = r#"{
            "_id": "sub-1",
            "testSetId": "ts-1",
            "startTime": 1700000000000.7,
            "duration": "30",
            "actualDuration": 4.9
        }"#;
        let stored: StoredSubmission = serde_json::from_str(raw).unwrap();
        assert_eq!(stored.timing(), Some(SessionTiming::new(START_MS, 30)));
        assert_eq!(stored.submission().actual_duration, Some(4));
    }

    #[test]
    fn completion_lists_accept_string_or_null() {
        let raw = r#"{
            "_id": "sub-1",
            "testSetId": "ts-1",
            "completedQuizIds": "q7",
            "completedProblemIds": null
        }"#;
        let sub: TestSetSubmission = serde_json::from_str(raw).unwrap();
        assert_eq!(sub.completed_quiz_ids, vec![ItemId::new("q7")]);
        assert!(sub.completed_problem_ids.is_empty());

        let empty: TestSetSubmission =
            serde_json::from_str(r#"{"_id":"s","testSetId":"t","completedQuizIds":""}"#).unwrap();
        assert!(empty.completed_quiz_ids.is_empty());
    }

    #[test]
    fn merge_progress_unions_lists_and_keeps_timing() {
        let mut stored = StoredSubmission::started(submission(), START_MS, 45);
        let mut incoming = submission();
        incoming.completed_quiz_ids = vec![ItemId::new("q2")];
        incoming.completed_problem_ids = vec![ItemId::new("p1")];
        incoming.total_quiz_score = 7.5;

        stored.merge_progress(&incoming);

        assert_eq!(
            stored.submission().completed_quiz_ids,
            vec![ItemId::new("q1"), ItemId::new("q2")]
        );
        assert_eq!(stored.submission().completed_problem_ids, vec![ItemId::new("p1")]);
        assert!((stored.submission().total_quiz_score - 7.5).abs() < f64::EPSILON);
        assert_eq!(stored.start_time_ms(), Some(START_MS));
        assert_eq!(stored.duration_minutes(), Some(45));
    }

    #[test]
    fn keep_timing_of_prefers_earlier_start() {
        let earlier = StoredSubmission::started(submission(), START_MS, 45);
        let mut later = StoredSubmission::started(submission(), START_MS + 600_000, 45);
        later.keep_timing_of(&earlier);
        assert_eq!(later.start_time_ms(), Some(START_MS));
    }

    #[test]
    fn mark_completed_is_idempotent() {
        let mut stored = StoredSubmission::started(submission(), START_MS, 45);
        stored.mark_completed(ItemKind::Code, ItemId::new("p1"));
        stored.mark_completed(ItemKind::Code, ItemId::new("p1"));
        assert_eq!(stored.submission().completed_problem_ids, vec![ItemId::new("p1")]);
        assert!(stored.is_completed(ItemKind::Code, &ItemId::new("p1")));
    }
}
