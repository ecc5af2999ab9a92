use services::SessionSnapshot;
use testset_core::model::{ItemId, ItemMeta, ItemStatus};
use testset_core::{SessionPhase, format_remaining};

use crate::vm::time_fmt::format_minutes;

/// Countdown at or below this many seconds is highlighted.
const URGENT_SECS: u64 = 5 * 60;

#[derive(Clone, Debug, PartialEq)]
pub struct ItemCardVm {
    pub id: ItemId,
    pub title: String,
    pub kind_label: &'static str,
    pub meta_label: String,
    pub completed: bool,
    pub clickable: bool,
}

impl ItemCardVm {
    #[must_use]
    pub fn from_status(item: &ItemStatus, running: bool) -> Self {
        let meta_label = match item.meta {
            ItemMeta::Quiz {
                question_count,
                duration,
            } => {
                let questions = if question_count == 1 {
                    "1 question".to_string()
                } else {
                    format!("{question_count} questions")
                };
                match duration {
                    Some(minutes) => format!("{questions} · {}", format_minutes(minutes)),
                    None => questions,
                }
            }
            ItemMeta::Code { difficulty } => difficulty
                .map(|difficulty| difficulty.label().to_string())
                .unwrap_or_default(),
        };

        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            kind_label: item.kind.label(),
            meta_label,
            completed: item.completed,
            clickable: running && !item.completed,
        }
    }
}

#[must_use]
pub fn map_item_cards(items: &[ItemStatus], running: bool) -> Vec<ItemCardVm> {
    items
        .iter()
        .map(|item| ItemCardVm::from_status(item, running))
        .collect()
}

/// Everything the taking page renders, already formatted.
#[derive(Clone, Debug, PartialEq)]
pub struct TestSetVm {
    pub title: String,
    pub timer_label: String,
    pub timer_urgent: bool,
    pub progress_label: String,
    pub percent_label: String,
    pub percent: f64,
    pub items: Vec<ItemCardVm>,
    pub all_completed: bool,
    pub can_submit: bool,
    pub submitting: bool,
    pub invalid: bool,
    pub error: Option<String>,
}

impl TestSetVm {
    #[must_use]
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let progress = snapshot.progress;
        let percent = progress.percent();
        Self {
            title: snapshot.title.clone(),
            timer_label: format_remaining(snapshot.remaining),
            timer_urgent: snapshot
                .remaining
                .is_some_and(|remaining| remaining <= URGENT_SECS),
            progress_label: format!("{} / {} completed", progress.completed, progress.total),
            percent_label: format!("{percent:.0}%"),
            percent,
            items: map_item_cards(&snapshot.items, snapshot.phase.is_running()),
            all_completed: progress.all_completed(),
            can_submit: snapshot.can_submit(),
            submitting: snapshot.phase == SessionPhase::Submitting,
            invalid: snapshot.phase == SessionPhase::Invalid,
            error: snapshot.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use services::Progress;
    use testset_core::model::{Difficulty, ItemKind, SubmissionId};

    fn item(id: &str, kind: ItemKind, completed: bool) -> ItemStatus {
        let meta = match kind {
            ItemKind::Quiz => ItemMeta::Quiz {
                question_count: 12,
                duration: Some(15),
            },
            ItemKind::Code => ItemMeta::Code {
                difficulty: Some(Difficulty::Hard),
            },
        };
        ItemStatus {
            id: ItemId::new(id),
            kind,
            title: format!("Item {id}"),
            completed,
            meta,
        }
    }

    fn snapshot(phase: SessionPhase, remaining: Option<u64>, done: [bool; 3]) -> SessionSnapshot {
        let items = vec![
            item("q1", ItemKind::Quiz, done[0]),
            item("q2", ItemKind::Quiz, done[1]),
            item("p1", ItemKind::Code, done[2]),
        ];
        SessionSnapshot {
            submission_id: SubmissionId::new("sub-1"),
            title: "Screening".into(),
            phase,
            remaining,
            progress: Progress::from_items(&items),
            items,
            final_result: None,
            last_error: None,
        }
    }

    #[test]
    fn labels_follow_progress_and_timer() {
        let vm = TestSetVm::from_snapshot(&snapshot(
            SessionPhase::Active,
            Some(25 * 60 + 7),
            [true, false, false],
        ));
        assert_eq!(vm.timer_label, "25:07");
        assert!(!vm.timer_urgent);
        assert_eq!(vm.progress_label, "1 / 3 completed");
        assert_eq!(vm.percent_label, "33%");
        assert!(!vm.all_completed);
        assert!(!vm.can_submit);
    }

    #[test]
    fn missing_timing_renders_zero_clock() {
        let vm = TestSetVm::from_snapshot(&snapshot(SessionPhase::Active, None, [false; 3]));
        assert_eq!(vm.timer_label, "00:00");
        assert!(!vm.timer_urgent);
    }

    #[test]
    fn all_completed_unlocks_submit() {
        let vm = TestSetVm::from_snapshot(&snapshot(
            SessionPhase::AllCompleted,
            Some(200),
            [true; 3],
        ));
        assert!(vm.all_completed);
        assert!(vm.can_submit);
        assert!(vm.timer_urgent);
        assert_eq!(vm.percent_label, "100%");
        assert!(vm.items.iter().all(|card| !card.clickable));
    }

    #[test]
    fn item_cards_describe_kind_and_meta() {
        let cards = map_item_cards(
            &[item("q1", ItemKind::Quiz, false), item("p1", ItemKind::Code, true)],
            true,
        );
        assert_eq!(cards[0].kind_label, "Quiz");
        assert_eq!(cards[0].meta_label, "12 questions · 15 min");
        assert!(cards[0].clickable);
        assert_eq!(cards[1].kind_label, "Coding");
        assert_eq!(cards[1].meta_label, "Hard");
        assert!(!cards[1].clickable);
    }

    #[test]
    fn submitting_locks_items() {
        let vm = TestSetVm::from_snapshot(&snapshot(SessionPhase::Submitting, Some(0), [false; 3]));
        assert!(vm.submitting);
        assert!(vm.items.iter().all(|card| !card.clickable));
    }
}
