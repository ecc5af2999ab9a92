use dioxus::prelude::*;

use services::{Progress, SessionSnapshot};
use testset_core::SessionPhase;
use testset_core::model::{ItemId, ItemKind, ItemMeta, ItemStatus, SubmissionId, TestSetId, TestSetSubmission};

use super::components::{CompletionPanel, TakingPanel};
use super::test_harness::{ViewKind, setup_view_harness, test_context};
use crate::routes::ItemQuery;
use crate::vm::{CompletionVm, TestSetVm};

fn snapshot(phase: SessionPhase, completed: [bool; 2]) -> SessionSnapshot {
    let items = vec![
        ItemStatus {
            id: ItemId::new("q1"),
            kind: ItemKind::Quiz,
            title: "Ownership basics".into(),
            completed: completed[0],
            meta: ItemMeta::Quiz {
                question_count: 5,
                duration: Some(10),
            },
        },
        ItemStatus {
            id: ItemId::new("p1"),
            kind: ItemKind::Code,
            title: "Merge intervals".into(),
            completed: completed[1],
            meta: ItemMeta::Code { difficulty: None },
        },
    ];
    SessionSnapshot {
        submission_id: SubmissionId::new("sub-1"),
        title: "Backend screening".into(),
        phase,
        remaining: Some(19 * 60 + 5),
        progress: Progress::from_items(&items),
        items,
        final_result: None,
        last_error: None,
    }
}

fn render_panel(vm: TestSetVm) -> String {
    // Event handlers must be created inside a Dioxus runtime, so build the
    // panel from a root component rather than a free-standing `rsx!`.
    fn panel_app(vm: TestSetVm) -> Element {
        rsx! {
            TakingPanel { vm, on_open: move |_| {}, on_submit: move |()| {} }
        }
    }
    let mut dom = VirtualDom::new_with_props(panel_app, vm);
    dom.rebuild_in_place();
    dioxus_ssr::render(&dom)
}

#[test]
fn taking_panel_renders_timer_progress_and_items() {
    let html = render_panel(TestSetVm::from_snapshot(&snapshot(
        SessionPhase::Active,
        [true, false],
    )));

    assert!(html.contains("Backend screening"), "missing title in {html}");
    assert!(html.contains("19:05"), "missing countdown in {html}");
    assert!(html.contains("1 / 2 completed"), "missing progress in {html}");
    assert!(html.contains("Ownership basics"), "missing quiz in {html}");
    assert!(html.contains("Merge intervals"), "missing problem in {html}");
    assert!(html.contains("Completed"), "missing completed status in {html}");
    assert!(!html.contains("All items completed"), "banner shown early in {html}");
}

#[test]
fn taking_panel_announces_all_completed() {
    let html = render_panel(TestSetVm::from_snapshot(&snapshot(
        SessionPhase::AllCompleted,
        [true, true],
    )));
    assert!(
        html.contains("All items completed. Submit the test when you are ready."),
        "missing banner in {html}"
    );
    assert!(html.contains("Submit test"), "missing submit button in {html}");
    assert!(html.contains("100%"), "missing percent in {html}");
}

#[test]
fn taking_panel_shows_failed_submission() {
    let mut snap = snapshot(SessionPhase::Active, [true, true]);
    snap.remaining = Some(0);
    snap.last_error = Some("service unavailable".into());
    let html = render_panel(TestSetVm::from_snapshot(&snap));
    assert!(
        html.contains("Submission failed: service unavailable"),
        "missing error banner in {html}"
    );
    assert!(html.contains("00:00"), "missing zero clock in {html}");
}

#[test]
fn taking_panel_while_submitting() {
    let html = render_panel(TestSetVm::from_snapshot(&snapshot(
        SessionPhase::Submitting,
        [true, true],
    )));
    assert!(html.contains("Submitting..."), "missing submitting label in {html}");
    assert!(html.contains("disabled"), "submit not disabled in {html}");
}

#[test]
fn completion_panel_renders_scores() {
    let mut result = TestSetSubmission::new(SubmissionId::new("sub-1"), TestSetId::new("ts-1"));
    result.final_score = 91.0;
    result.total_quiz_score = 45.5;
    result.total_passed_coding_problems = 1;
    result.total_coding_problems = 2;
    result.actual_duration = Some(22);
    let vm = CompletionVm::from(&result);

    let html = dioxus_ssr::render_element(rsx! { CompletionPanel { vm } });
    assert!(html.contains("Final score: 91"), "missing final score in {html}");
    assert!(html.contains("Quiz score: 45.5"), "missing quiz score in {html}");
    assert!(html.contains("1 / 2 problems passed"), "missing coding in {html}");
    assert!(html.contains("Time used: 22 min"), "missing time in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn done_view_smoke_renders_recorded_result() {
    let ctx = test_context();
    let mut result = TestSetSubmission::new(SubmissionId::new("sub-1"), TestSetId::new("ts-1"));
    result.submitted = true;
    result.final_score = 82.5;
    ctx.record_result(result);

    let mut harness = setup_view_harness(ViewKind::Done("sub-1".into()), ctx);
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("Test submitted"), "missing title in {html}");
    assert!(html.contains("Final score: 82.5"), "missing score in {html}");
    assert!(html.contains("Back to start"), "missing home link in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn done_view_smoke_without_result() {
    let mut harness = setup_view_harness(ViewKind::Done("sub-9".into()), test_context());
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("Your answers were submitted."), "missing note in {html}");
    assert!(!html.contains("Final score"), "unexpected score in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn launch_view_smoke_renders_form() {
    let mut harness = setup_view_harness(ViewKind::Launch, test_context());
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("Start an assessment"), "missing title in {html}");
    assert!(html.contains("Start test"), "missing start button in {html}");
    assert!(html.contains("Resume"), "missing resume button in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn quiz_item_view_smoke_renders_form() {
    let query = ItemQuery {
        submission_id: "sub-1".into(),
        return_url: "/testset/take/sub-1".into(),
    };
    let mut harness = setup_view_harness(
        ViewKind::Quiz {
            item_id: "q1".into(),
            query,
        },
        test_context(),
    );
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("Submit quiz"), "missing submit in {html}");
    assert!(html.contains("Back to test"), "missing back link in {html}");
}
