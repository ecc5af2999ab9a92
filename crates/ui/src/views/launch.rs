use dioxus::prelude::*;
use dioxus_router::use_navigator;

use services::SessionError;
use testset_core::model::{SubmissionId, TestSetId};

use crate::context::{AppContext, LaunchTarget};
use crate::routes::Route;

#[derive(Clone, Debug, PartialEq)]
enum LaunchState {
    Idle,
    Starting,
    Failed(String),
}

fn start_failure(err: &SessionError) -> String {
    match err {
        SessionError::MissingDuration => "This test set has no duration and cannot be started.".to_string(),
        SessionError::Gateway(inner) => format!("The assessment service rejected the request: {inner}"),
        other => format!("Could not start the test: {other}"),
    }
}

/// Entry page: starts a test set or reopens a cached attempt.
#[component]
pub fn LaunchView() -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let mut test_set_input = use_signal(String::new);
    let mut submission_input = use_signal(String::new);
    let mut state = use_signal(|| LaunchState::Idle);

    let start = {
        let taking = ctx.taking();
        use_callback(move |test_set_id: TestSetId| {
            let taking = taking.clone();
            spawn(async move {
                state.set(LaunchState::Starting);
                match taking.start_test_set(&test_set_id).await {
                    Ok(stored) => {
                        state.set(LaunchState::Idle);
                        let _ = navigator.replace(Route::take(stored.id()));
                    }
                    Err(err) => {
                        tracing::error!(test_set = %test_set_id, error = %err, "could not start test set");
                        state.set(LaunchState::Failed(start_failure(&err)));
                    }
                }
            });
        })
    };

    {
        let ctx = ctx.clone();
        use_effect(move || match ctx.take_launch_target() {
            LaunchTarget::Idle => {}
            LaunchTarget::Resume(submission_id) => {
                let _ = navigator.replace(Route::take(&submission_id));
            }
            LaunchTarget::StartTestSet(test_set_id) => start.call(test_set_id),
        });
    }

    let on_start = move |_| match test_set_input.read().parse::<TestSetId>() {
        Ok(id) => start.call(id),
        Err(_) => state.set(LaunchState::Failed("Enter a test set id.".to_string())),
    };

    let on_resume = move |_| match submission_input.read().parse::<SubmissionId>() {
        Ok(id) => {
            let _ = navigator.push(Route::take(&id));
        }
        Err(_) => state.set(LaunchState::Failed("Enter a submission id.".to_string())),
    };

    let starting = state() == LaunchState::Starting;

    rsx! {
        div { class: "page",
            section { class: "launch",
                h2 { class: "launch-title", "Start an assessment" }
                div { class: "launch-row",
                    input {
                        class: "launch-input",
                        placeholder: "Test set id",
                        value: "{test_set_input.read()}",
                        oninput: move |evt| test_set_input.set(evt.value()),
                    }
                    button {
                        class: "btn launch-start",
                        r#type: "button",
                        disabled: starting,
                        onclick: on_start,
                        if starting { "Starting..." } else { "Start test" }
                    }
                }
                div { class: "launch-row",
                    input {
                        class: "launch-input",
                        placeholder: "Submission id",
                        value: "{submission_input.read()}",
                        oninput: move |evt| submission_input.set(evt.value()),
                    }
                    button {
                        class: "btn launch-resume",
                        r#type: "button",
                        disabled: starting,
                        onclick: on_resume,
                        "Resume"
                    }
                }
                if let LaunchState::Failed(message) = state() {
                    p { class: "launch-error", role: "alert", "{message}" }
                }
            }
        }
    }
}
