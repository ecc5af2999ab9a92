use dioxus::prelude::*;
use dioxus_router::{Link, use_navigator};

use services::SessionError;
use testset_core::model::{ItemId, SubmissionId};

use crate::context::AppContext;
use crate::routes::{ItemQuery, Route};
use crate::vm::{CODE_LANGUAGES, code_submission, parse_quiz_answers};

#[derive(Clone, Debug, PartialEq)]
enum SubmitState {
    Idle,
    Sending,
    Failed(String),
}

fn failure_message(err: &SessionError) -> String {
    match err {
        SessionError::NotStarted => {
            "This attempt is not cached on this device. Reopen the test from the start page.".to_string()
        }
        other => format!("Could not submit: {other}"),
    }
}

/// Both ids or `None` when the URL is missing one.
fn item_ids(item_id: &str, query: &ItemQuery) -> Option<(SubmissionId, ItemId)> {
    Some((query.submission_id.parse().ok()?, item_id.parse().ok()?))
}

#[component]
fn ItemFrame(title: String, back: Route, state: SubmitState, children: Element) -> Element {
    rsx! {
        section { class: "item-page",
            header { class: "item-header",
                Link { class: "item-back", to: back, "Back to test" }
                h2 { class: "item-title", "{title}" }
            }
            {children}
            if let SubmitState::Failed(message) = state {
                p { class: "item-error", role: "alert", "{message}" }
            }
        }
    }
}

#[component]
pub fn QuizItemView(item_id: String, query: ItemQuery) -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let mut answers = use_signal(String::new);
    let mut state = use_signal(|| SubmitState::Idle);
    let back = query.return_route();

    let on_submit = {
        let taking = ctx.taking();
        let item_id = item_id.clone();
        let query = query.clone();
        use_callback(move |_| {
            let Some((submission_id, quiz_id)) = item_ids(&item_id, &query) else {
                state.set(SubmitState::Failed("This link is missing the attempt id.".to_string()));
                return;
            };
            let parsed = match parse_quiz_answers(&answers()) {
                Ok(parsed) => parsed,
                Err(err) => {
                    state.set(SubmitState::Failed(err.to_string()));
                    return;
                }
            };
            let taking = taking.clone();
            let back = query.return_route();
            spawn(async move {
                state.set(SubmitState::Sending);
                match taking.submit_quiz_item(&submission_id, &quiz_id, &parsed).await {
                    Ok(_) => {
                        let _ = navigator.push(back);
                    }
                    Err(err) => {
                        tracing::error!(submission = %submission_id, quiz = %quiz_id, error = %err, "quiz submit failed");
                        state.set(SubmitState::Failed(failure_message(&err)));
                    }
                }
            });
        })
    };

    let sending = state() == SubmitState::Sending;

    rsx! {
        div { class: "page",
            ItemFrame { title: "Quiz".to_string(), back, state: state(),
                div { class: "item-form",
                    label { class: "item-label", r#for: "quiz-answers",
                        "One answer per line as question: choice, choice"
                    }
                    textarea {
                        id: "quiz-answers",
                        class: "item-input",
                        rows: 8,
                        placeholder: "q1: b\nq2: a, c",
                        value: "{answers.read()}",
                        oninput: move |evt| answers.set(evt.value()),
                    }
                    button {
                        class: "btn item-submit",
                        r#type: "button",
                        disabled: sending || answers.read().trim().is_empty(),
                        onclick: move |_| on_submit.call(()),
                        if sending { "Submitting..." } else { "Submit quiz" }
                    }
                }
            }
        }
    }
}

#[component]
pub fn CodeItemView(item_id: String, query: ItemQuery) -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let mut language = use_signal(|| CODE_LANGUAGES[0].0.to_string());
    let mut source = use_signal(String::new);
    let mut state = use_signal(|| SubmitState::Idle);
    let back = query.return_route();

    let on_submit = {
        let taking = ctx.taking();
        let item_id = item_id.clone();
        let query = query.clone();
        use_callback(move |_| {
            let Some((submission_id, problem_id)) = item_ids(&item_id, &query) else {
                state.set(SubmitState::Failed("This link is missing the attempt id.".to_string()));
                return;
            };
            let Some(submission) = code_submission(&language(), &source()) else {
                return;
            };
            let taking = taking.clone();
            let back = query.return_route();
            spawn(async move {
                state.set(SubmitState::Sending);
                match taking
                    .submit_code_item(&submission_id, &problem_id, &submission)
                    .await
                {
                    Ok(_) => {
                        let _ = navigator.push(back);
                    }
                    Err(err) => {
                        tracing::error!(submission = %submission_id, problem = %problem_id, error = %err, "code submit failed");
                        state.set(SubmitState::Failed(failure_message(&err)));
                    }
                }
            });
        })
    };

    let sending = state() == SubmitState::Sending;

    rsx! {
        div { class: "page",
            ItemFrame { title: "Coding problem".to_string(), back, state: state(),
                div { class: "item-form",
                    label { class: "item-label", r#for: "code-language", "Language" }
                    select {
                        id: "code-language",
                        class: "item-select",
                        value: "{language.read()}",
                        onchange: move |evt| language.set(evt.value()),
                        for (value, label) in CODE_LANGUAGES.iter().copied() {
                            option { value, selected: *language.read() == value, "{label}" }
                        }
                    }
                    textarea {
                        class: "item-input item-code",
                        rows: 16,
                        spellcheck: false,
                        value: "{source.read()}",
                        oninput: move |evt| source.set(evt.value()),
                    }
                    button {
                        class: "btn item-submit",
                        r#type: "button",
                        disabled: sending || source.read().trim().is_empty(),
                        onclick: move |_| on_submit.call(()),
                        if sending { "Submitting..." } else { "Submit solution" }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_ids_need_both_values() {
        let query = ItemQuery {
            submission_id: "sub-1".into(),
            return_url: String::new(),
        };
        let (submission, item) = item_ids("q1", &query).unwrap();
        assert_eq!(submission.as_str(), "sub-1");
        assert_eq!(item.as_str(), "q1");

        assert!(item_ids("q1", &ItemQuery::default()).is_none());
        assert!(item_ids(" ", &query).is_none());
    }

    #[test]
    fn not_started_gets_a_hint() {
        assert!(failure_message(&SessionError::NotStarted).contains("not cached"));
        assert!(failure_message(&SessionError::MissingDuration).starts_with("Could not submit"));
    }
}
