use std::sync::Arc;

use dioxus::document::eval;
use dioxus::prelude::*;
use dioxus_router::use_navigator;
use tokio::sync::{mpsc, watch};

use services::{ItemClick, ItemLink, RunnerCommand, RunnerHandle, SessionRunner, SessionSnapshot};
use testset_core::SessionPhase;
use testset_core::model::{ItemId, SubmissionId};

use super::components::{InvalidSession, TakingPanel};
use super::scripts::PAGE_EVENTS_SCRIPT;
use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::TestSetVm;

type CommandSender = mpsc::UnboundedSender<RunnerCommand>;

async fn forward_snapshots(
    mut snapshots: watch::Receiver<SessionSnapshot>,
    mut target: Signal<Option<SessionSnapshot>>,
) {
    target.set(Some(snapshots.borrow_and_update().clone()));
    while snapshots.changed().await.is_ok() {
        let next = snapshots.borrow_and_update().clone();
        target.set(Some(next));
    }
}

async fn forward_page_events(commands: CommandSender) {
    let mut events = eval(PAGE_EVENTS_SCRIPT);
    while let Ok(event) = events.recv::<String>().await {
        let command = match event.as_str() {
            "focus" => RunnerCommand::FocusRegained,
            "visible" => RunnerCommand::VisibilityChanged { visible: true },
            "hidden" => RunnerCommand::VisibilityChanged { visible: false },
            _ => continue,
        };
        if commands.send(command).is_err() {
            break;
        }
    }
}

#[component]
pub fn TakingView(submission_id: String) -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let taking = ctx.taking();
    let snapshot = use_signal(|| None::<SessionSnapshot>);
    // The runner stops once every command sender is gone, which happens when
    // this page unmounts.
    let commands = use_signal(|| None::<CommandSender>);

    let runner = {
        let taking = Arc::clone(&taking);
        let submission_id = submission_id.clone();
        use_resource(move || {
            let taking = Arc::clone(&taking);
            let submission_id = submission_id.clone();
            async move {
                let mut commands = commands;
                let id: SubmissionId = submission_id
                    .parse()
                    .map_err(|_| ViewError::InvalidSession)?;
                let session = taking.open_session(&id).await.map_err(|err| {
                    tracing::error!(submission = %id, error = %err, "could not open test session");
                    ViewError::Unavailable
                })?;
                let handle: Arc<RunnerHandle> = Arc::new(SessionRunner::new(taking, session).spawn());
                commands.set(Some(handle.commands()));
                spawn(forward_snapshots(handle.snapshots(), snapshot));
                spawn(forward_page_events(handle.commands()));
                Ok::<_, ViewError>(handle)
            }
        })
    };

    {
        let ctx = ctx.clone();
        use_effect(move || {
            let current = snapshot.read();
            let Some(current) = current.as_ref() else {
                return;
            };
            if current.phase != SessionPhase::Submitted {
                return;
            }
            if let Some(result) = current.final_result.clone() {
                ctx.record_result(result);
            }
            let _ = navigator.replace(Route::Done {
                submission_id: current.submission_id.to_string(),
            });
        });
    }

    let on_open = {
        let taking = Arc::clone(&taking);
        move |item_id: ItemId| {
            let Some(current) = snapshot.cloned() else {
                return;
            };
            let return_url = Route::take(&current.submission_id).to_string();
            match current.click_item(taking.navigator(), &item_id, &return_url) {
                Ok(ItemClick::Navigate(url)) => match ItemLink::parse(&url) {
                    Ok(link) => {
                        let _ = navigator.push(Route::from(link));
                    }
                    Err(err) => tracing::warn!(error = %err, "item link did not parse"),
                },
                Ok(ItemClick::AlreadyCompleted | ItemClick::Locked) => {}
                Err(err) => tracing::warn!(item = %item_id, error = %err, "item click rejected"),
            }
        }
    };

    let on_submit = move |()| {
        if let Some(sender) = commands.peek().as_ref() {
            let _ = sender.send(RunnerCommand::SubmitClicked);
        }
    };

    let state = view_state_from_resource(runner);

    rsx! {
        div { class: "page",
            match state {
                ViewState::Idle | ViewState::Loading => rsx! {
                    p { class: "loading", "Loading test..." }
                },
                ViewState::Error(err) => rsx! {
                    InvalidSession { message: Some(err.message().to_string()) }
                },
                ViewState::Ready(_) => match snapshot.read().as_ref() {
                    Some(current) => rsx! {
                        TakingPanel {
                            vm: TestSetVm::from_snapshot(current),
                            on_open,
                            on_submit,
                        }
                    },
                    None => rsx! {
                        p { class: "loading", "Loading test..." }
                    },
                },
            }
        }
    }
}
