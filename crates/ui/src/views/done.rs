use dioxus::prelude::*;
use dioxus_router::Link;

use testset_core::model::SubmissionId;

use super::components::CompletionPanel;
use crate::context::AppContext;
use crate::routes::Route;
use crate::vm::CompletionVm;

#[component]
pub fn DoneView(submission_id: String) -> Element {
    let ctx = use_context::<AppContext>();
    let result = submission_id
        .parse::<SubmissionId>()
        .ok()
        .and_then(|id| ctx.result_for(&id));

    rsx! {
        div { class: "page",
            section { class: "done",
                h2 { class: "done-title", "Test submitted" }
                match result {
                    Some(result) => rsx! {
                        CompletionPanel { vm: CompletionVm::from(&result) }
                    },
                    None => rsx! {
                        p { class: "done-note", "Your answers were submitted." }
                    },
                }
                Link { class: "btn done-home", to: Route::Launch {}, "Back to start" }
            }
        }
    }
}
