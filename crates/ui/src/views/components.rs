use dioxus::prelude::*;
use dioxus_router::Link;

use testset_core::model::ItemId;

use crate::routes::Route;
use crate::vm::{CompletionVm, ItemCardVm, TestSetVm};

#[component]
pub fn TimerBadge(label: String, urgent: bool) -> Element {
    let class = if urgent { "timer timer--urgent" } else { "timer" };
    rsx! {
        div { class: "{class}", role: "timer",
            span { class: "timer__label", "Time left" }
            span { class: "timer__value", id: "testset-timer", "{label}" }
        }
    }
}

#[component]
pub fn ProgressSummary(label: String, percent_label: String, percent: f64) -> Element {
    rsx! {
        div { class: "progress",
            div { class: "progress__track",
                div { class: "progress__fill", style: "width: {percent:.1}%" }
            }
            p { class: "progress__label", "{label} · {percent_label}" }
        }
    }
}

#[component]
pub fn ItemCard(card: ItemCardVm, on_open: EventHandler<ItemId>) -> Element {
    let class = if card.completed {
        "item-card item-card--done"
    } else {
        "item-card"
    };
    let status = if card.completed { "Completed" } else { "Open" };
    let id = card.id.clone();
    rsx! {
        li { class: "{class}",
            button {
                class: "item-card__button",
                r#type: "button",
                disabled: !card.clickable,
                onclick: move |_| on_open.call(id.clone()),
                span { class: "item-card__kind", "{card.kind_label}" }
                span { class: "item-card__title", "{card.title}" }
                if !card.meta_label.is_empty() {
                    span { class: "item-card__meta", "{card.meta_label}" }
                }
                span { class: "item-card__status", "{status}" }
            }
        }
    }
}

#[component]
pub fn InvalidSession(message: Option<String>) -> Element {
    rsx! {
        section { class: "invalid-session", role: "alert",
            h2 { "This test cannot be opened" }
            if let Some(message) = message {
                p { "{message}" }
            }
            Link { to: Route::Launch {}, "Back to start" }
        }
    }
}

#[component]
pub fn TakingPanel(vm: TestSetVm, on_open: EventHandler<ItemId>, on_submit: EventHandler<()>) -> Element {
    if vm.invalid {
        return rsx! {
            InvalidSession { message: vm.error.clone() }
        };
    }
    let submit_label = if vm.submitting { "Submitting..." } else { "Submit test" };

    rsx! {
        section { class: "taking", id: "testset-root",
            div { class: "taking__header",
                h2 { "{vm.title}" }
                TimerBadge { label: vm.timer_label.clone(), urgent: vm.timer_urgent }
            }
            ProgressSummary {
                label: vm.progress_label.clone(),
                percent_label: vm.percent_label.clone(),
                percent: vm.percent,
            }
            if vm.all_completed {
                div { class: "banner banner--success", role: "status",
                    "All items completed. Submit the test when you are ready."
                }
            }
            if let Some(error) = vm.error.clone() {
                p { class: "banner banner--error", role: "alert", "Submission failed: {error}" }
            }
            ul { class: "item-list",
                for card in vm.items.iter().cloned() {
                    ItemCard { key: "{card.id}", card, on_open }
                }
            }
            div { class: "taking__actions",
                button {
                    class: "primary",
                    id: "testset-submit",
                    r#type: "button",
                    disabled: !vm.can_submit || vm.submitting,
                    onclick: move |_| on_submit.call(()),
                    "{submit_label}"
                }
            }
        }
    }
}

#[component]
pub fn CompletionPanel(vm: CompletionVm) -> Element {
    rsx! {
        section { class: "completion",
            p { class: "completion__score", "Final score: {vm.final_score_label}" }
            ul { class: "completion__details",
                li { "Quiz score: {vm.quiz_score_label}" }
                li { "{vm.coding_label}" }
                if let Some(time_used) = vm.time_used.clone() {
                    li { "Time used: {time_used}" }
                }
                if let Some(finished_at) = vm.finished_at.clone() {
                    li { "Finished: {finished_at}" }
                }
            }
        }
    }
}
