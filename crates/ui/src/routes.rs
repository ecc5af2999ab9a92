use std::fmt;

use dioxus::prelude::*;
use dioxus_router::{Outlet, Routable};
use url::form_urlencoded;

use services::ItemLink;
use testset_core::model::ItemKind;

use crate::views::{CodeItemView, DoneView, LaunchView, QuizItemView, TakingView};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", LaunchView)] Launch {},
        #[route("/testset/take/:submission_id", TakingView)] Take { submission_id: String },
        #[route("/testset/quiz/:item_id?:..query", QuizItemView)] QuizItem { item_id: String, query: ItemQuery },
        #[route("/testset/code/:item_id?:..query", CodeItemView)] CodeItem { item_id: String, query: ItemQuery },
        #[route("/testset/done/:submission_id", DoneView)] Done { submission_id: String },
}

impl Route {
    #[must_use]
    pub fn take(submission_id: impl fmt::Display) -> Self {
        Route::Take {
            submission_id: submission_id.to_string(),
        }
    }
}

impl From<ItemLink> for Route {
    fn from(link: ItemLink) -> Self {
        let item_id = link.item_id.to_string();
        let query = ItemQuery {
            submission_id: link.submission_id.to_string(),
            return_url: link.return_url,
        };
        match link.kind {
            ItemKind::Quiz => Route::QuizItem { item_id, query },
            ItemKind::Code => Route::CodeItem { item_id, query },
        }
    }
}

/// `submissionId` and `returnUrl` carried by item page URLs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub submission_id: String,
    pub return_url: String,
}

impl ItemQuery {
    /// Route to go back to after the item is done. Falls back to the taking
    /// page when `returnUrl` is not an in-app route.
    #[must_use]
    pub fn return_route(&self) -> Route {
        self.return_url
            .parse::<Route>()
            .unwrap_or_else(|_| Route::take(&self.submission_id))
    }
}

impl From<&str> for ItemQuery {
    fn from(query: &str) -> Self {
        let mut parsed = ItemQuery::default();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "submissionId" => parsed.submission_id = value.into_owned(),
                "returnUrl" => parsed.return_url = value.into_owned(),
                _ => {}
            }
        }
        parsed
    }
}

impl fmt::Display for ItemQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .append_pair("submissionId", &self.submission_id)
            .append_pair("returnUrl", &self.return_url)
            .finish();
        f.write_str(&encoded)
    }
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            header { class: "topbar",
                h1 { "Assessment" }
            }
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}
