use std::sync::Arc;

use async_trait::async_trait;
use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use url::Url;

use services::{AppServices, GatewayError, SubmissionGateway, TestSetTakingService};
use testset_core::model::{
    CodeSubmission, ItemId, QuizAnswer, SubmissionId, TestSetDetail, TestSetId, TestSetSubmission,
};
use testset_core::time::fixed_clock;

use crate::context::{AppContext, LaunchTarget, UiApp, build_app_context};
use crate::routes::ItemQuery;
use crate::views::{DoneView, LaunchView, QuizItemView};

/// Gateway that refuses everything; views under test never reach it.
struct OfflineGateway;

fn offline() -> GatewayError {
    GatewayError::Endpoint("offline".to_string())
}

#[async_trait]
impl SubmissionGateway for OfflineGateway {
    async fn start_test_set(&self, _test_set_id: &TestSetId) -> Result<TestSetSubmission, GatewayError> {
        Err(offline())
    }

    async fn get_test_set(&self, _test_set_id: &TestSetId) -> Result<TestSetDetail, GatewayError> {
        Err(offline())
    }

    async fn submit_quiz(
        &self,
        _submission_id: &SubmissionId,
        _quiz_id: &ItemId,
        _answers: &[QuizAnswer],
    ) -> Result<TestSetSubmission, GatewayError> {
        Err(offline())
    }

    async fn submit_code(
        &self,
        _submission_id: &SubmissionId,
        _problem_id: &ItemId,
        _submission: &CodeSubmission,
    ) -> Result<TestSetSubmission, GatewayError> {
        Err(offline())
    }

    async fn submit_final(&self, _submission_id: &SubmissionId) -> Result<TestSetSubmission, GatewayError> {
        Err(offline())
    }
}

struct TestApp {
    services: AppServices,
}

impl UiApp for TestApp {
    fn taking(&self) -> Arc<TestSetTakingService> {
        self.services.taking()
    }

    fn launch_target(&self) -> LaunchTarget {
        LaunchTarget::Idle
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum ViewKind {
    Launch,
    Done(String),
    Quiz { item_id: String, query: ItemQuery },
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    ctx: AppContext,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    use_context_provider(|| props.ctx.clone());
    use_context_provider(|| props.view.clone());
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Launch => rsx! { LaunchView {} },
        ViewKind::Done(submission_id) => rsx! { DoneView { submission_id } },
        ViewKind::Quiz { item_id, query } => rsx! { QuizItemView { item_id, query } },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub fn test_context() -> AppContext {
    let app_base = Url::parse("app://localhost/").expect("app base");
    let services = AppServices::in_memory(fixed_clock(), Arc::new(OfflineGateway), app_base);
    let app: Arc<dyn UiApp> = Arc::new(TestApp { services });
    build_app_context(app)
}

/// Harness over `ctx`, so tests can seed results before the first render.
pub fn setup_view_harness(view: ViewKind, ctx: AppContext) -> ViewHarness {
    let dom = VirtualDom::new_with_props(ViewRouterHarness, ViewHarnessProps { ctx, view });
    ViewHarness { dom }
}
