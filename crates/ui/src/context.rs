use std::collections::HashMap;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use services::TestSetTakingService;
use testset_core::model::{SubmissionId, TestSetId, TestSetSubmission};

/// What the window opens on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LaunchTarget {
    /// Show the launch form.
    Idle,
    /// Start (or resume) an attempt for a test set.
    StartTestSet(TestSetId),
    /// Reopen a cached attempt.
    Resume(SubmissionId),
}

pub trait UiApp: Send + Sync {
    fn taking(&self) -> Arc<TestSetTakingService>;
    fn launch_target(&self) -> LaunchTarget;
}

#[derive(Clone)]
pub struct AppContext {
    taking: Arc<TestSetTakingService>,
    launch_target: LaunchTarget,
    launch_once: Arc<AtomicBool>,
    // Final results outlive the cleared session record for the done page.
    results: Arc<Mutex<HashMap<SubmissionId, TestSetSubmission>>>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            taking: app.taking(),
            launch_target: app.launch_target(),
            launch_once: Arc::new(AtomicBool::new(true)),
            results: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn taking(&self) -> Arc<TestSetTakingService> {
        Arc::clone(&self.taking)
    }

    /// Launch target the first time it is asked for, `Idle` afterwards.
    #[must_use]
    pub fn take_launch_target(&self) -> LaunchTarget {
        if self.launch_once.swap(false, Ordering::AcqRel) {
            self.launch_target.clone()
        } else {
            LaunchTarget::Idle
        }
    }

    pub fn record_result(&self, result: TestSetSubmission) {
        if let Ok(mut results) = self.results.lock() {
            results.insert(result.id.clone(), result);
        }
    }

    #[must_use]
    pub fn result_for(&self, id: &SubmissionId) -> Option<TestSetSubmission> {
        self.results
            .lock()
            .ok()
            .and_then(|results| results.get(id).cloned())
    }
}

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: Arc<dyn UiApp>) -> AppContext {
    AppContext::new(&app)
}
