use std::sync::Arc;

use url::Url;

use storage::repository::{InMemoryStore, KeyValueStore};
use storage::session_store::SessionStore;
use storage::sqlite::SqliteStore;

use crate::config::GatewayConfig;
use crate::error::AppServicesError;
use crate::gateway::{HttpSubmissionGateway, SubmissionGateway};
use crate::navigator::ItemNavigator;
use crate::sessions::TestSetTakingService;
use crate::Clock;

/// Assembles app-facing services.
#[derive(Clone)]
pub struct AppServices {
    taking: Arc<TestSetTakingService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP gateway.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or the HTTP
    /// client setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        gateway: GatewayConfig,
        app_base: Url,
    ) -> Result<Self, AppServicesError> {
        let store = SqliteStore::open(db_url).await?;
        let gateway = HttpSubmissionGateway::new(gateway)?;
        tracing::info!(db_url, api = %gateway.config().base_url, "services ready");
        Ok(Self::with_parts(clock, Arc::new(gateway), Arc::new(store), app_base))
    }

    /// Services over a process-local store, for tests and previews.
    #[must_use]
    pub fn in_memory(clock: Clock, gateway: Arc<dyn SubmissionGateway>, app_base: Url) -> Self {
        Self::with_parts(clock, gateway, Arc::new(InMemoryStore::new()), app_base)
    }

    #[must_use]
    pub fn with_parts(
        clock: Clock,
        gateway: Arc<dyn SubmissionGateway>,
        kv: Arc<dyn KeyValueStore>,
        app_base: Url,
    ) -> Self {
        let taking = TestSetTakingService::new(
            clock,
            gateway,
            SessionStore::new(kv),
            ItemNavigator::new(app_base),
        );
        Self {
            taking: Arc::new(taking),
        }
    }

    #[must_use]
    pub fn taking(&self) -> Arc<TestSetTakingService> {
        Arc::clone(&self.taking)
    }
}
