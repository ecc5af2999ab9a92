use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── CONTEXTS & CHANGE EVENTS ─────────────────────────────────────────────────
//

/// One execution context sharing the store (a tab, a window, a process).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(Uuid);

impl ContextId {
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextId({})", self.0)
    }
}

/// A write observed on the shared store. `new_value` is `None` for removals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
    pub origin: ContextId,
}

/// What a subscription yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageNotice {
    Changed(StorageEvent),
    /// The subscriber fell behind and `u64` events were dropped; re-read.
    Missed(u64),
}

const FEED_CAPACITY: usize = 64;

/// Broadcast hub shared by every context attached to the same data.
#[derive(Clone)]
pub(crate) struct ChangeFeed {
    sender: broadcast::Sender<StorageEvent>,
}

impl ChangeFeed {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    pub(crate) fn publish(&self, event: StorageEvent) {
        // No receivers is the common case for a single context.
        let _ = self.sender.send(event);
    }

    pub(crate) fn subscribe(&self, context: ContextId) -> StorageSubscription {
        StorageSubscription {
            context,
            receiver: self.sender.subscribe(),
        }
    }
}

/// Stream of writes made by *other* contexts.
///
/// Writes made through the subscribing context are skipped, the same way a
/// browser only fires `storage` events in the tabs that did not write.
pub struct StorageSubscription {
    context: ContextId,
    receiver: broadcast::Receiver<StorageEvent>,
}

impl StorageSubscription {
    /// Waits for the next foreign write. Returns `None` once every store handle
    /// is gone.
    pub async fn recv(&mut self) -> Option<StorageNotice> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.origin == self.context => {}
                Ok(event) => return Some(StorageNotice::Changed(event)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "storage subscription lagged");
                    return Some(StorageNotice::Missed(skipped));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

//
// ─── KEY-VALUE CONTRACT ───────────────────────────────────────────────────────
//

/// String key-value store shared between contexts.
///
/// Last writer wins; there is no locking. Consumers reconcile through
/// `subscribe` and by re-reading when they regain focus.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Context this handle writes as.
    fn context_id(&self) -> ContextId;

    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value and notify other contexts.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value and notify other contexts. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Subscribe to writes made by other contexts.
    fn subscribe(&self) -> StorageSubscription;
}

/// Simple in-memory store for tests and single-process use.
///
/// `attach_context` hands out another handle on the same data, which behaves
/// like a second tab.
#[derive(Clone)]
pub struct InMemoryStore {
    context: ContextId,
    entries: Arc<Mutex<HashMap<String, String>>>,
    feed: ChangeFeed,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            context: ContextId::random(),
            entries: Arc::new(Mutex::new(HashMap::new())),
            feed: ChangeFeed::new(),
        }
    }

    /// A new context over the same entries and change feed.
    #[must_use]
    pub fn attach_context(&self) -> Self {
        Self {
            context: ContextId::random(),
            entries: Arc::clone(&self.entries),
            feed: self.feed.clone(),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    fn context_id(&self) -> ContextId {
        self.context
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        {
            let mut guard = self
                .entries
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            guard.insert(key.to_owned(), value.to_owned());
        }
        self.feed.publish(StorageEvent {
            key: key.to_owned(),
            new_value: Some(value.to_owned()),
            origin: self.context,
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let existed = {
            let mut guard = self
                .entries
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            guard.remove(key).is_some()
        };
        if existed {
            self.feed.publish(StorageEvent {
                key: key.to_owned(),
                new_value: None,
                origin: self.context,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> StorageSubscription {
        self.feed.subscribe(self.context)
    }
}
