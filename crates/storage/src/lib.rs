#![forbid(unsafe_code)]

pub mod repository;
pub mod session_store;
pub mod sqlite;

pub use repository::{
    ContextId, InMemoryStore, KeyValueStore, StorageError, StorageEvent, StorageNotice,
    StorageSubscription,
};
pub use session_store::{SESSION_KEY_PREFIX, SessionStore, SessionSubscription, session_key};
pub use sqlite::{SqliteInitError, SqliteStore};
