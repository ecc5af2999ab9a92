use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::repository::{
    ContextId, KeyValueStore, StorageError, StorageEvent, StorageSubscription,
};

use super::SqliteStore;

#[async_trait]
impl KeyValueStore for SqliteStore {
    fn context_id(&self) -> ContextId {
        self.context
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM kv_entries WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        row.try_get::<String, _>("value")
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        self.feed.publish(StorageEvent {
            key: key.to_owned(),
            new_value: Some(value.to_owned()),
            origin: self.context,
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        if result.rows_affected() > 0 {
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
