//! In-memory [`RecordStore`] backend.
//!
//! Used by tests and single-process demos; the durable backend is
//! [`crate::sqlite::SqliteStore`].

use async_trait::async_trait;
use aura_core::store::{RecordStore, StoreError};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<(String, String), String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn get(&self, user_id: &str, field: &str) -> Result<Option<String>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .get(&(user_id.to_string(), field.to_string()))
            .cloned())
    }

    async fn set(&self, user_id: &str, field: &str, value: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.insert(
            (user_id.to_string(), field.to_string()),
            value.to_string(),
        );
        Ok(())
    }

    async fn delete(&self, user_id: &str, field: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.remove(&(user_id.to_string(), field.to_string()));
        Ok(())
    }
}
