//! Persistence and retrieval collaborator interfaces.
//!
//! The store is a per-user document of named text fields with atomic
//! get/set at record granularity (last-writer-wins). Backends live in
//! `aura_memory`; everything here is implementation-agnostic so the
//! drift engine and compressor can run against in-memory doubles.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Keyed `(user_id, field)` text records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, user_id: &str, field: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, user_id: &str, field: &str, value: &str) -> Result<(), StoreError>;
    async fn delete(&self, user_id: &str, field: &str) -> Result<(), StoreError>;
}

/// One similarity-search match.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub text: String,
    pub score: f32,
}

/// Vector-similarity retrieval, consumed by the memory-lookup tool.
/// The service is external; only the capability is defined here.
#[async_trait]
pub trait SimilaritySearch: Send + Sync {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// Top-k nearest stored memories, optionally excluding one user's own.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        exclude_user: Option<&str>,
    ) -> anyhow::Result<Vec<SearchHit>>;
}
