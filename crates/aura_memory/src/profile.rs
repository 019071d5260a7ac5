//! Typed access to one user's persisted record.
//!
//! Every field is created on first access with its configured default
//! (first-contact state), matching the document-store semantics the rest
//! of the system assumes. Emotion records are stored in the wire format
//! (comma-separated integers); a stored record that no longer matches the
//! configured emotion space is never reinterpreted — it is re-seeded from
//! the initial vector.

use aura_core::emotion::{EmotionSpace, EmotionVector};
use aura_core::store::{RecordStore, StoreError};
use aura_limbic::drift::DriftState;
use std::sync::Arc;

/// Field names within a user's record.
pub mod fields {
    pub const MEMORY: &str = "memory";
    pub const EMOTIONS: &str = "emotions";
    pub const BASE_EMOTIONS: &str = "base_emotions";
    pub const DRIFT: &str = "drift";
    pub const SENSITIVITY: &str = "sensitivity";
    pub const CUSTOM_INSTRUCTIONS: &str = "custom_instructions";
}

/// Pseudo-user key for the globally shared self-model record.
pub const CENTRAL_RECORD: &str = "__central__";

const DEFAULT_CUSTOM_INSTRUCTIONS: &str = "N/A";
const DEFAULT_CENTRAL_STUB: &str =
    "EMPTY. I have not yet formed a model of myself beyond my persona.";

/// Values seeded on first contact.
#[derive(Debug, Clone)]
pub struct ProfileDefaults {
    pub first_contact_stub: String,
    pub sensitivity: u8,
}

pub struct ProfileStore {
    store: Arc<dyn RecordStore>,
    space: EmotionSpace,
    defaults: ProfileDefaults,
}

impl ProfileStore {
    pub fn new(store: Arc<dyn RecordStore>, space: EmotionSpace, defaults: ProfileDefaults) -> Self {
        Self {
            store,
            space,
            defaults,
        }
    }

    pub fn space(&self) -> &EmotionSpace {
        &self.space
    }

    async fn get_or_seed(
        &self,
        user_id: &str,
        field: &str,
        default: &str,
    ) -> Result<String, StoreError> {
        if let Some(value) = self.store.get(user_id, field).await? {
            return Ok(value);
        }
        self.store.set(user_id, field, default).await?;
        Ok(default.to_string())
    }

    // ------------------------------------------------------------------
    // Long-term memory
    // ------------------------------------------------------------------

    pub async fn user_memory(&self, user_id: &str) -> Result<String, StoreError> {
        self.get_or_seed(user_id, fields::MEMORY, &self.defaults.first_contact_stub)
            .await
    }

    pub async fn set_user_memory(&self, user_id: &str, memory: &str) -> Result<(), StoreError> {
        self.store.set(user_id, fields::MEMORY, memory).await
    }

    /// The shared self-model, keyed globally rather than per user.
    pub async fn central_memory(&self) -> Result<String, StoreError> {
        self.get_or_seed(CENTRAL_RECORD, fields::MEMORY, DEFAULT_CENTRAL_STUB)
            .await
    }

    pub async fn set_central_memory(&self, memory: &str) -> Result<(), StoreError> {
        self.store.set(CENTRAL_RECORD, fields::MEMORY, memory).await
    }

    // ------------------------------------------------------------------
    // Emotional state
    // ------------------------------------------------------------------

    pub async fn emotions(&self, user_id: &str) -> Result<EmotionVector, StoreError> {
        self.emotion_field(user_id, fields::EMOTIONS, self.space.initial_vector())
            .await
    }

    pub async fn set_emotions(
        &self,
        user_id: &str,
        vector: &EmotionVector,
    ) -> Result<(), StoreError> {
        self.store
            .set(user_id, fields::EMOTIONS, &vector.format())
            .await
    }

    /// The homeostatic attractor for this user. Reconfigurable, so stored
    /// separately from the space default.
    pub async fn base_emotions(&self, user_id: &str) -> Result<EmotionVector, StoreError> {
        self.emotion_field(user_id, fields::BASE_EMOTIONS, self.space.baseline_vector())
            .await
    }

    pub async fn set_base_emotions(
        &self,
        user_id: &str,
        vector: &EmotionVector,
    ) -> Result<(), StoreError> {
        self.store
            .set(user_id, fields::BASE_EMOTIONS, &vector.format())
            .await
    }

    async fn emotion_field(
        &self,
        user_id: &str,
        field: &str,
        fallback: EmotionVector,
    ) -> Result<EmotionVector, StoreError> {
        if let Some(text) = self.store.get(user_id, field).await? {
            match EmotionVector::parse(&text, &self.space) {
                Ok(vector) => return Ok(vector),
                Err(e) => {
                    // Likely a record written under a different regime.
                    tracing::warn!(user_id, field, error = %e,
                        "stored emotion record does not match configured space, reseeding");
                }
            }
        }
        self.store.set(user_id, field, &fallback.format()).await?;
        Ok(fallback)
    }

    /// Persist emotions + drift bookkeeping after a mutation. Best-effort:
    /// a write failure is logged and the in-memory state stands.
    pub async fn persist_emotions_best_effort(
        &self,
        user_id: &str,
        vector: &EmotionVector,
        drift: &DriftState,
    ) -> bool {
        let mut ok = true;
        if let Err(e) = self.set_emotions(user_id, vector).await {
            tracing::warn!(user_id, error = %e, "failed to persist emotion vector");
            ok = false;
        }
        if let Err(e) = self.set_drift_state(user_id, drift).await {
            tracing::warn!(user_id, error = %e, "failed to persist drift state");
            ok = false;
        }
        ok
    }

    // ------------------------------------------------------------------
    // Drift bookkeeping
    // ------------------------------------------------------------------

    pub async fn drift_state(&self, user_id: &str, now: i64) -> Result<DriftState, StoreError> {
        if let Some(text) = self.store.get(user_id, fields::DRIFT).await? {
            if let Ok(state) = serde_json::from_str::<DriftState>(&text) {
                return Ok(state);
            }
            tracing::warn!(user_id, "unreadable drift record, reseeding");
        }
        let state = DriftState::new(now, self.sensitivity(user_id).await?);
        self.set_drift_state(user_id, &state).await?;
        Ok(state)
    }

    pub async fn set_drift_state(
        &self,
        user_id: &str,
        state: &DriftState,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(state)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        self.store.set(user_id, fields::DRIFT, &json).await
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    pub async fn sensitivity(&self, user_id: &str) -> Result<u8, StoreError> {
        let default = self.defaults.sensitivity.to_string();
        let text = self
            .get_or_seed(user_id, fields::SENSITIVITY, &default)
            .await?;
        Ok(text.trim().parse::<u8>().unwrap_or(self.defaults.sensitivity))
    }

    pub async fn set_sensitivity(&self, user_id: &str, sensitivity: u8) -> Result<(), StoreError> {
        self.store
            .set(user_id, fields::SENSITIVITY, &sensitivity.min(100).to_string())
            .await
    }

    pub async fn custom_instructions(&self, user_id: &str) -> Result<String, StoreError> {
        self.get_or_seed(
            user_id,
            fields::CUSTOM_INSTRUCTIONS,
            DEFAULT_CUSTOM_INSTRUCTIONS,
        )
        .await
    }

    pub async fn set_custom_instructions(
        &self,
        user_id: &str,
        instructions: &str,
    ) -> Result<(), StoreError> {
        self.store
            .set(user_id, fields::CUSTOM_INSTRUCTIONS, instructions)
            .await
    }

    /// Explicit user-data reset: forget the person and the feelings about
    /// them. Settings (sensitivity, custom instructions) survive.
    pub async fn reset(&self, user_id: &str) -> Result<(), StoreError> {
        self.store.delete(user_id, fields::MEMORY).await?;
        self.store.delete(user_id, fields::EMOTIONS).await?;
        self.store.delete(user_id, fields::BASE_EMOTIONS).await?;
        self.store.delete(user_id, fields::DRIFT).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn profile() -> ProfileStore {
        ProfileStore::new(
            Arc::new(InMemoryStore::new()),
            EmotionSpace::bipolar(),
            ProfileDefaults {
                first_contact_stub: "EMPTY. First meeting.".to_string(),
                sensitivity: 50,
            },
        )
    }

    #[tokio::test]
    async fn test_memory_seeded_on_first_access() {
        let p = profile();
        let mem = p.user_memory("u1").await.unwrap();
        assert_eq!(mem, "EMPTY. First meeting.");

        p.set_user_memory("u1", "Their name is Sam.").await.unwrap();
        assert_eq!(p.user_memory("u1").await.unwrap(), "Their name is Sam.");
    }

    #[tokio::test]
    async fn test_emotions_seeded_with_initial_vector() {
        let p = profile();
        let v = p.emotions("u1").await.unwrap();
        assert_eq!(v.values(), &[0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_mismatched_emotion_record_reseeded() {
        let store = Arc::new(InMemoryStore::new());
        // A six-value simplex record left over from an older deployment.
        store
            .set("u1", fields::EMOTIONS, "50,10,10,5,5,20")
            .await
            .unwrap();
        let p = ProfileStore::new(
            store,
            EmotionSpace::bipolar(),
            ProfileDefaults {
                first_contact_stub: "stub".to_string(),
                sensitivity: 50,
            },
        );
        // Not reinterpreted — reset to the configured initial state.
        let v = p.emotions("u1").await.unwrap();
        assert_eq!(v.values(), &[0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_drift_state_roundtrip() {
        let p = profile();
        let seeded = p.drift_state("u1", 12345).await.unwrap();
        assert_eq!(seeded.last_update, 12345);
        assert_eq!(seeded.sensitivity, 50);

        let updated = DriftState::new(99999, 30);
        p.set_drift_state("u1", &updated).await.unwrap();
        assert_eq!(p.drift_state("u1", 0).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_sensitivity_and_instructions_defaults() {
        let p = profile();
        assert_eq!(p.sensitivity("u1").await.unwrap(), 50);
        assert_eq!(p.custom_instructions("u1").await.unwrap(), "N/A");

        p.set_sensitivity("u1", 80).await.unwrap();
        assert_eq!(p.sensitivity("u1").await.unwrap(), 80);
    }

    #[tokio::test]
    async fn test_reset_clears_memory_and_emotions_only() {
        let p = profile();
        p.set_user_memory("u1", "facts").await.unwrap();
        let v = EmotionVector::from_values(vec![20, -5, 0, 10], &EmotionSpace::bipolar()).unwrap();
        p.set_emotions("u1", &v).await.unwrap();
        p.set_sensitivity("u1", 70).await.unwrap();

        p.reset("u1").await.unwrap();

        // Memory and emotions back to first-contact defaults.
        assert_eq!(p.user_memory("u1").await.unwrap(), "EMPTY. First meeting.");
        assert_eq!(p.emotions("u1").await.unwrap().values(), &[0, 0, 0, 0]);
        // Settings survive.
        assert_eq!(p.sensitivity("u1").await.unwrap(), 70);
    }

    #[tokio::test]
    async fn test_central_memory_shared_key() {
        let p = profile();
        let stub = p.central_memory().await.unwrap();
        assert!(stub.starts_with("EMPTY"));
        p.set_central_memory("I tend to get excited about books.")
            .await
            .unwrap();
        assert_eq!(
            p.central_memory().await.unwrap(),
            "I tend to get excited about books."
        );
    }
}
