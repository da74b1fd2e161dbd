//! Conversation state persistence contract.
//!
//! State is ephemeral: every document is saved with a bounded TTL and an
//! expired entry reads as absent. Pending confirmations live under their
//! own namespace with an independent (narrower) TTL, so a stale
//! confirmation window can close while the conversation is still alive.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{ConversationState, ExtractedEntities, Intent};

/// Key namespace for conversation state documents.
pub const STATE_PREFIX: &str = "ai:state:";
/// Key namespace for pending-confirmation payloads.
pub const CONFIRMATION_PREFIX: &str = "ai:confirm:";

/// Payload persisted while a monetary action awaits confirmation.
/// Its presence is what keeps the confirmation window open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingConfirmation {
    pub intent: Option<Intent>,
    pub entities: ExtractedEntities,
    pub tenant_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("state serialization error: {0}")]
    Serialization(String),
}

/// TTL-keyed persistence for conversation state and pending
/// confirmations, keyed by conversation id under distinct namespaces.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn save_state(
        &self,
        conversation_id: &str,
        state: &ConversationState,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Returns `None` for missing and for expired entries alike.
    async fn load_state(
        &self,
        conversation_id: &str,
    ) -> Result<Option<ConversationState>, StoreError>;

    async fn delete_state(&self, conversation_id: &str) -> Result<bool, StoreError>;

    async fn save_pending_confirmation(
        &self,
        conversation_id: &str,
        payload: &PendingConfirmation,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    async fn load_pending_confirmation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<PendingConfirmation>, StoreError>;

    async fn delete_pending_confirmation(&self, conversation_id: &str)
    -> Result<bool, StoreError>;
}

/// In-memory store for tests and local development. Entries carry an
/// expiry instant; expired entries read as absent and are dropped lazily.
#[derive(Default)]
pub struct InMemoryConversationStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn put(&self, key: String, document: String, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key, (document, Instant::now() + ttl));
    }

    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((document, expires_at)) if *expires_at > Instant::now() => {
                Some(document.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn remove(&self, key: &str) -> bool {
        self.entries.lock().unwrap().remove(key).is_some()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn save_state(
        &self,
        conversation_id: &str,
        state: &ConversationState,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let document = serde_json::to_string(state)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.put(format!("{STATE_PREFIX}{conversation_id}"), document, ttl);
        tracing::debug!(conversation_id, ttl_secs = ttl.as_secs(), "state saved");
        Ok(())
    }

    async fn load_state(
        &self,
        conversation_id: &str,
    ) -> Result<Option<ConversationState>, StoreError> {
        let Some(document) = self.get(&format!("{STATE_PREFIX}{conversation_id}")) else {
            return Ok(None);
        };
        serde_json::from_str(&document)
            .map(Some)
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn delete_state(&self, conversation_id: &str) -> Result<bool, StoreError> {
        Ok(self.remove(&format!("{STATE_PREFIX}{conversation_id}")))
    }

    async fn save_pending_confirmation(
        &self,
        conversation_id: &str,
        payload: &PendingConfirmation,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let document = serde_json::to_string(payload)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.put(
            format!("{CONFIRMATION_PREFIX}{conversation_id}"),
            document,
            ttl,
        );
        tracing::debug!(conversation_id, ttl_secs = ttl.as_secs(), "pending confirmation saved");
        Ok(())
    }

    async fn load_pending_confirmation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<PendingConfirmation>, StoreError> {
        let Some(document) = self.get(&format!("{CONFIRMATION_PREFIX}{conversation_id}")) else {
            return Ok(None);
        };
        serde_json::from_str(&document)
            .map(Some)
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn delete_pending_confirmation(
        &self,
        conversation_id: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.remove(&format!("{CONFIRMATION_PREFIX}{conversation_id}")))
    }
}
