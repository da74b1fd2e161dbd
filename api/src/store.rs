use std::time::Duration;

use async_trait::async_trait;
use iris_core::state::ConversationState;
use iris_core::store::{
    CONFIRMATION_PREFIX, ConversationStore, PendingConfirmation, STATE_PREFIX, StoreError,
};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Redis-backed conversation store.
///
/// Documents are flat JSON under `ai:state:` / `ai:confirm:` namespaces,
/// written with `SET .. EX` so Redis owns expiry. No PII in logs.
#[derive(Clone)]
pub struct RedisConversationStore {
    connection: ConnectionManager,
}

impl RedisConversationStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    async fn set_with_ttl(&self, key: String, document: String, ttl: Duration) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        // A zero TTL would be an invalid EX argument; clamp to one second.
        let ttl_secs = ttl.as_secs().max(1);
        connection
            .set_ex::<_, _, ()>(key, document, ttl_secs)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn get(&self, key: String) -> Result<Option<String>, StoreError> {
        let mut connection = self.connection.clone();
        connection
            .get(key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn delete(&self, key: String) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();
        let deleted: u64 = connection
            .del(key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl ConversationStore for RedisConversationStore {
    async fn save_state(
        &self,
        conversation_id: &str,
        state: &ConversationState,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let document = serde_json::to_string(state)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.set_with_ttl(format!("{STATE_PREFIX}{conversation_id}"), document, ttl)
            .await?;
        tracing::debug!(conversation_id, ttl_secs = ttl.as_secs(), "state saved");
        Ok(())
    }

    async fn load_state(
        &self,
        conversation_id: &str,
    ) -> Result<Option<ConversationState>, StoreError> {
        let Some(document) = self.get(format!("{STATE_PREFIX}{conversation_id}")).await? else {
            tracing::debug!(conversation_id, "state not found");
            return Ok(None);
        };
        serde_json::from_str(&document)
            .map(Some)
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn delete_state(&self, conversation_id: &str) -> Result<bool, StoreError> {
        self.delete(format!("{STATE_PREFIX}{conversation_id}")).await
    }

    async fn save_pending_confirmation(
        &self,
        conversation_id: &str,
        payload: &PendingConfirmation,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let document = serde_json::to_string(payload)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.set_with_ttl(
            format!("{CONFIRMATION_PREFIX}{conversation_id}"),
            document,
            ttl,
        )
        .await?;
        tracing::debug!(conversation_id, ttl_secs = ttl.as_secs(), "pending confirmation saved");
        Ok(())
    }

    async fn load_pending_confirmation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<PendingConfirmation>, StoreError> {
        let Some(document) = self
            .get(format!("{CONFIRMATION_PREFIX}{conversation_id}"))
            .await?
        else {
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
        self.delete(format!("{CONFIRMATION_PREFIX}{conversation_id}"))
            .await
    }
}
