//! Transport-facing entry points.
//!
//! `handle_message` and `handle_confirm` are the only two operations the
//! transport layer drives. A monetary action always takes exactly two
//! pipeline runs: one that halts at the confirmation gate (Pending), and
//! one — triggered only by an explicit confirm call — that re-enters
//! with the confirmation granted and reaches tool execution.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::messages::{MSG_FALLBACK, MSG_OPERATION_CANCELLED, MSG_OPERATION_DONE};
use crate::pipeline::Pipeline;
use crate::state::{ConfirmationStatus, ConversationState, InputKind, Intent};
use crate::store::{ConversationStore, PendingConfirmation, StoreError};

/// TTLs for the two independent expiry windows.
#[derive(Debug, Clone, Copy)]
pub struct StateTtls {
    pub state: Duration,
    pub pending_confirmation: Duration,
}

impl Default for StateTtls {
    fn default() -> Self {
        Self {
            state: Duration::from_secs(1800),
            pending_confirmation: Duration::from_secs(300),
        }
    }
}

/// An inbound user message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// Existing conversation id, or `None` to start a new conversation.
    pub conversation_id: Option<String>,
    pub tenant_id: String,
    pub user_id: Option<String>,
    pub text: String,
    pub input_kind: InputKind,
}

/// Terminal result of a message turn.
#[derive(Debug, Clone)]
pub struct MessageOutcome {
    pub conversation_id: String,
    pub response: String,
    pub requires_confirmation: bool,
    pub suggested_action: Option<Intent>,
    pub intent: Option<Intent>,
}

/// An explicit confirmation round-trip.
#[derive(Debug, Clone)]
pub struct Confirm {
    pub conversation_id: String,
    pub tenant_id: String,
    pub confirmed: bool,
}

/// Terminal result of a confirm turn.
#[derive(Debug, Clone)]
pub struct ConfirmOutcome {
    pub conversation_id: String,
    pub response: String,
    pub action_executed: bool,
    pub result: Option<serde_json::Value>,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The confirmation window closed (5-minute TTL) even though the
    /// broader conversation may still be alive.
    #[error("confirmation expired for conversation {conversation_id}")]
    ConfirmationExpired { conversation_id: String },
    #[error("conversation {conversation_id} not found")]
    ConversationNotFound { conversation_id: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drives the pipeline against the conversation store.
pub struct ConversationService {
    pipeline: Pipeline,
    store: Arc<dyn ConversationStore>,
    ttls: StateTtls,
}

impl ConversationService {
    pub fn new(pipeline: Pipeline, store: Arc<dyn ConversationStore>, ttls: StateTtls) -> Self {
        Self {
            pipeline,
            store,
            ttls,
        }
    }

    /// Process a user message: load or create state, run the pipeline,
    /// persist the result (and the pending-confirmation payload when the
    /// gate armed one).
    pub async fn handle_message(&self, message: NewMessage) -> Result<MessageOutcome, ServiceError> {
        let state = match &message.conversation_id {
            Some(conversation_id) => match self.store.load_state(conversation_id).await? {
                // Rehydrated: keep the thread, swap in the new input and
                // clear the previous turn's outcome.
                Some(previous) => previous
                    .update()
                    .user_input(message.text.clone())
                    .clear_response()
                    .clear_tool_outcome()
                    .finish(),
                // Expired or never existed: a fresh conversation under
                // the same id, never an error.
                None => ConversationState::new(
                    conversation_id.clone(),
                    Some(message.tenant_id.clone()),
                    message.user_id.clone(),
                    message.text.clone(),
                    message.input_kind,
                ),
            },
            None => ConversationState::new(
                Uuid::now_v7().to_string(),
                Some(message.tenant_id.clone()),
                message.user_id.clone(),
                message.text.clone(),
                message.input_kind,
            ),
        };

        let final_state = self.pipeline.run(state).await;

        let requires_confirmation =
            final_state.confirmation_status == ConfirmationStatus::Pending;

        if requires_confirmation {
            let payload = PendingConfirmation {
                intent: final_state.intent,
                entities: final_state.entities.clone(),
                tenant_id: Some(message.tenant_id.clone()),
            };
            self.store
                .save_pending_confirmation(
                    &final_state.conversation_id,
                    &payload,
                    self.ttls.pending_confirmation,
                )
                .await?;
        }

        self.store
            .save_state(&final_state.conversation_id, &final_state, self.ttls.state)
            .await?;

        tracing::info!(
            conversation_id = %final_state.conversation_id,
            intent = final_state.intent.map(|i| i.as_str()).unwrap_or(""),
            requires_confirmation,
            "message handled"
        );

        Ok(MessageOutcome {
            conversation_id: final_state.conversation_id.clone(),
            response: final_state
                .response
                .clone()
                .unwrap_or_else(|| MSG_FALLBACK.to_string()),
            requires_confirmation,
            suggested_action: final_state.intent,
            intent: final_state.intent,
        })
    }

    /// Resolve a pending confirmation. Rejection cancels the action;
    /// acceptance re-enters the pipeline with the confirmation granted,
    /// which is the only path to tool execution for monetary intents.
    pub async fn handle_confirm(&self, confirm: Confirm) -> Result<ConfirmOutcome, ServiceError> {
        let conversation_id = confirm.conversation_id.clone();

        let pending = self.store.load_pending_confirmation(&conversation_id).await?;
        if pending.is_none() {
            tracing::warn!(conversation_id = %conversation_id, "confirmation expired");
            return Err(ServiceError::ConfirmationExpired { conversation_id });
        }

        let Some(state) = self.store.load_state(&conversation_id).await? else {
            return Err(ServiceError::ConversationNotFound { conversation_id });
        };

        if !confirm.confirmed {
            self.store.delete_pending_confirmation(&conversation_id).await?;

            let final_state = state
                .update()
                .confirmation_status(ConfirmationStatus::Rejected)
                .response(MSG_OPERATION_CANCELLED)
                .finish();
            self.store
                .save_state(&conversation_id, &final_state, self.ttls.state)
                .await?;

            tracing::info!(conversation_id = %conversation_id, "confirmation rejected");

            return Ok(ConfirmOutcome {
                conversation_id,
                response: MSG_OPERATION_CANCELLED.to_string(),
                action_executed: false,
                result: None,
            });
        }

        let confirmed_state = state
            .update()
            .confirmation_status(ConfirmationStatus::Confirmed)
            .clear_response()
            .clear_tool_outcome()
            .finish();

        let final_state = self.pipeline.run(confirmed_state).await;

        self.store.delete_pending_confirmation(&conversation_id).await?;
        self.store
            .save_state(&conversation_id, &final_state, self.ttls.state)
            .await?;

        tracing::info!(
            conversation_id = %conversation_id,
            tool = final_state.tool_name.as_deref().unwrap_or(""),
            success = final_state.tool_error.is_none(),
            "confirmation executed"
        );

        Ok(ConfirmOutcome {
            conversation_id,
            response: final_state
                .response
                .clone()
                .unwrap_or_else(|| MSG_OPERATION_DONE.to_string()),
            action_executed: final_state.tool_error.is_none(),
            result: final_state.tool_result.clone(),
        })
    }
}
