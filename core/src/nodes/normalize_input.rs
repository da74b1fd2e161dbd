use async_trait::async_trait;

use crate::messages::MSG_EMPTY_INPUT;
use crate::pipeline::Node;
use crate::state::ConversationState;

/// Normalizes raw user input into lowercased, trimmed text.
///
/// Empty or whitespace-only input halts the pipeline with a fixed
/// clarification message. Audio inputs are carried through as-is;
/// transcription is a future extension.
pub struct NormalizeInput;

#[async_trait]
impl Node for NormalizeInput {
    fn name(&self) -> &'static str {
        "normalize_input"
    }

    async fn run(&self, state: ConversationState) -> ConversationState {
        let trimmed = state.user_input.trim();

        if trimmed.is_empty() {
            return state
                .update()
                .normalized_input(None)
                .response(MSG_EMPTY_INPUT)
                .finish();
        }

        let normalized = trimmed.to_lowercase();
        tracing::debug!(
            conversation_id = %state.conversation_id,
            length = normalized.len(),
            "input normalized"
        );

        state.update().normalized_input(Some(normalized)).finish()
    }
}
