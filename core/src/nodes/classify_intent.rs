use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::LlmProvider;
use crate::messages::{MSG_CLASSIFIER_FAILURE, MSG_INTENT_MENU};
use crate::pipeline::Node;
use crate::state::{ConversationState, Intent};

/// Confidence below this forces the intent to `Unknown` and asks the
/// user to pick from the menu.
pub const CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Classifies user intent through the LLM port.
///
/// Port failure degrades to `Unknown` at confidence 0.0 with a fixed
/// apology — never an error. Low confidence halts with the
/// disambiguation menu.
pub struct ClassifyIntent {
    llm: Arc<dyn LlmProvider>,
}

impl ClassifyIntent {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Node for ClassifyIntent {
    fn name(&self) -> &'static str {
        "classify_intent"
    }

    async fn run(&self, state: ConversationState) -> ConversationState {
        let Some(normalized) = state.normalized_input.clone() else {
            return state;
        };
        if state.should_stop() {
            return state;
        }

        let result = self.llm.classify_intent(&normalized).await;

        if !result.success {
            tracing::warn!(
                conversation_id = %state.conversation_id,
                error_code = ?result.error_code,
                "intent classification failed"
            );
            return state
                .update()
                .intent(Intent::Unknown)
                .intent_confidence(0.0)
                .response(MSG_CLASSIFIER_FAILURE)
                .finish();
        }

        let intent = result
            .intent
            .as_deref()
            .map(Intent::from_wire)
            .unwrap_or(Intent::Unknown);
        let confidence = result.confidence;

        if confidence < CONFIDENCE_THRESHOLD {
            tracing::info!(
                conversation_id = %state.conversation_id,
                intent = intent.as_str(),
                confidence,
                "intent confidence below threshold"
            );
            return state
                .update()
                .intent(Intent::Unknown)
                .intent_confidence(confidence)
                .response(MSG_INTENT_MENU)
                .finish();
        }

        tracing::info!(
            conversation_id = %state.conversation_id,
            intent = intent.as_str(),
            confidence,
            "intent classified"
        );

        state
            .update()
            .intent(intent)
            .intent_confidence(confidence)
            .finish()
    }
}
