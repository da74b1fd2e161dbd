use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::LlmProvider;
use crate::pipeline::Node;
use crate::state::{ConversationState, ExtractedEntities};

/// Extracts structured entities through the LLM port, scoped by intent.
///
/// This node never halts: on port failure it proceeds with an empty
/// entity bag and lets the validation gate report what is missing.
pub struct ExtractEntities {
    llm: Arc<dyn LlmProvider>,
}

impl ExtractEntities {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Node for ExtractEntities {
    fn name(&self) -> &'static str {
        "extract_entities"
    }

    async fn run(&self, state: ConversationState) -> ConversationState {
        let Some(intent) = state.intent else {
            return state;
        };
        if state.should_stop() {
            return state;
        }

        let text = state.normalized_input.clone().unwrap_or_default();
        let result = self.llm.extract_entities(&text, intent).await;

        if !result.success {
            tracing::warn!(
                conversation_id = %state.conversation_id,
                error_code = ?result.error_code,
                "entity extraction failed, continuing with empty bag"
            );
            return state.update().entities(ExtractedEntities::default()).finish();
        }

        let mut raw = serde_json::Map::new();
        raw.insert("llm_extracted".to_string(), serde_json::Value::Bool(true));

        let entities = ExtractedEntities {
            contact_name: result.contact_name,
            contact_phone: result.contact_phone,
            amount_cents: result.amount_cents,
            due_date: result.due_date,
            boleto_id: result.boleto_id,
            message_content: result.message_content,
            raw,
        };

        tracing::info!(
            conversation_id = %state.conversation_id,
            has_contact = entities.contact_name.is_some(),
            has_amount = entities.amount_cents.is_some(),
            has_date = entities.due_date.is_some(),
            "entities extracted"
        );

        state.update().entities(entities).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{EntityExtraction, IntentClassification, LlmErrorCode};
    use crate::state::{InputKind, Intent};

    struct FixedLlm(EntityExtraction);

    #[async_trait]
    impl LlmProvider for FixedLlm {
        async fn classify_intent(&self, _text: &str) -> IntentClassification {
            IntentClassification::default()
        }

        async fn extract_entities(&self, _text: &str, _intent: Intent) -> EntityExtraction {
            self.0.clone()
        }
    }

    fn classified_state() -> ConversationState {
        ConversationState::new("conv-1", Some("t1".into()), None, "x", InputKind::Text)
            .update()
            .normalized_input(Some("criar boleto de r$ 10,00 para ana".into()))
            .intent(Intent::CreateBoleto)
            .finish()
    }

    #[tokio::test]
    async fn replaces_the_entity_bag_on_success() {
        let node = ExtractEntities::new(Arc::new(FixedLlm(EntityExtraction {
            success: true,
            contact_name: Some("Ana".into()),
            amount_cents: Some(1000),
            ..EntityExtraction::default()
        })));
        let out = node.run(classified_state()).await;
        assert_eq!(out.entities.contact_name.as_deref(), Some("Ana"));
        assert_eq!(out.entities.amount_cents, Some(1000));
        assert_eq!(
            out.entities.raw.get("llm_extracted"),
            Some(&serde_json::Value::Bool(true))
        );
        assert!(!out.should_stop());
    }

    #[tokio::test]
    async fn port_failure_continues_with_empty_bag() {
        let node = ExtractEntities::new(Arc::new(FixedLlm(EntityExtraction::fail(
            LlmErrorCode::ApiError,
            "boom",
        ))));
        let out = node.run(classified_state()).await;
        assert_eq!(out.entities, ExtractedEntities::default());
        assert!(!out.should_stop());
    }

    #[tokio::test]
    async fn skips_without_intent() {
        let node = ExtractEntities::new(Arc::new(FixedLlm(EntityExtraction::default())));
        let state = ConversationState::new("conv-1", None, None, "x", InputKind::Text);
        let out = node.run(state).await;
        assert_eq!(out.step_count, 0);
    }
}
