//! The orchestration engine.
//!
//! Runs the seven nodes in a fixed order decided at construction. After
//! every node the stop predicate is evaluated; halted and completed runs
//! are both terminal and both carry a user-facing response. The engine
//! never lets an error escape — failures inside nodes degrade the state,
//! they do not raise.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::llm::LlmProvider;
use crate::nodes::{
    ClassifyIntent, ConfirmationGate, ExecuteTool, ExtractEntities, GenerateResponse,
    NormalizeInput, ValidateRequest,
};
use crate::state::ConversationState;
use crate::tools::ToolRegistry;

/// A single pipeline step: a pure `State -> State` transition.
#[async_trait]
pub trait Node: Send + Sync {
    /// Node name for trace events.
    fn name(&self) -> &'static str;

    async fn run(&self, state: ConversationState) -> ConversationState;
}

/// The deterministic node sequence. Order is fixed at construction —
/// there is no runtime registration and no name-based lookup, and no
/// node is ever skipped or reordered.
pub struct Pipeline {
    nodes: Vec<Box<dyn Node>>,
}

impl Pipeline {
    /// Build the pipeline with its injected collaborators. There is no
    /// process-wide default provider; tests construct pipelines with
    /// their own fakes.
    pub fn new(llm: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        let nodes: Vec<Box<dyn Node>> = vec![
            Box::new(NormalizeInput),
            Box::new(ClassifyIntent::new(llm.clone())),
            Box::new(ExtractEntities::new(llm)),
            Box::new(ValidateRequest),
            Box::new(ConfirmationGate),
            Box::new(ExecuteTool::new(tools)),
            Box::new(GenerateResponse),
        ];
        Self { nodes }
    }

    /// Execute the pipeline to a terminal state.
    ///
    /// Trace events carry ids, lengths, booleans and enum values only —
    /// never raw input text or extracted entity values.
    pub async fn run(&self, state: ConversationState) -> ConversationState {
        let mut current = if state.correlation_id.is_none() {
            let correlation: String = Uuid::now_v7().simple().to_string()[..8].to_string();
            state.update().correlation_id(correlation).finish()
        } else {
            state
        };

        tracing::info!(
            correlation_id = current.correlation_id.as_deref().unwrap_or(""),
            conversation_id = %current.conversation_id,
            tenant_id = current.tenant_id.as_deref().unwrap_or(""),
            input_length = current.user_input.len(),
            "pipeline run start"
        );

        for node in &self.nodes {
            tracing::debug!(
                correlation_id = current.correlation_id.as_deref().unwrap_or(""),
                conversation_id = %current.conversation_id,
                node = node.name(),
                step = current.step_count,
                "node enter"
            );

            current = node.run(current).await;

            tracing::debug!(
                correlation_id = current.correlation_id.as_deref().unwrap_or(""),
                conversation_id = %current.conversation_id,
                node = node.name(),
                step = current.step_count,
                has_response = current.response.is_some(),
                "node exit"
            );

            if current.should_stop() {
                tracing::info!(
                    correlation_id = current.correlation_id.as_deref().unwrap_or(""),
                    conversation_id = %current.conversation_id,
                    node = node.name(),
                    reason = if current.response.is_some() {
                        "response_set"
                    } else {
                        "error"
                    },
                    "pipeline early stop"
                );
                break;
            }
        }

        tracing::info!(
            correlation_id = current.correlation_id.as_deref().unwrap_or(""),
            conversation_id = %current.conversation_id,
            steps = current.step_count,
            intent = current.intent.map(|i| i.as_str()).unwrap_or(""),
            has_response = current.response.is_some(),
            "pipeline run complete"
        );

        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StubLlmProvider;
    use crate::messages::{MSG_EMPTY_INPUT, MSG_INTENT_MENU, MSG_OPERATION_CANCELLED};
    use crate::llm::{EntityExtraction, IntentClassification};
    use crate::ports::{
        BillingUseCases, BoletoRecord, BoletoStatus, CancelBoletoRequest, CreateBoletoRequest,
        MessagingUseCases, QueueMessageRequest, QueuedMessage, UseCaseError,
    };
    use crate::state::{ConfirmationStatus, InputKind, Intent, ValidationResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeBilling {
        create_calls: AtomicUsize,
    }

    impl FakeBilling {
        fn new() -> Self {
            Self {
                create_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BillingUseCases for FakeBilling {
        async fn create_boleto(
            &self,
            request: CreateBoletoRequest,
        ) -> Result<BoletoRecord, UseCaseError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            Ok(BoletoRecord {
                id: "blt-1001".into(),
                status: BoletoStatus::Created,
                amount_cents: request.amount_cents,
                due_date: request.due_date,
                provider_reference: Some("paytime_deadbeef".into()),
            })
        }

        async fn cancel_boleto(
            &self,
            request: CancelBoletoRequest,
        ) -> Result<BoletoRecord, UseCaseError> {
            Ok(BoletoRecord {
                id: request.boleto_id,
                status: BoletoStatus::Cancelled,
                amount_cents: 0,
                due_date: String::new(),
                provider_reference: None,
            })
        }

        async fn get_boleto_status(&self, boleto_id: &str) -> Result<BoletoRecord, UseCaseError> {
            Ok(BoletoRecord {
                id: boleto_id.to_string(),
                status: BoletoStatus::Sent,
                amount_cents: 1000,
                due_date: "2026-12-01".into(),
                provider_reference: None,
            })
        }

        async fn list_boletos(&self, _tenant_id: &str) -> Result<Vec<BoletoRecord>, UseCaseError> {
            Ok(Vec::new())
        }
    }

    struct FakeMessaging;

    #[async_trait]
    impl MessagingUseCases for FakeMessaging {
        async fn queue_message(
            &self,
            _request: QueueMessageRequest,
        ) -> Result<QueuedMessage, UseCaseError> {
            Ok(QueuedMessage {
                message_id: "m-1".into(),
            })
        }
    }

    /// LLM fake with scripted classification and extraction.
    struct ScriptedLlm {
        classification: IntentClassification,
        extraction: EntityExtraction,
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn classify_intent(&self, _text: &str) -> IntentClassification {
            self.classification.clone()
        }

        async fn extract_entities(&self, _text: &str, _intent: Intent) -> EntityExtraction {
            self.extraction.clone()
        }
    }

    fn pipeline_with_llm(llm: Arc<dyn LlmProvider>) -> (Pipeline, Arc<FakeBilling>) {
        let billing = Arc::new(FakeBilling::new());
        let tools = Arc::new(ToolRegistry::new(billing.clone(), Arc::new(FakeMessaging)));
        (Pipeline::new(llm, tools), billing)
    }

    fn new_state(text: &str) -> ConversationState {
        ConversationState::new("conv-1", Some("t1".into()), None, text, InputKind::Text)
    }

    fn future_iso_date() -> String {
        (chrono::Utc::now().date_naive() + chrono::Duration::days(30))
            .format("%Y-%m-%d")
            .to_string()
    }

    #[tokio::test]
    async fn empty_input_halts_after_the_first_node() {
        let (pipeline, _) = pipeline_with_llm(Arc::new(StubLlmProvider));
        let out = pipeline.run(new_state("   ")).await;
        assert_eq!(out.response.as_deref(), Some(MSG_EMPTY_INPUT));
        assert!(out.intent.is_none());
        // Only normalize ran: one step for the correlation id injection,
        // one for the node itself.
        assert_eq!(out.step_count, 2);
    }

    #[tokio::test]
    async fn low_confidence_halts_with_menu_before_extraction() {
        let llm = Arc::new(ScriptedLlm {
            classification: IntentClassification::ok("create_boleto", 0.65),
            extraction: EntityExtraction {
                success: true,
                contact_name: Some("Maria".into()),
                ..EntityExtraction::default()
            },
        });
        let (pipeline, _) = pipeline_with_llm(llm);
        let out = pipeline.run(new_state("quero criar um boleto")).await;
        assert_eq!(out.intent, Some(Intent::Unknown));
        assert_eq!(out.response.as_deref(), Some(MSG_INTENT_MENU));
        // Extraction never ran: the bag is untouched.
        assert!(out.entities.contact_name.is_none());
    }

    #[tokio::test]
    async fn missing_amount_stops_at_validation_with_clarify() {
        let llm = Arc::new(ScriptedLlm {
            classification: IntentClassification::ok("create_boleto", 0.9),
            extraction: EntityExtraction {
                success: true,
                contact_name: Some("Maria".into()),
                due_date: Some(future_iso_date()),
                ..EntityExtraction::default()
            },
        });
        let (pipeline, billing) = pipeline_with_llm(llm);
        let out = pipeline.run(new_state("quero criar um boleto para maria")).await;
        assert_eq!(out.validation_result, ValidationResult::Clarify);
        assert!(out.response.as_deref().unwrap().contains("valor"));
        assert_eq!(out.confirmation_status, ConfirmationStatus::NotRequired);
        assert_eq!(billing.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejection_keyword_cancels_the_turn() {
        let llm = Arc::new(ScriptedLlm {
            classification: IntentClassification::ok("create_boleto", 0.9),
            extraction: EntityExtraction {
                success: true,
                contact_name: Some("Maria".into()),
                amount_cents: Some(15000),
                due_date: Some(future_iso_date()),
                ..EntityExtraction::default()
            },
        });
        let (pipeline, billing) = pipeline_with_llm(llm);
        let out = pipeline
            .run(new_state("não quero criar esse boleto para maria"))
            .await;
        assert_eq!(out.confirmation_status, ConfirmationStatus::Rejected);
        assert_eq!(out.response.as_deref(), Some(MSG_OPERATION_CANCELLED));
        assert_eq!(billing.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn monetary_flow_takes_two_runs_to_execute() {
        let llm = Arc::new(ScriptedLlm {
            classification: IntentClassification::ok("create_boleto", 0.85),
            extraction: EntityExtraction {
                success: true,
                contact_name: Some("Maria".into()),
                amount_cents: Some(15000),
                due_date: Some(future_iso_date()),
                ..EntityExtraction::default()
            },
        });
        let (pipeline, billing) = pipeline_with_llm(llm);

        // First run halts at the gate with a pending prompt.
        let armed = pipeline
            .run(new_state("quero criar um boleto de r$ 150,00 para maria"))
            .await;
        assert_eq!(armed.confirmation_status, ConfirmationStatus::Pending);
        assert!(armed.response.as_deref().unwrap().contains("150,00"));
        assert!(armed.response.as_deref().unwrap().contains("Maria"));
        assert_eq!(billing.create_calls.load(Ordering::SeqCst), 0);

        // Second run re-enters with the explicit confirmation.
        let confirmed = armed
            .update()
            .confirmation_status(ConfirmationStatus::Confirmed)
            .clear_response()
            .clear_tool_outcome()
            .finish();
        let done = pipeline.run(confirmed).await;
        assert_eq!(billing.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(done.tool_name.as_deref(), Some("create_boleto"));
        let response = done.response.as_deref().unwrap();
        assert!(response.contains("blt-1001"), "got: {response}");
    }

    #[tokio::test]
    async fn read_only_flow_completes_in_one_run() {
        let llm = Arc::new(ScriptedLlm {
            classification: IntentClassification::ok("check_status", 0.9),
            extraction: EntityExtraction {
                success: true,
                boleto_id: Some("blt-7".into()),
                ..EntityExtraction::default()
            },
        });
        let (pipeline, _) = pipeline_with_llm(llm);
        let out = pipeline.run(new_state("qual o status do meu boleto?")).await;
        assert_eq!(out.confirmation_status, ConfirmationStatus::NotRequired);
        assert_eq!(out.tool_name.as_deref(), Some("get_boleto_status"));
        assert_eq!(
            out.response.as_deref(),
            Some("📋 Status do boleto **blt-7**: Enviado")
        );
        // All seven nodes ran, plus the correlation id injection.
        assert_eq!(out.step_count, 8);
    }

    #[tokio::test]
    async fn correlation_id_is_injected_once_and_kept() {
        let (pipeline, _) = pipeline_with_llm(Arc::new(StubLlmProvider));
        let out = pipeline.run(new_state("bom dia")).await;
        let correlation = out.correlation_id.clone().unwrap();
        assert_eq!(correlation.len(), 8);

        let again = pipeline
            .run(out.update().clear_response().finish())
            .await;
        assert_eq!(again.correlation_id.as_deref(), Some(correlation.as_str()));
    }
}
