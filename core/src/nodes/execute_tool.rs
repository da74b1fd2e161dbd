use std::sync::Arc;

use async_trait::async_trait;

use crate::pipeline::Node;
use crate::state::{ConfirmationStatus, ConversationState, Intent, ValidationResult};
use crate::tools::{
    CancelBoletoToolInput, CreateBoletoToolInput, GetBoletoStatusToolInput, ListBoletosToolInput,
    QueueMessageToolInput, Tool, ToolRegistry, ToolResult,
};

/// Dispatches the classified, validated, confirmed intent to exactly one
/// tool.
///
/// Preconditions are re-checked fresh here regardless of upstream state:
/// validation must have passed, the pipeline must not be halted, and a
/// confirmation-requiring intent must be `Confirmed` at the moment of
/// execution. This re-check makes the gate structurally unbypassable.
pub struct ExecuteTool {
    tools: Arc<ToolRegistry>,
}

impl ExecuteTool {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Node for ExecuteTool {
    fn name(&self) -> &'static str {
        "execute_tool"
    }

    async fn run(&self, state: ConversationState) -> ConversationState {
        if state.validation_result != ValidationResult::Pass {
            tracing::warn!(
                conversation_id = %state.conversation_id,
                "tool execution blocked: validation did not pass"
            );
            return state;
        }
        if state.should_stop() {
            return state;
        }
        let Some(intent) = state.intent else {
            return state;
        };
        if intent.requires_confirmation()
            && state.confirmation_status != ConfirmationStatus::Confirmed
        {
            // Still waiting for the explicit confirmation round-trip.
            return state;
        }

        tracing::info!(
            conversation_id = %state.conversation_id,
            intent = intent.as_str(),
            "tool execution start"
        );

        let Some((tool_name, result)) = self.dispatch(&state, intent).await else {
            // Intents with no tool (general questions, unknown) record an
            // empty result so response generation emits the generic notice.
            return state
                .update()
                .tool_name("none")
                .tool_result(serde_json::json!({}))
                .finish();
        };

        if result.success {
            tracing::info!(
                conversation_id = %state.conversation_id,
                tool = tool_name,
                "tool execution success"
            );
            state
                .update()
                .tool_name(tool_name)
                .tool_result(result.data.unwrap_or_else(|| serde_json::json!({})))
                .finish()
        } else {
            let error = result.error.unwrap_or_else(|| "erro desconhecido".to_string());
            tracing::error!(
                conversation_id = %state.conversation_id,
                tool = tool_name,
                error = %error,
                "tool execution error"
            );
            let response = format!("Ocorreu um erro: {error}");
            state
                .update()
                .tool_name(tool_name)
                .tool_error(error)
                .response(response)
                .finish()
        }
    }
}

impl ExecuteTool {
    async fn dispatch(
        &self,
        state: &ConversationState,
        intent: Intent,
    ) -> Option<(&'static str, ToolResult)> {
        let entities = &state.entities;
        let tenant_id = state.tenant_id.clone().unwrap_or_default();
        let idempotency_key = idempotency_key(state);

        match intent {
            Intent::CreateBoleto => {
                let tool = &self.tools.create_boleto;
                let input = CreateBoletoToolInput {
                    tenant_id,
                    contact_name: entities.contact_name.clone().unwrap_or_default(),
                    amount_cents: entities.amount_cents.unwrap_or_default(),
                    due_date: entities.due_date.clone().unwrap_or_default(),
                    idempotency_key,
                };
                Some((tool.name(), tool.execute(input).await))
            }
            Intent::CancelBoleto => {
                let tool = &self.tools.cancel_boleto;
                let input = CancelBoletoToolInput {
                    boleto_id: entities.boleto_id.clone().unwrap_or_default(),
                    reason: None,
                };
                Some((tool.name(), tool.execute(input).await))
            }
            Intent::CheckStatus => {
                let tool = &self.tools.get_boleto_status;
                let input = GetBoletoStatusToolInput {
                    boleto_id: entities.boleto_id.clone().unwrap_or_default(),
                };
                Some((tool.name(), tool.execute(input).await))
            }
            Intent::SendMessage => {
                let tool = &self.tools.queue_message;
                let input = QueueMessageToolInput {
                    tenant_id,
                    contact_name: entities.contact_name.clone().unwrap_or_default(),
                    message_content: entities.message_content.clone().unwrap_or_default(),
                    idempotency_key,
                };
                Some((tool.name(), tool.execute(input).await))
            }
            Intent::ListBoletos => {
                let tool = &self.tools.list_boletos;
                let input = ListBoletosToolInput { tenant_id };
                Some((tool.name(), tool.execute(input).await))
            }
            Intent::GeneralQuestion | Intent::Unknown => None,
        }
    }
}

/// Stable within a turn so transport retries cannot double-execute;
/// fresh across turns because the correlation id changes per run.
fn idempotency_key(state: &ConversationState) -> String {
    format!(
        "{}:{}",
        state.conversation_id,
        state.correlation_id.as_deref().unwrap_or("0")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{
        BillingUseCases, BoletoRecord, BoletoStatus, CancelBoletoRequest, CreateBoletoRequest,
        MessagingUseCases, QueueMessageRequest, QueuedMessage, UseCaseError,
    };
    use crate::state::{ExtractedEntities, InputKind};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBilling {
        created: Mutex<Vec<CreateBoletoRequest>>,
        fail_create: bool,
    }

    #[async_trait]
    impl BillingUseCases for RecordingBilling {
        async fn create_boleto(
            &self,
            request: CreateBoletoRequest,
        ) -> Result<BoletoRecord, UseCaseError> {
            if self.fail_create {
                return Err(UseCaseError::Provider("provedor indisponível".into()));
            }
            self.created.lock().unwrap().push(request.clone());
            Ok(BoletoRecord {
                id: "b-1".into(),
                status: BoletoStatus::Created,
                amount_cents: request.amount_cents,
                due_date: request.due_date,
                provider_reference: Some("paytime_abc".into()),
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
                due_date: "2026-03-10".into(),
                provider_reference: None,
            })
        }

        async fn get_boleto_status(&self, boleto_id: &str) -> Result<BoletoRecord, UseCaseError> {
            Ok(BoletoRecord {
                id: boleto_id.to_string(),
                status: BoletoStatus::Paid,
                amount_cents: 1000,
                due_date: "2026-03-10".into(),
                provider_reference: None,
            })
        }

        async fn list_boletos(&self, _tenant_id: &str) -> Result<Vec<BoletoRecord>, UseCaseError> {
            Ok(Vec::new())
        }
    }

    struct NoopMessaging;

    #[async_trait]
    impl MessagingUseCases for NoopMessaging {
        async fn queue_message(
            &self,
            _request: QueueMessageRequest,
        ) -> Result<QueuedMessage, UseCaseError> {
            Ok(QueuedMessage {
                message_id: "m-1".into(),
            })
        }
    }

    fn node_with(billing: Arc<RecordingBilling>) -> ExecuteTool {
        ExecuteTool::new(Arc::new(ToolRegistry::new(billing, Arc::new(NoopMessaging))))
    }

    fn create_state(status: ConfirmationStatus) -> ConversationState {
        let entities = ExtractedEntities {
            contact_name: Some("Maria".into()),
            amount_cents: Some(15000),
            due_date: Some("2026-03-10".into()),
            ..ExtractedEntities::default()
        };
        ConversationState::new("conv-1", Some("t1".into()), None, "x", InputKind::Text)
            .update()
            .normalized_input(Some("x".into()))
            .intent(Intent::CreateBoleto)
            .entities(entities)
            .validation_result(ValidationResult::Pass)
            .confirmation_status(status)
            .correlation_id("abc12345")
            .finish()
    }

    #[tokio::test]
    async fn unconfirmed_monetary_intent_returns_unchanged() {
        let billing = Arc::new(RecordingBilling::default());
        let node = node_with(billing.clone());
        let state = create_state(ConfirmationStatus::Pending);
        let steps_before = state.step_count;
        let out = node.run(state).await;
        assert!(out.tool_name.is_none());
        assert_eq!(out.step_count, steps_before);
        assert!(billing.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_state_never_executes_even_when_replayed() {
        let billing = Arc::new(RecordingBilling::default());
        let node = node_with(billing.clone());
        let rejected = create_state(ConfirmationStatus::Rejected);
        let out = node.run(rejected.clone()).await;
        let replayed = node.run(out).await;
        assert!(replayed.tool_name.is_none());
        assert!(billing.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn confirmed_monetary_intent_executes_exactly_one_tool() {
        let billing = Arc::new(RecordingBilling::default());
        let node = node_with(billing.clone());
        let out = node.run(create_state(ConfirmationStatus::Confirmed)).await;
        assert_eq!(out.tool_name.as_deref(), Some("create_boleto"));
        let result = out.tool_result.as_ref().unwrap();
        assert_eq!(result["boleto_id"], "b-1");
        assert_eq!(result["status"], "created");
        let created = billing.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].idempotency_key, "conv-1:abc12345");
    }

    #[tokio::test]
    async fn use_case_failure_becomes_tool_error_not_panic() {
        let billing = Arc::new(RecordingBilling {
            fail_create: true,
            ..RecordingBilling::default()
        });
        let node = node_with(billing);
        let out = node.run(create_state(ConfirmationStatus::Confirmed)).await;
        assert!(out.tool_error.as_deref().unwrap().contains("provedor indisponível"));
        let response = out.response.as_deref().unwrap();
        assert!(response.starts_with("Ocorreu um erro:"), "got: {response}");
        assert!(out.should_stop());
    }

    #[tokio::test]
    async fn failed_validation_blocks_execution() {
        let billing = Arc::new(RecordingBilling::default());
        let node = node_with(billing.clone());
        let state = create_state(ConfirmationStatus::Confirmed)
            .update()
            .validation_result(ValidationResult::Fail)
            .finish();
        let out = node.run(state).await;
        assert!(out.tool_name.is_none());
        assert!(billing.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn read_only_intent_executes_without_confirmation() {
        let billing = Arc::new(RecordingBilling::default());
        let node = node_with(billing);
        let entities = ExtractedEntities {
            boleto_id: Some("b-9".into()),
            ..ExtractedEntities::default()
        };
        let state = ConversationState::new("conv-1", Some("t1".into()), None, "x", InputKind::Text)
            .update()
            .normalized_input(Some("x".into()))
            .intent(Intent::CheckStatus)
            .entities(entities)
            .validation_result(ValidationResult::Pass)
            .finish();
        let out = node.run(state).await;
        assert_eq!(out.tool_name.as_deref(), Some("get_boleto_status"));
        assert_eq!(out.tool_result.as_ref().unwrap()["status"], "paid");
    }
}
