use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::ports::{BillingUseCases, CreateBoletoRequest};
use crate::tools::{Tool, ToolResult};

/// Input for the boleto-creation tool.
#[derive(Debug, Clone)]
pub struct CreateBoletoToolInput {
    pub tenant_id: String,
    pub contact_name: String,
    pub amount_cents: i64,
    pub due_date: String,
    pub idempotency_key: String,
}

/// Creates a boleto through the billing use case.
///
/// Preconditions: the user has confirmed; amount and due date passed the
/// validation gate. Contact resolution happens inside the use case.
pub struct CreateBoletoTool {
    billing: Arc<dyn BillingUseCases>,
}

impl CreateBoletoTool {
    pub fn new(billing: Arc<dyn BillingUseCases>) -> Self {
        Self { billing }
    }
}

#[async_trait]
impl Tool for CreateBoletoTool {
    type Input = CreateBoletoToolInput;

    fn name(&self) -> &'static str {
        "create_boleto"
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn validate_input(&self, input: &Self::Input) -> Vec<String> {
        let mut errors = Vec::new();
        if input.tenant_id.is_empty() {
            errors.push("tenant_id is required".to_string());
        }
        if input.contact_name.is_empty() {
            errors.push("contact_name is required".to_string());
        }
        if input.amount_cents <= 0 {
            errors.push("amount must be positive".to_string());
        }
        if input.due_date.is_empty() {
            errors.push("due_date is required".to_string());
        }
        if input.idempotency_key.is_empty() {
            errors.push("idempotency_key is required".to_string());
        }
        errors
    }

    async fn execute(&self, input: Self::Input) -> ToolResult {
        let errors = self.validate_input(&input);
        if !errors.is_empty() {
            return ToolResult::fail(errors.join("; "));
        }

        tracing::info!(
            tenant_id = %input.tenant_id,
            amount_cents = input.amount_cents,
            "create boleto tool start"
        );

        let request = CreateBoletoRequest {
            tenant_id: input.tenant_id,
            contact_name: input.contact_name,
            amount_cents: input.amount_cents,
            due_date: input.due_date,
            idempotency_key: input.idempotency_key,
        };

        match self.billing.create_boleto(request).await {
            Ok(boleto) => {
                tracing::info!(boleto_id = %boleto.id, "create boleto tool success");
                ToolResult::ok(json!({
                    "boleto_id": boleto.id,
                    "status": boleto.status.as_str(),
                    "amount_cents": boleto.amount_cents,
                    "due_date": boleto.due_date,
                    "provider_reference": boleto.provider_reference,
                }))
            }
            Err(error) => {
                tracing::error!(error = %error, "create boleto tool error");
                ToolResult::fail(error.to_string())
            }
        }
    }
}
