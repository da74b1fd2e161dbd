use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::ports::BillingUseCases;
use crate::tools::{Tool, ToolResult};

/// Input for the status-check tool.
#[derive(Debug, Clone)]
pub struct GetBoletoStatusToolInput {
    pub boleto_id: String,
}

/// Looks up the current status of a boleto. Read-only, always safe to
/// call, no confirmation required.
pub struct GetBoletoStatusTool {
    billing: Arc<dyn BillingUseCases>,
}

impl GetBoletoStatusTool {
    pub fn new(billing: Arc<dyn BillingUseCases>) -> Self {
        Self { billing }
    }
}

#[async_trait]
impl Tool for GetBoletoStatusTool {
    type Input = GetBoletoStatusToolInput;

    fn name(&self) -> &'static str {
        "get_boleto_status"
    }

    fn requires_confirmation(&self) -> bool {
        false
    }

    fn validate_input(&self, input: &Self::Input) -> Vec<String> {
        let mut errors = Vec::new();
        if input.boleto_id.is_empty() {
            errors.push("boleto_id is required".to_string());
        }
        errors
    }

    async fn execute(&self, input: Self::Input) -> ToolResult {
        let errors = self.validate_input(&input);
        if !errors.is_empty() {
            return ToolResult::fail(errors.join("; "));
        }

        tracing::info!(boleto_id = %input.boleto_id, "get boleto status tool start");

        match self.billing.get_boleto_status(&input.boleto_id).await {
            Ok(boleto) => ToolResult::ok(json!({
                "boleto_id": boleto.id,
                "status": boleto.status.as_str(),
                "amount_cents": boleto.amount_cents,
                "due_date": boleto.due_date,
                "provider_reference": boleto.provider_reference,
            })),
            Err(error) => {
                tracing::error!(error = %error, "get boleto status tool error");
                ToolResult::fail(error.to_string())
            }
        }
    }
}
